//! Home-screen catalog rows.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Netflix network id on TMDB.
const NETFLIX_NETWORK_ID: u32 = 213;

/// Movie genre ids used by the home-screen rows.
pub mod genre {
    /// Action.
    pub const ACTION: u32 = 28;
    /// Comedy.
    pub const COMEDY: u32 = 35;
    /// Horror.
    pub const HORROR: u32 = 27;
    /// Romance.
    pub const ROMANCE: u32 = 10749;
    /// Documentary.
    pub const DOCUMENTARY: u32 = 99;
    /// Science fiction.
    pub const SCIENCE_FICTION: u32 = 878;
    /// Mystery.
    pub const MYSTERY: u32 = 9648;
    /// Western.
    pub const WESTERN: u32 = 37;
    /// Animation.
    pub const ANIMATION: u32 = 16;
    /// TV movie.
    pub const TV_MOVIE: u32 = 10770;
}

/// A browsable row of titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Trending across movies and series this week.
    Trending,
    /// Netflix original series.
    NetflixOriginals,
    /// Top-rated movies.
    TopRated,
    /// Action movies.
    Action,
    /// Comedy movies.
    Comedy,
    /// Horror movies.
    Horror,
    /// Romance movies.
    Romance,
    /// Documentaries.
    Documentaries,
    /// Science fiction movies.
    SciFi,
    /// Mystery movies.
    Mystery,
    /// Westerns.
    Western,
    /// Animated movies.
    Animation,
    /// TV movies.
    TvMovie,
}

/// Unknown row name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown endpoint: {0}")]
pub struct ParseEndpointError(String);

impl Endpoint {
    /// Every row in home-screen order.
    pub const ALL: [Self; 13] = [
        Self::Trending,
        Self::NetflixOriginals,
        Self::TopRated,
        Self::Action,
        Self::Comedy,
        Self::Horror,
        Self::Romance,
        Self::Documentaries,
        Self::SciFi,
        Self::Mystery,
        Self::Western,
        Self::Animation,
        Self::TvMovie,
    ];

    /// Kebab-case row name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::NetflixOriginals => "netflix-originals",
            Self::TopRated => "top-rated",
            Self::Action => "action",
            Self::Comedy => "comedy",
            Self::Horror => "horror",
            Self::Romance => "romance",
            Self::Documentaries => "documentaries",
            Self::SciFi => "sci-fi",
            Self::Mystery => "mystery",
            Self::Western => "western",
            Self::Animation => "animation",
            Self::TvMovie => "tv-movie",
        }
    }

    /// Genre discovered by this row, if it is a genre row.
    #[must_use]
    pub const fn genre_id(self) -> Option<u32> {
        match self {
            Self::Trending | Self::NetflixOriginals | Self::TopRated => None,
            Self::Action => Some(genre::ACTION),
            Self::Comedy => Some(genre::COMEDY),
            Self::Horror => Some(genre::HORROR),
            Self::Romance => Some(genre::ROMANCE),
            Self::Documentaries => Some(genre::DOCUMENTARY),
            Self::SciFi => Some(genre::SCIENCE_FICTION),
            Self::Mystery => Some(genre::MYSTERY),
            Self::Western => Some(genre::WESTERN),
            Self::Animation => Some(genre::ANIMATION),
            Self::TvMovie => Some(genre::TV_MOVIE),
        }
    }

    /// Path relative to the API base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Trending => "trending/all/week",
            Self::NetflixOriginals => "discover/tv",
            Self::TopRated => "movie/top_rated",
            _ => "discover/movie",
        }
    }

    /// Row-specific query parameters (language is added by the client).
    #[must_use]
    pub fn query(self) -> Vec<(&'static str, String)> {
        match self {
            Self::NetflixOriginals => vec![("with_networks", NETFLIX_NETWORK_ID.to_string())],
            other => other
                .genre_id()
                .map(|id| vec![("with_genres", id.to_string())])
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = ParseEndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEndpointError(String::from(s)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_names_round_trip() {
        for endpoint in Endpoint::ALL {
            assert_eq!(endpoint.name().parse::<Endpoint>().unwrap(), endpoint);
        }
    }

    #[test]
    fn test_parse_unknown() {
        // Arrange & Act
        let result = "musicals".parse::<Endpoint>();

        // Assert
        assert_eq!(result.unwrap_err().to_string(), "unknown endpoint: musicals");
    }

    #[test]
    fn test_netflix_originals_query() {
        // Arrange & Act
        let endpoint = Endpoint::NetflixOriginals;

        // Assert
        assert_eq!(endpoint.path(), "discover/tv");
        assert_eq!(
            endpoint.query(),
            vec![("with_networks", String::from("213"))]
        );
    }

    #[test]
    fn test_genre_rows_discover_movies() {
        // Arrange & Act
        let endpoint = Endpoint::Romance;

        // Assert
        assert_eq!(endpoint.path(), "discover/movie");
        assert_eq!(endpoint.query(), vec![("with_genres", String::from("10749"))]);
    }

    #[test]
    fn test_fixed_rows_have_no_query() {
        assert!(Endpoint::Trending.query().is_empty());
        assert!(Endpoint::TopRated.query().is_empty());
        assert_eq!(Endpoint::TopRated.path(), "movie/top_rated");
    }
}
