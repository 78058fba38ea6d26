//! TMDB API response types.

use serde::Deserialize;

/// Paged listing (`trending`, `discover`, `search`, `similar`).
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    /// Current page number.
    pub page: u32,
    /// Page entries.
    pub results: Vec<T>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

/// A movie or TV entry in a listing.
///
/// Movies carry `title`/`release_date`, series carry `name`/`first_air_date`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMedia {
    /// TMDB id.
    pub id: u64,
    /// `movie`, `tv` or `person`; only present in mixed listings.
    #[serde(default)]
    pub media_type: Option<String>,
    /// Movie title.
    #[serde(default)]
    pub title: Option<String>,
    /// Series name.
    #[serde(default)]
    pub name: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Movie release date (YYYY-MM-DD).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Series first air date (YYYY-MM-DD).
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
}

impl TmdbMedia {
    /// Title for movies, name for series.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("(untitled)")
    }

    /// Release or first air date.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|d| !d.is_empty())
    }
}

/// A genre.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TmdbGenre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Response from `genre/movie/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    /// All genres.
    pub genres: Vec<TmdbGenre>,
}

/// Response from `movie/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Tagline.
    #[serde(default)]
    pub tagline: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

/// Response from `tv/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvDetails {
    /// TMDB series ID.
    pub id: u64,
    /// Localized name.
    pub name: String,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// First air date (YYYY-MM-DD).
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Number of seasons.
    #[serde(default)]
    pub number_of_seasons: u32,
    /// Number of episodes.
    #[serde(default)]
    pub number_of_episodes: u32,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

/// A video attached to a movie.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    /// Video ID.
    pub id: String,
    /// Site-specific key (YouTube video id).
    pub key: String,
    /// Video name.
    pub name: String,
    /// Hosting site.
    pub site: String,
    /// `Trailer`, `Teaser`, `Clip`, ...
    #[serde(rename = "type")]
    pub video_type: String,
    /// Official upload.
    #[serde(default)]
    pub official: bool,
}

/// Response from `movie/{id}/videos`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideoList {
    /// Movie ID.
    pub id: u64,
    /// Videos.
    pub results: Vec<TmdbVideo>,
}

impl TmdbVideoList {
    /// First YouTube trailer, preferring official uploads.
    #[must_use]
    pub fn trailer(&self) -> Option<&TmdbVideo> {
        let mut trailers = self
            .results
            .iter()
            .filter(|v| v.site == "YouTube" && v.video_type == "Trailer");
        let first = trailers.clone().next();
        trailers.find(|v| v.official).or(first)
    }
}

impl TmdbVideo {
    /// Watch URL on the hosting site (YouTube only).
    #[must_use]
    pub fn watch_url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

/// Error response from TMDB API.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB status code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Always `false` for errors.
    #[serde(default)]
    pub success: bool,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn test_parse_trending_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/trending_all_week.json");

        // Act
        let page: TmdbPage<TmdbMedia> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(page.page, 1);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].display_title(), "Fight Club");
        assert_eq!(page.results[1].display_title(), "Game of Thrones");
        assert_eq!(page.results[1].date(), Some("2011-04-17"));
    }

    #[test]
    fn test_parse_movie_details_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/movie_550.json");

        // Act
        let details: TmdbMovieDetails = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(details.id, 550);
        assert_eq!(details.runtime, Some(139));
        assert_eq!(details.genres[0].name, "Drama");
    }

    #[test]
    fn test_trailer_prefers_official() {
        // Arrange
        let json = r#"{"id":550,"results":[
            {"id":"a","key":"fan","name":"Fan cut","site":"YouTube","type":"Trailer","official":false},
            {"id":"b","key":"teaser","name":"Teaser","site":"YouTube","type":"Teaser","official":true},
            {"id":"c","key":"main","name":"Official Trailer","site":"YouTube","type":"Trailer","official":true}
        ]}"#;
        let videos: TmdbVideoList = serde_json::from_str(json).unwrap();

        // Act
        let trailer = videos.trailer().unwrap();

        // Assert
        assert_eq!(trailer.key, "main");
        assert_eq!(
            trailer.watch_url().as_deref(),
            Some("https://www.youtube.com/watch?v=main")
        );
    }

    #[test]
    fn test_trailer_none_without_trailers() {
        // Arrange
        let videos = TmdbVideoList {
            id: 1,
            results: Vec::new(),
        };

        // Act & Assert
        assert!(videos.trailer().is_none());
    }

    #[test]
    fn test_parse_error_response() {
        // Arrange
        let json = r#"{"status_code":34,"status_message":"The resource you requested could not be found.","success":false}"#;

        // Act
        let error: TmdbErrorResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(error.status_code, 34);
        assert!(!error.success);
    }
}
