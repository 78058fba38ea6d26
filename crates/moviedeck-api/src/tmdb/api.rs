//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::endpoints::Endpoint;
use super::types::{
    TmdbGenre, TmdbMedia, TmdbMovieDetails, TmdbPage, TmdbTvDetails, TmdbVideoList,
};

/// Media filter for the trending listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendingMedia {
    /// Movies and series.
    #[default]
    All,
    /// Movies only.
    Movie,
    /// Series only.
    Tv,
}

impl TrendingMedia {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

/// Trending time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    /// Last day.
    Day,
    /// Last week.
    #[default]
    Week,
}

impl TimeWindow {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

/// TMDB catalog operations.
///
/// Abstracts API operations for mock substitution in tests.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Trending titles.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn trending(&self, media: TrendingMedia, window: TimeWindow)
    -> Result<TmdbPage<TmdbMedia>>;

    /// One home-screen row.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn fetch_row(&self, endpoint: Endpoint) -> Result<TmdbPage<TmdbMedia>>;

    /// Movie details.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_details(&self, movie_id: u64) -> Result<TmdbMovieDetails>;

    /// Series details.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn tv_details(&self, series_id: u64) -> Result<TmdbTvDetails>;

    /// Trailers and clips of a movie.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_videos(&self, movie_id: u64) -> Result<TmdbVideoList>;

    /// Movies similar to the given one.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn similar_movies(&self, movie_id: u64, page: u32) -> Result<TmdbPage<TmdbMedia>>;

    /// Searches movies, series and people.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_multi(&self, query: &str, page: u32) -> Result<TmdbPage<TmdbMedia>>;

    /// Movies of one genre.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn discover_movies(&self, genre_id: u32, page: u32) -> Result<TmdbPage<TmdbMedia>>;

    /// Series aired on one network.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn discover_tv_by_network(
        &self,
        network_id: u32,
        page: u32,
    ) -> Result<TmdbPage<TmdbMedia>>;

    /// Movie genre list.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_genres(&self) -> Result<Vec<TmdbGenre>>;
}
