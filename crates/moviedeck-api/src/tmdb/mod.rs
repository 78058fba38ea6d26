//! TMDB catalog client module.

mod api;
mod client;
mod endpoints;
mod image;
mod rate_limiter;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TimeWindow, TmdbApi, TrendingMedia};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use endpoints::{Endpoint, ParseEndpointError, genre};
pub use image::{BackdropSize, IMAGE_BASE_URL, ImageSize, PosterSize, image_url};
pub use types::{
    TmdbErrorResponse, TmdbGenre, TmdbGenreList, TmdbMedia, TmdbMovieDetails, TmdbPage,
    TmdbTvDetails, TmdbVideo, TmdbVideoList,
};
