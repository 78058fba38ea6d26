//! TMDB image CDN URLs.

use std::fmt;

/// Base URL of the TMDB image CDN.
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Poster widths served by the CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PosterSize {
    /// 92px.
    W92,
    /// 154px.
    W154,
    /// 185px.
    W185,
    /// 342px.
    W342,
    /// 500px.
    #[default]
    W500,
    /// 780px.
    W780,
    /// Source resolution.
    Original,
}

/// Backdrop widths served by the CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackdropSize {
    /// 300px.
    W300,
    /// 780px.
    W780,
    /// 1280px.
    #[default]
    W1280,
    /// Source resolution.
    Original,
}

/// Anything that renders to a CDN size segment.
pub trait ImageSize: fmt::Display {}

impl PosterSize {
    const fn segment(self) -> &'static str {
        match self {
            Self::W92 => "w92",
            Self::W154 => "w154",
            Self::W185 => "w185",
            Self::W342 => "w342",
            Self::W500 => "w500",
            Self::W780 => "w780",
            Self::Original => "original",
        }
    }
}

impl BackdropSize {
    const fn segment(self) -> &'static str {
        match self {
            Self::W300 => "w300",
            Self::W780 => "w780",
            Self::W1280 => "w1280",
            Self::Original => "original",
        }
    }
}

impl fmt::Display for PosterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl fmt::Display for BackdropSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl ImageSize for PosterSize {}
impl ImageSize for BackdropSize {}

/// Full CDN URL for an image path such as `/abc.jpg`.
///
/// Returns `None` when the path is missing or empty.
#[must_use]
pub fn image_url(path: Option<&str>, size: impl ImageSize) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    let path = path.strip_prefix('/').unwrap_or(path);
    Some(format!("{IMAGE_BASE_URL}{size}/{path}"))
}
