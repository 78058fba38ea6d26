//! Application configuration module.
//!
//! Manages the TOML config file holding the backend endpoint, the auth
//! mode switch and TMDB credentials, plus their environment overrides.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
pub use paths::resolve_config_path;
