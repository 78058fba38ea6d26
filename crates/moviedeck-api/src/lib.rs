//! API client library for moviedeck.
//!
//! Provides clients for the auth/my-list REST backend and the TMDB API.

/// Auth and my-list backend client.
pub mod backend;

/// TMDB API client.
pub mod tmdb;
