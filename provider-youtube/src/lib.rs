//! # YouTube Search Provider
//!
//! Implements `SearchProvider` over the YouTube Data API v3.
//!
//! ## Overview
//!
//! A search is two requests:
//! - `search.list` restricted to music videos, for ids, titles, channels and
//!   thumbnails
//! - `videos.list` with `contentDetails`, for ISO-8601 durations
//!
//! Quota failures are reported as `SearchError::QuotaExceeded` so the UI can
//! tell them apart from transient network errors.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::YouTubeSearchProvider;
pub use error::{Result, YouTubeError};
pub use types::parse_iso8601_duration;
