//! # Track Library
//!
//! Track metadata, the in-memory Track Registry and the local import
//! pipeline.
//!
//! ## Overview
//!
//! - [`models`]: `TrackMetadata` and its identifiers
//! - [`registry`]: the search-result, local, cached and favorite sets
//! - [`import`]: file and URL imports into the host blob store
//!
//! The registry is a plain synchronous state container. Callers wrap it in
//! a lock and never hold that lock across an await.

pub mod error;
pub mod import;
pub mod models;
pub mod registry;

pub use error::{LibraryError, Result};
pub use import::{parse_display_name, LocalImporter};
pub use models::{SourceKind, TrackId, TrackMetadata};
pub use registry::TrackRegistry;
