//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `BlobStore` using a directory of media files with JSON sidecars
//! - `HttpClient` using `reqwest`
//! - `MediaProbe` using `lofty`
//!
//! The embeddable stream player and media elements are always supplied by
//! the host UI; there is no headless desktop default for them.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FsBlobStore, LoftyMediaProbe, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let blobs = Arc::new(FsBlobStore::open_default()?);
//!     let http = Arc::new(ReqwestHttpClient::new()?);
//!     let probe = Arc::new(LoftyMediaProbe::new());
//!     // Inject into CoreConfig
//!     Ok(())
//! }
//! ```

mod blob_store;
mod http;
mod probe;

pub use blob_store::FsBlobStore;
pub use http::ReqwestHttpClient;
pub use probe::LoftyMediaProbe;
