//! Workspace façade crate.
//!
//! Exposes feature flags that map onto the individual workspace crates
//! (`core-service`, `bridge-desktop`, `provider-youtube`). Host applications
//! depend on `streamcache-workspace` and enable the features they need
//! without wiring each crate by hand.

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
#[cfg(any(feature = "desktop-shims", feature = "youtube"))]
pub use core_service;
#[cfg(feature = "youtube")]
pub use provider_youtube;
