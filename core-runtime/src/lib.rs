//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by every player crate:
//! - Logging and tracing infrastructure
//! - Configuration and bridge injection
//! - Event bus system
//!
//! ## Overview
//!
//! Nothing in here knows about tracks or playback semantics. Domain crates
//! publish their events through [`events::EventBus`] and read injected host
//! bridges from [`config::CoreConfig`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
