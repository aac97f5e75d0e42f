//! # Backend Adapters
//!
//! Implementations of [`Playable`](crate::traits::Playable) for the two
//! source kinds, the exclusive output device they share and the status
//! poller both of them run.

pub mod local;
pub mod output;
mod poller;
pub mod remote;

pub use local::LocalBlobAdapter;
pub use output::{OutputDevice, OutputOwner};
pub use remote::RemoteStreamAdapter;
