//! Exclusive output device.
//!
//! Both adapters claim the device once their media is ready and release it
//! on detach. A claim by one kind while the other still holds the device is
//! refused, so two backends can never produce output together.

use crate::error::{PlaybackError, Result};
use crate::traits::SessionToken;
use core_library::SourceKind;
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOwner {
    pub kind: SourceKind,
    pub session: SessionToken,
}

#[derive(Debug, Default)]
pub struct OutputDevice {
    owner: Mutex<Option<OutputOwner>>,
}

impl OutputDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the device for `kind`. Re-claiming by the same kind hands the
    /// device over to the newer session.
    pub fn claim(&self, kind: SourceKind, session: SessionToken) -> Result<()> {
        let mut owner = self.owner.lock();
        match *owner {
            Some(current) if current.kind != kind => Err(PlaybackError::OutputBusy {
                holder: current.kind.to_string(),
            }),
            _ => {
                *owner = Some(OutputOwner { kind, session });
                debug!(kind = %kind, session = %session, "Output device claimed");
                Ok(())
            }
        }
    }

    /// Release the device if `kind` holds it.
    pub fn release(&self, kind: SourceKind) {
        let mut owner = self.owner.lock();
        if owner.is_some_and(|current| current.kind == kind) {
            *owner = None;
            debug!(kind = %kind, "Output device released");
        }
    }

    pub fn owner(&self) -> Option<OutputOwner> {
        *self.owner.lock()
    }
}
