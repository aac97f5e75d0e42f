use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Could not read media: {0}")]
    ProbeFailed(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Capability unavailable: {0}")]
    Unavailable(String),
}

impl LibraryError {
    /// Errors caused by what the user supplied rather than by storage or the
    /// network.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LibraryError::InvalidInput { .. }
                | LibraryError::UnsupportedMedia(_)
                | LibraryError::TooLarge { .. }
                | LibraryError::ProbeFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
