//! Error types for the vault.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No blob at the given path.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    /// Backend failure other than a missing object (poisoned lock, bad metadata).
    #[error("storage error: {0}")]
    Backend(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,

    /// A blocking task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Crypto(#[from] bastion_envelope::Error),
}

impl StoreError {
    /// Text suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Crypto(e) => e.user_message(),
            Self::NotFound(_) => "That file no longer exists.",
            Self::InvalidPath(_) | Self::InvalidUserId(_) => "That file name is not allowed.",
            Self::Cancelled => "The operation was cancelled.",
            Self::Backend(_) | Self::Io(_) | Self::Task(_) | Self::Config(_) => {
                "Storage is unavailable right now. Please try again."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
