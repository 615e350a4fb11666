//! Upload error types.

use thiserror::Error;

/// Errors of a single protocol step or of a whole file session.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The signing authority was unreachable or refused to sign.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The HTTP call failed or the store answered with a non-success status.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The store answered with something that can not be used, i.e. no `UploadId`.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("upload cancelled")]
    Cancelled,

    #[error("upload task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl UploadError {
    /// Whether repeating the step could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Signing(_) | Self::Transport(_))
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
