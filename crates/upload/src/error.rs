//! Upload error types.

use filedock_transfer::{IntegrityComputationError, TransportError};

/// Failures reported by an [`UploadBackend`](crate::UploadBackend).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("malformed backend response: {0}")]
    Decode(String),
}

/// Terminal failure of one upload. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload link could not be acquired: {0}")]
    LinkAcquisition(#[source] BackendError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    IntegrityComputation(#[from] IntegrityComputationError),

    #[error("upload could not be committed: {0}")]
    Commit(#[source] BackendError),
}
