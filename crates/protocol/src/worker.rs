//! Messages accepted by the offline worker from the surrounding application.

use serde::{Deserialize, Serialize};

/// Errors decoding a worker message.
#[derive(Debug, thiserror::Error)]
pub enum WorkerMessageError {
    #[error("malformed worker message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Control message posted to the offline worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate a waiting worker version immediately.
    SkipWaiting,
}

impl WorkerMessage {
    /// Parses a message from its JSON form.
    pub fn from_json(raw: &str) -> Result<Self, WorkerMessageError> {
        Ok(serde_json::from_str(raw)?)
    }
}
