//! Network seam used by the cache policies.

use futures_util::future::BoxFuture;

use crate::request::{Request, Response};

/// The request produced no response.
///
/// HTTP error statuses are not errors here; they come back as a
/// [`Response`] and are simply not cached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("network request timed out")]
    Timeout,
}

/// Performs requests on behalf of the worker.
pub trait Network: Send + Sync {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response, NetworkError>>;
}
