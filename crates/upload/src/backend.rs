//! Backend seam for link acquisition and commit.

use filedock_protocol::{CommitUploadRequest, GenerateUploadLinkRequest, GenerateUploadLinkResponse};
use futures_util::future::BoxFuture;

use crate::error::BackendError;

/// File-manager backend consumed by the coordinator.
///
/// Implemented over HTTP in `filedock-http`. Keeping it a trait lets the
/// upload flow run against recording mocks.
pub trait UploadBackend: Send + Sync {
    /// `POST /file/generate-upload-link`.
    fn generate_upload_link(
        &self,
        request: GenerateUploadLinkRequest,
    ) -> BoxFuture<'_, Result<GenerateUploadLinkResponse, BackendError>>;

    /// `POST /file/commit`.
    fn commit(&self, request: CommitUploadRequest) -> BoxFuture<'_, Result<(), BackendError>>;
}
