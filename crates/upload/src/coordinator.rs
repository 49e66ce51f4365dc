//! Single-file upload coordinator.

use std::sync::Arc;

use filedock_protocol::{CommitUploadRequest, GenerateUploadLinkRequest};
use filedock_transfer::{
    BlockBlobTransport, FileSource, IntegrityComputationError, StorageClient, TransferState,
    compute_checksum,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::backend::UploadBackend;
use crate::error::UploadError;
use crate::types::{CommittedUpload, UploadEvent};

/// Runs link acquisition, transfer, checksum and commit for one file.
///
/// Holds no state between calls; every `upload_file` starts from scratch.
pub struct UploadCoordinator<'a> {
    backend: &'a dyn UploadBackend,
    storage: &'a dyn StorageClient,
    events_tx: Option<mpsc::Sender<UploadEvent>>,
}

impl<'a> UploadCoordinator<'a> {
    pub fn new(backend: &'a dyn UploadBackend, storage: &'a dyn StorageClient) -> Self {
        Self {
            backend,
            storage,
            events_tx: None,
        }
    }

    /// Sends progress events to `events_tx`. Events that do not fit in the
    /// channel are dropped (and logged at debug), never waited on.
    pub fn with_events(mut self, events_tx: mpsc::Sender<UploadEvent>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Uploads `file` into `folder_id` (root when `None`).
    pub async fn upload_file(
        &self,
        file: Arc<dyn FileSource>,
        folder_id: Option<&str>,
    ) -> Result<CommittedUpload, UploadError> {
        let result = self.run(file, folder_id).await;
        if let Err(e) = &result {
            error!(error = %e, "upload failed");
            self.emit(UploadEvent::Failed {
                error: e.to_string(),
            });
        }
        result
    }

    async fn run(
        &self,
        file: Arc<dyn FileSource>,
        folder_id: Option<&str>,
    ) -> Result<CommittedUpload, UploadError> {
        let size = file.size();
        let mime_type = file.mime_type().to_string();

        // 1. Signed target
        let target = self
            .backend
            .generate_upload_link(GenerateUploadLinkRequest {
                file_name: file.name().to_string(),
                mime_type: mime_type.clone(),
                expected_size: size,
                folder_id: folder_id.map(str::to_string),
            })
            .await
            .map_err(UploadError::LinkAcquisition)?;
        debug!(file_id = %target.file_id, size, "upload link acquired");
        self.emit(UploadEvent::LinkAcquired {
            file_id: target.file_id.clone(),
        });

        // 2. Bytes to storage
        let observer = |state: &TransferState| self.emit(UploadEvent::Transfer(state.clone()));
        let strategy = BlockBlobTransport::new(self.storage)
            .with_observer(&observer)
            .transfer(file.as_ref(), &target.upload_url)
            .await?;

        // 3. Digest of the source that was sent
        let source = Arc::clone(&file);
        let checksum = tokio::task::spawn_blocking(move || compute_checksum(source.as_ref()))
            .await
            .map_err(|e| IntegrityComputationError(std::io::Error::other(e)))??;
        self.emit(UploadEvent::ChecksumComputed {
            checksum: checksum.clone(),
        });

        // 4. Commit
        self.backend
            .commit(CommitUploadRequest {
                file_id: target.file_id.clone(),
                mime_type,
                size,
                checksum: checksum.clone(),
            })
            .await
            .map_err(UploadError::Commit)?;

        info!(file_id = %target.file_id, size, ?strategy, "upload committed");
        self.emit(UploadEvent::Committed {
            file_id: target.file_id.clone(),
        });

        Ok(CommittedUpload {
            file_id: target.file_id,
            size,
            checksum,
            strategy,
        })
    }

    /// Transfer states arrive through a synchronous observer, so sending
    /// never waits: a full channel drops the event.
    fn emit(&self, event: UploadEvent) {
        let Some(tx) = &self.events_tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                debug!(?event, "upload event channel full; event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                debug!(?event, "upload event receiver gone; event dropped");
            }
        }
    }
}
