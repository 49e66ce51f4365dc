//! Block-blob PUT transport against a pre-signed storage URL.

use filedock_protocol::constants::{
    BLOB_TYPE_BLOCK, HEADER_BLOB_TYPE, HEADER_STORAGE_VERSION, STORAGE_API_VERSION,
};
use futures_util::future::BoxFuture;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, info, warn};

use crate::plan::ChunkPlan;
use crate::source::FileSource;

/// Characters left untouched by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// How a file's bytes reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    SingleShot,
    Chunked,
}

/// Transport progress, reported to an optional observer.
///
/// Chunked uploads walk `AwaitingChunk(1..=n) -> AwaitingFinalize -> Done`;
/// any failure ends in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    UploadingWhole,
    AwaitingChunk { index: u32, total: u32 },
    AwaitingFinalize { blocks: usize },
    Done,
    Failed { chunks_completed: usize },
}

/// A single PUT against storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePut {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Status line of a storage response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageResponse {
    pub status: u16,
    pub reason: String,
}

impl StorageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The PUT never produced an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum StorageClientError {
    #[error("connection failed: {0}")]
    Connection(String),
}

/// HTTP seam for storage PUTs.
///
/// Implemented over `reqwest` in `filedock-http`; tests use recording mocks.
pub trait StorageClient: Send + Sync {
    fn put(&self, request: StoragePut) -> BoxFuture<'_, Result<StorageResponse, StorageClientError>>;
}

/// A storage PUT failed; the whole upload is aborted.
///
/// Blocks already stored are left for storage-side garbage collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("storage transport failed: {reason} (status {status:?}, {chunks_completed} chunks stored)")]
pub struct TransportError {
    /// HTTP status, absent when no response was received.
    pub status: Option<u16>,
    pub reason: String,
    /// Chunks acknowledged before the failure.
    pub chunks_completed: usize,
}

/// URL for uploading one block.
pub fn block_url(upload_url: &str, block_id: &str) -> String {
    format!(
        "{upload_url}{}comp=block&blockid={}",
        query_separator(upload_url),
        utf8_percent_encode(block_id, URI_COMPONENT)
    )
}

/// URL for committing the block list.
fn block_list_url(upload_url: &str) -> String {
    format!("{upload_url}{}comp=blocklist", query_separator(upload_url))
}

fn query_separator(url: &str) -> char {
    if url.contains('?') { '&' } else { '?' }
}

/// Block-list manifest naming every block as `Latest`, in the given order.
pub fn block_list_xml<S: AsRef<str>>(block_ids: &[S]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
    for id in block_ids {
        xml.push_str("<Latest>");
        xml.push_str(id.as_ref());
        xml.push_str("</Latest>");
    }
    xml.push_str("</BlockList>");
    xml
}

/// Observer callback for [`TransferState`] changes.
pub type StateObserver<'a> = &'a (dyn Fn(&TransferState) + Send + Sync);

/// Drives single-shot or block-by-block PUTs for one file.
pub struct BlockBlobTransport<'a> {
    storage: &'a dyn StorageClient,
    observer: Option<StateObserver<'a>>,
}

impl<'a> BlockBlobTransport<'a> {
    pub fn new(storage: &'a dyn StorageClient) -> Self {
        Self {
            storage,
            observer: None,
        }
    }

    /// Registers a callback invoked on every state transition.
    pub fn with_observer(mut self, observer: StateObserver<'a>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Uploads `file`, choosing the strategy from its size.
    pub async fn transfer(
        &self,
        file: &dyn FileSource,
        upload_url: &str,
    ) -> Result<TransferStrategy, TransportError> {
        let strategy = crate::strategy_for(file.size());
        match strategy {
            TransferStrategy::SingleShot => self.put_whole(file, upload_url).await?,
            TransferStrategy::Chunked => {
                let plan = ChunkPlan::for_size(file.size());
                self.put_chunked(file, upload_url, &plan).await?
            }
        }
        Ok(strategy)
    }

    /// Uploads the whole file in one PUT.
    pub async fn put_whole(
        &self,
        file: &dyn FileSource,
        upload_url: &str,
    ) -> Result<(), TransportError> {
        self.emit(TransferState::UploadingWhole);

        let body = file
            .read_range(0, file.size())
            .map_err(|e| self.fail(None, format!("read failed: {e}"), 0))?;

        let request = StoragePut {
            url: upload_url.to_string(),
            headers: vec![
                (HEADER_BLOB_TYPE.into(), BLOB_TYPE_BLOCK.into()),
                (HEADER_STORAGE_VERSION.into(), STORAGE_API_VERSION.into()),
                ("Content-Type".into(), file.mime_type().to_string()),
            ],
            body,
        };
        self.send(request, 0).await?;

        debug!(file = file.name(), bytes = file.size(), "single-shot upload stored");
        self.emit(TransferState::Done);
        Ok(())
    }

    /// Uploads `plan` one block at a time, then commits the block list.
    ///
    /// Block `n + 1` is not read or sent until block `n` has been acknowledged.
    pub async fn put_chunked(
        &self,
        file: &dyn FileSource,
        upload_url: &str,
        plan: &ChunkPlan,
    ) -> Result<(), TransportError> {
        let total = plan.len() as u32;
        let mut completed = 0usize;

        for chunk in plan.chunks() {
            self.emit(TransferState::AwaitingChunk {
                index: chunk.index,
                total,
            });

            let body = file
                .read_range(chunk.start, chunk.end)
                .map_err(|e| self.fail(None, format!("read of chunk {} failed: {e}", chunk.index), completed))?;

            let request = StoragePut {
                url: block_url(upload_url, &chunk.block_id),
                headers: vec![(HEADER_STORAGE_VERSION.into(), STORAGE_API_VERSION.into())],
                body,
            };
            self.send(request, completed).await?;
            completed += 1;

            debug!(
                file = file.name(),
                index = chunk.index,
                total,
                bytes = chunk.len(),
                "block stored"
            );
        }

        self.emit(TransferState::AwaitingFinalize { blocks: completed });

        let request = StoragePut {
            url: block_list_url(upload_url),
            headers: vec![
                (HEADER_STORAGE_VERSION.into(), STORAGE_API_VERSION.into()),
                ("Content-Type".into(), "application/xml".into()),
            ],
            body: block_list_xml(&plan.block_ids()).into_bytes(),
        };
        self.send(request, completed).await?;

        info!(file = file.name(), blocks = completed, "block list committed");
        self.emit(TransferState::Done);
        Ok(())
    }

    async fn send(&self, request: StoragePut, completed: usize) -> Result<(), TransportError> {
        let response = self
            .storage
            .put(request)
            .await
            .map_err(|e| self.fail(None, e.to_string(), completed))?;

        if !response.is_success() {
            return Err(self.fail(Some(response.status), response.reason, completed));
        }
        Ok(())
    }

    fn fail(&self, status: Option<u16>, reason: String, chunks_completed: usize) -> TransportError {
        warn!(?status, %reason, chunks_completed, "storage transport failed");
        self.emit(TransferState::Failed { chunks_completed });
        TransportError {
            status,
            reason,
            chunks_completed,
        }
    }

    fn emit(&self, state: TransferState) {
        if let Some(observer) = self.observer {
            observer(&state);
        }
    }
}
