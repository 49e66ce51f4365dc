//! Rebuilds a downloadable file from cached metadata and blob content.
//!
//! The two namespaces are filled independently, so either may be missing
//! the half this lookup needs. That is an ordinary miss, not corruption.

use std::fmt;
use std::sync::Arc;

use filedock_protocol::FileMetadata;
use tracing::debug;

use crate::namespace::CacheNamespace;
use crate::request::strip_query;
use crate::store::CacheStore;

/// A file reconstructed from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineFile {
    pub blob: Vec<u8>,
    pub suggested_file_name: String,
}

/// Why offline retrieval missed. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    MetadataNotCached,
    MetadataUnreadable(String),
    BlobNotCached { url: String },
    EmptyBlob,
    StoreUnavailable(String),
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetadataNotCached => f.write_str("no cached metadata"),
            Self::MetadataUnreadable(e) => write!(f, "cached metadata unreadable: {e}"),
            Self::BlobNotCached { url } => write!(f, "no cached content for {url}"),
            Self::EmptyBlob => f.write_str("cached content is empty"),
            Self::StoreUnavailable(e) => write!(f, "cache store unavailable: {e}"),
        }
    }
}

/// The file cannot be rebuilt from the cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("file {file_id} is not available offline ({reason})")]
pub struct OfflineDataUnavailable {
    pub file_id: String,
    pub reason: MissReason,
}

/// Read-only view over the metadata and blob-content namespaces.
pub struct OfflineRetriever {
    store: Arc<dyn CacheStore>,
}

impl OfflineRetriever {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Looks up `file_id`'s metadata, follows its download URL (query
    /// stripped) into blob content and returns the bytes.
    ///
    /// Never writes to the store.
    pub fn retrieve_offline(&self, file_id: &str) -> Result<OfflineFile, OfflineDataUnavailable> {
        let miss = |reason: MissReason| {
            debug!(file_id, %reason, "offline retrieval missed");
            OfflineDataUnavailable {
                file_id: file_id.to_string(),
                reason,
            }
        };
        let unavailable = |e: crate::store::CacheError| miss(MissReason::StoreUnavailable(e.to_string()));

        // Every key contains the empty string.
        if file_id.is_empty() {
            return Err(miss(MissReason::MetadataNotCached));
        }

        // 1. Metadata entry whose key mentions the id.
        let metadata_key = self
            .store
            .keys(CacheNamespace::Metadata)
            .map_err(unavailable)?
            .into_iter()
            .find(|key| key.contains(file_id))
            .ok_or_else(|| miss(MissReason::MetadataNotCached))?;
        let metadata_entry = self
            .store
            .get(CacheNamespace::Metadata, &metadata_key)
            .map_err(unavailable)?
            .ok_or_else(|| miss(MissReason::MetadataNotCached))?;

        // 2. Download URL, normalized like blob keys (query dropped, host
        // lowercased, default port removed).
        let metadata: FileMetadata = serde_json::from_slice(&metadata_entry.response.body)
            .map_err(|e| miss(MissReason::MetadataUnreadable(e.to_string())))?;
        let blob_url = strip_query(&metadata.download_url);

        // 3. Blob entry under the same origin + path.
        let blob_key = self
            .store
            .keys(CacheNamespace::BlobContent)
            .map_err(unavailable)?
            .into_iter()
            .find(|key| strip_query(key) == blob_url)
            .ok_or_else(|| {
                miss(MissReason::BlobNotCached {
                    url: blob_url.clone(),
                })
            })?;
        let blob_entry = self
            .store
            .get(CacheNamespace::BlobContent, &blob_key)
            .map_err(unavailable)?
            .ok_or_else(|| {
                miss(MissReason::BlobNotCached {
                    url: blob_url.clone(),
                })
            })?;

        // 4. An empty body is not a usable file.
        if blob_entry.response.body.is_empty() {
            return Err(miss(MissReason::EmptyBlob));
        }

        Ok(OfflineFile {
            blob: blob_entry.response.body,
            suggested_file_name: metadata.file_name,
        })
    }
}
