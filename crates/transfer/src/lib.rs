//! Client side of the block-blob upload protocol.
//!
//! Splits a file into a deterministic [`ChunkPlan`], computes the whole-file
//! MD5 integrity digest, and PUTs bytes to a pre-signed storage URL either in
//! one shot or block by block followed by a block-list manifest.

mod checksum;
mod plan;
mod source;
mod transport;

pub use checksum::{IntegrityComputationError, checksum_bytes, compute_checksum};
pub use plan::{ChunkPlan, PlannedChunk, block_id};
pub use source::{FileSource, LocalFile, MemoryFile, detect_mime_type};
pub use transport::{
    BlockBlobTransport, StorageClient, StorageClientError, StoragePut, StorageResponse,
    TransferState, TransferStrategy, TransportError, block_list_xml, block_url,
};

/// Fixed chunk size for block uploads: 4 MiB.
pub const CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Files up to and including this size are uploaded in a single PUT.
pub const SINGLE_SHOT_THRESHOLD: u64 = CHUNK_SIZE;

/// Picks the transport strategy for a file of `size` bytes.
pub fn strategy_for(size: u64) -> TransferStrategy {
    if size <= SINGLE_SHOT_THRESHOLD {
        TransferStrategy::SingleShot
    } else {
        TransferStrategy::Chunked
    }
}
