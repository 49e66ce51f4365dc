use base64::{Engine, engine::general_purpose::STANDARD};

/// Width every raw block ID is padded to before encoding.
const BLOCK_ID_WIDTH: usize = 64;

/// Derives the storage block ID for a 1-based chunk index.
///
/// `"block-" + index zero-padded to 6 digits`, right-padded with spaces to
/// 64 characters, then base64-encoded. The block-blob protocol requires every
/// ID of one blob to have the same encoded length.
pub fn block_id(index: u32) -> String {
    let raw = format!("{:<width$}", format!("block-{index:06}"), width = BLOCK_ID_WIDTH);
    STANDARD.encode(raw.as_bytes())
}

/// One entry of a [`ChunkPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChunk {
    /// 1-based position in upload order.
    pub index: u32,
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (exclusive).
    pub end: u64,
    /// Encoded block ID for this index.
    pub block_id: String,
}

impl PlannedChunk {
    /// Number of bytes covered by this chunk.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the chunk covers no bytes. Never true for planned chunks.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Ordered partition of `[0, file_size)` into fixed-size chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
    chunks: Vec<PlannedChunk>,
}

impl ChunkPlan {
    /// Plans `file_size` bytes in chunks of `chunk_size`.
    ///
    /// A zero `chunk_size` falls back to [`CHUNK_SIZE`](crate::CHUNK_SIZE).
    pub fn new(file_size: u64, chunk_size: u64) -> Self {
        let chunk_size = if chunk_size == 0 {
            crate::CHUNK_SIZE
        } else {
            chunk_size
        };

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 1u32;
        while start < file_size {
            let end = (start + chunk_size).min(file_size);
            chunks.push(PlannedChunk {
                index,
                start,
                end,
                block_id: block_id(index),
            });
            start = end;
            index += 1;
        }

        Self {
            file_size,
            chunk_size,
            chunks,
        }
    }

    /// Plans `file_size` bytes with the fixed 4 MiB chunk size.
    pub fn for_size(file_size: u64) -> Self {
        Self::new(file_size, crate::CHUNK_SIZE)
    }

    pub fn chunks(&self) -> &[PlannedChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Block IDs in ascending chunk order, as the manifest lists them.
    pub fn block_ids(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.block_id.as_str()).collect()
    }
}
