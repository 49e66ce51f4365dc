use base64::{Engine, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};

use crate::source::FileSource;

/// The file could not be read while computing its integrity digest.
#[derive(Debug, thiserror::Error)]
#[error("integrity digest could not be computed: {0}")]
pub struct IntegrityComputationError(#[from] pub std::io::Error);

/// Computes the base64 MD5 digest of an in-memory buffer.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

/// Computes the base64 MD5 digest of an entire file.
///
/// Reads the source in [`CHUNK_SIZE`](crate::CHUNK_SIZE) slices and feeds an
/// incremental hasher, so memory stays bounded by one slice while the digest
/// equals that of the whole content. CPU-bound: call it from a blocking
/// context.
pub fn compute_checksum(file: &dyn FileSource) -> Result<String, IntegrityComputationError> {
    let size = file.size();
    let mut hasher = Md5::new();
    let mut offset = 0;
    while offset < size {
        let end = (offset + crate::CHUNK_SIZE).min(size);
        let slice = file.read_range(offset, end)?;
        hasher.update(&slice);
        offset = end;
    }
    Ok(STANDARD.encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFile;

    /// Source that declares more bytes than it can deliver.
    struct BrokenFile;

    impl FileSource for BrokenFile {
        fn name(&self) -> &str {
            "broken.bin"
        }
        fn mime_type(&self) -> &str {
            "application/octet-stream"
        }
        fn size(&self) -> u64 {
            10
        }
        fn read_range(&self, _start: u64, _end: u64) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::other("handle invalidated"))
        }
    }

    #[test]
    fn empty_input_digest() {
        assert_eq!(checksum_bytes(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
        let empty = MemoryFile::new("empty", "text/plain", Vec::new());
        assert_eq!(compute_checksum(&empty).unwrap(), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }

    #[test]
    fn known_digest() {
        // md5("hello world") = 5eb63bbbe01eeed093cb22bb8f5acdc3
        assert_eq!(checksum_bytes(b"hello world"), "XrY7u+Ae7tCTyyK7j1rNww==");
    }

    #[test]
    fn deterministic() {
        let a = checksum_bytes(b"same bytes");
        let b = checksum_bytes(b"same bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 24);
    }

    #[test]
    fn streaming_matches_whole_buffer() {
        // Spans three slices so the incremental path is exercised.
        let data: Vec<u8> = (0..(9 * 1024 * 1024 + 5)).map(|i| (i % 251) as u8).collect();
        let file = MemoryFile::new("big.bin", "application/octet-stream", data.clone());
        assert_eq!(compute_checksum(&file).unwrap(), checksum_bytes(&data));
    }

    #[test]
    fn unreadable_source_fails() {
        let err = compute_checksum(&BrokenFile).unwrap_err();
        assert!(err.to_string().contains("handle invalidated"));
    }
}
