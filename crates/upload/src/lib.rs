//! Upload flow for a single file.
//!
//! The coordinator runs four hard-barrier steps against two seams: an
//! [`UploadBackend`] issuing signed targets and accepting commits, and a
//! [`StorageClient`](filedock_transfer::StorageClient) receiving the bytes.
//!
//! 1. **Link**: request a signed upload target from the backend
//! 2. **Transfer**: single-shot or block-by-block PUTs to storage
//! 3. **Checksum**: MD5 of the original source, on the blocking pool
//! 4. **Commit**: hand id, size and checksum back to the backend

pub mod backend;
pub mod coordinator;
pub mod error;
pub mod types;

pub use backend::UploadBackend;
pub use coordinator::UploadCoordinator;
pub use error::{BackendError, UploadError};
pub use types::{CommittedUpload, UploadEvent};
