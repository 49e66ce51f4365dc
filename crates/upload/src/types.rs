use filedock_transfer::{TransferState, TransferStrategy};

/// Progress events emitted while a file is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// The backend issued a signed target.
    LinkAcquired { file_id: String },
    /// Storage transport moved to a new state.
    Transfer(TransferState),
    /// Whole-file digest is ready.
    ChecksumComputed { checksum: String },
    /// The backend accepted the commit.
    Committed { file_id: String },
    /// The upload stopped at the first failure.
    Failed { error: String },
}

/// Summary of a committed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedUpload {
    pub file_id: String,
    pub size: u64,
    pub checksum: String,
    pub strategy: TransferStrategy,
}
