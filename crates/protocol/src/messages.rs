use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Upload link
// ---------------------------------------------------------------------------

/// Requests a signed upload target for a new file.
///
/// `folderId` is always present on the wire; `null` means the root folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUploadLinkRequest {
    pub file_name: String,
    pub mime_type: String,
    pub expected_size: u64,
    pub folder_id: Option<String>,
}

/// Signed upload target issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUploadLinkResponse {
    pub file_id: String,
    pub upload_url: String,
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Finalizes an upload once every byte has been transported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitUploadRequest {
    pub file_id: String,
    pub mime_type: String,
    pub size: u64,
    /// Base64 MD5 of the transported bytes.
    pub checksum: String,
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Single-file metadata record as returned by the metadata endpoint.
///
/// Only `downloadUrl` and the file name are needed to rebuild a file
/// offline; the remaining fields are carried when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(alias = "name")]
    pub file_name: String,
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}
