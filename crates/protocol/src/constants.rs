/// Backend endpoint that issues a signed upload target.
pub const GENERATE_UPLOAD_LINK_PATH: &str = "/file/generate-upload-link";

/// Backend endpoint that links uploaded bytes to a file record.
pub const COMMIT_UPLOAD_PATH: &str = "/file/commit";

/// Blob type header sent on single-shot uploads.
pub const HEADER_BLOB_TYPE: &str = "x-ms-blob-type";

/// Storage protocol version header.
pub const HEADER_STORAGE_VERSION: &str = "x-ms-version";

/// Value of [`HEADER_BLOB_TYPE`] for block blobs.
pub const BLOB_TYPE_BLOCK: &str = "BlockBlob";

/// Storage REST protocol version the transport speaks.
pub const STORAGE_API_VERSION: &str = "2020-10-02";

/// MIME type assumed when a file does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
