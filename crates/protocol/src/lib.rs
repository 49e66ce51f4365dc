//! Wire types shared between the upload pipeline, the storage endpoint and
//! the offline worker.
//!
//! Backend JSON uses camelCase field names. Cached response bodies are
//! serialized with base64 so they survive a round trip through JSON files.

pub mod constants;
pub mod messages;
pub mod worker;

pub use messages::{
    CommitUploadRequest, FileMetadata, GenerateUploadLinkRequest, GenerateUploadLinkResponse,
};
pub use worker::{WorkerMessage, WorkerMessageError};

/// Serde helper encoding `Vec<u8>` as a standard base64 string.
pub mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
