//! Block-blob storage client.

use filedock_transfer::{StorageClient, StorageClientError, StoragePut, StorageResponse};
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::Error;

/// PUTs against pre-signed storage URLs. Carries no credentials of its own.
pub struct HttpStorage {
    http: reqwest::Client,
}

impl HttpStorage {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
        })
    }
}

impl StorageClient for HttpStorage {
    fn put(&self, request: StoragePut) -> BoxFuture<'_, Result<StorageResponse, StorageClientError>> {
        Box::pin(async move {
            let bytes = request.body.len();
            let mut builder = self.http.put(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let resp = builder
                .body(request.body)
                .send()
                .await
                .map_err(|e| StorageClientError::Connection(e.to_string()))?;

            let status = resp.status();
            let reason = if status.is_success() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                // Storage puts the error code in the body; keep it for the caller.
                let body = resp.text().await.unwrap_or_default();
                match status.canonical_reason() {
                    Some(text) if body.is_empty() => text.to_string(),
                    Some(text) => format!("{text}: {body}"),
                    None => body,
                }
            };
            debug!(status = status.as_u16(), bytes, "storage PUT finished");

            Ok(StorageResponse {
                status: status.as_u16(),
                reason,
            })
        })
    }
}
