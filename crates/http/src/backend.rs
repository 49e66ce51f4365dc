//! File-manager backend client.

use filedock_protocol::constants::{COMMIT_UPLOAD_PATH, GENERATE_UPLOAD_LINK_PATH};
use filedock_protocol::{CommitUploadRequest, GenerateUploadLinkRequest, GenerateUploadLinkResponse};
use filedock_upload::{BackendError, UploadBackend};
use futures_util::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

use crate::Error;

/// JSON client for the upload endpoints.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url`, e.g. `https://files.example/api`.
    ///
    /// `auth_token` is sent as a bearer token on every request.
    pub fn new(base_url: &str, auth_token: Option<&str>) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| Error::InvalidToken)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POSTs `body` as JSON and returns the response bytes of a 2xx reply.
    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<Vec<u8>, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = resp.status();
        debug!(%url, status = status.as_u16(), "backend responded");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| BackendError::Transport(e.to_string()))
    }
}

impl UploadBackend for HttpBackend {
    fn generate_upload_link(
        &self,
        request: GenerateUploadLinkRequest,
    ) -> BoxFuture<'_, Result<GenerateUploadLinkResponse, BackendError>> {
        Box::pin(async move {
            let body = self.post_json(GENERATE_UPLOAD_LINK_PATH, &request).await?;
            serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
        })
    }

    fn commit(&self, request: CommitUploadRequest) -> BoxFuture<'_, Result<(), BackendError>> {
        Box::pin(async move {
            self.post_json(COMMIT_UPLOAD_PATH, &request).await?;
            Ok(())
        })
    }
}
