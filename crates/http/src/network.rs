//! Network seam for the offline worker.

use filedock_offline_cache::request::same_origin;
use filedock_offline_cache::{Method, Network, NetworkError, Request, Response};
use futures_util::future::BoxFuture;
use reqwest::header::AUTHORIZATION;
use tracing::debug;

use crate::Error;

/// Performs worker fetches with `reqwest`.
///
/// A bearer token, when configured, is only attached to requests for the
/// application's own origin; storage URLs are signed and must not carry it.
pub struct HttpNetwork {
    http: reqwest::Client,
    bearer: Option<(String, String)>,
}

impl HttpNetwork {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            bearer: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` on requests to `origin`.
    pub fn with_bearer_for(mut self, origin: impl Into<String>, token: impl Into<String>) -> Self {
        self.bearer = Some((origin.into(), token.into()));
        self
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

impl Network for HttpNetwork {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response, NetworkError>> {
        Box::pin(async move {
            let mut builder = self.http.request(to_reqwest(request.method), &request.url);
            if let Some((origin, token)) = &self.bearer {
                if same_origin(&request.url, origin) {
                    builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
                }
            }

            let resp = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    NetworkError::Timeout
                } else {
                    NetworkError::Unreachable(e.to_string())
                }
            })?;

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = resp
                .bytes()
                .await
                .map_err(|e| NetworkError::Unreachable(e.to_string()))?
                .to_vec();
            debug!(url = %request.url, status, bytes = body.len(), "worker fetch finished");

            Ok(Response {
                status,
                headers,
                body,
            })
        })
    }
}
