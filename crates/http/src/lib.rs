//! HTTP adapters over `reqwest`.
//!
//! - [`HttpBackend`]: file-manager API (link acquisition, commit), bearer auth
//! - [`HttpStorage`]: PUTs against pre-signed storage URLs
//! - [`HttpNetwork`]: fetches on behalf of the offline worker

pub mod backend;
pub mod network;
pub mod storage;

pub use backend::HttpBackend;
pub use network::HttpNetwork;
pub use storage::HttpStorage;

/// Errors building an HTTP adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid auth token")]
    InvalidToken,
}

#[cfg(test)]
pub(crate) mod mock {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Starts a one-shot HTTP server answering with `status` and `body`.
    ///
    /// The handle resolves to the raw request (head and body) it received.
    pub async fn mock_server(
        status: u16,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");

        let mut head = format!("HTTP/1.1 {status} Mock\r\nContent-Length: {}\r\nConnection: close\r\n", body.len());
        for (name, value) in headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("\r\n");
        let mut resp = head.into_bytes();
        resp.extend_from_slice(body);

        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            if let Ok((mut stream, _)) = listener.accept().await {
                received = read_request(&mut stream).await;
                let _ = stream.write_all(&resp).await;
                let _ = stream.shutdown().await;
            }
            received
        });

        (url, handle)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> Vec<u8> {
        let mut received = Vec::new();
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            received.extend_from_slice(&buf[..n]);
            if let Some(head_end) = find(&received, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&received[..head_end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if received.len() >= head_end + 4 + length {
                    break;
                }
            }
        }
        received
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Splits a raw request into its head (lowercased) and body.
    pub fn split_request(raw: &[u8]) -> (String, Vec<u8>) {
        match find(raw, b"\r\n\r\n") {
            Some(end) => (
                String::from_utf8_lossy(&raw[..end]).to_lowercase(),
                raw[end + 4..].to_vec(),
            ),
            None => (String::from_utf8_lossy(raw).to_lowercase(), Vec::new()),
        }
    }
}
