//! Request and response values seen by the offline worker, plus URL helpers.

use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

/// Fetch mode of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    Cors,
    /// Cross-origin without CORS; the response is opaque.
    NoCors,
    SameOrigin,
}

/// An outgoing read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub mode: RequestMode,
}

impl Request {
    /// A `GET` in `cors` mode.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            mode: RequestMode::Cors,
        }
    }

    /// A page navigation to `url`.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            mode: RequestMode::Navigate,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn origin(&self) -> Option<String> {
        origin_of(&self.url)
    }

    pub fn path(&self) -> String {
        path_of(&self.url)
    }
}

/// A response as stored in and served from the cache.
///
/// Status `0` marks an opaque response: its body is kept as undifferentiated
/// bytes and nothing else about it is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(with = "filedock_protocol::base64_bytes")]
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// An opaque (no-CORS) response carrying `body`.
    pub fn opaque(body: impl Into<Vec<u8>>) -> Self {
        Self::new(0, body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_opaque(&self) -> bool {
        self.status == 0
    }
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// Serialized origin (`scheme://host[:port]`) of an absolute URL.
///
/// The host is lowercased and a default port is dropped, so equivalent
/// spellings of one origin compare equal as strings.
pub fn origin_of(url: &str) -> Option<String> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Path component of a URL; `/` when the URL has none.
pub fn path_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative reference: everything before the query or fragment.
        Err(_) => match url.split(['?', '#']).next().unwrap_or_default() {
            "" => "/".to_string(),
            path => path.to_string(),
        },
    }
}

/// Normalized origin + path: query and fragment dropped.
///
/// Idempotent.
pub fn strip_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

/// Normalized URL with only the fragment dropped.
pub fn strip_fragment(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.split('#').next().unwrap_or_default().to_string(),
    }
}

/// Whether two absolute URLs (or bare origins) share an origin.
pub fn same_origin(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a.origin().is_tuple() && a.origin() == b.origin(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_and_path() {
        let url = "https://store.example:8443/c/obj.bin?sig=1#frag";
        assert_eq!(origin_of(url).as_deref(), Some("https://store.example:8443"));
        assert_eq!(path_of(url), "/c/obj.bin");
    }

    #[test]
    fn bare_origin_has_root_path() {
        assert_eq!(origin_of("https://app.example").as_deref(), Some("https://app.example"));
        assert_eq!(path_of("https://app.example"), "/");
        assert_eq!(path_of("https://app.example?x=1"), "/");
    }

    #[test]
    fn relative_url_has_no_origin() {
        assert_eq!(origin_of("/api/file/list"), None);
        assert_eq!(path_of("/api/file/list?page=2"), "/api/file/list");
    }

    #[test]
    fn strip_query_is_idempotent() {
        let once = strip_query("https://store/x/y?sig=1&se=2");
        assert_eq!(once, "https://store/x/y");
        assert_eq!(strip_query(&once), once);
        assert_eq!(strip_query("https://store/x/y"), "https://store/x/y");
    }

    #[test]
    fn signed_tokens_collapse_to_one_key() {
        assert_eq!(
            strip_query("https://store/x/y?sig=aaa"),
            strip_query("https://store/x/y?sig=bbb")
        );
    }

    #[test]
    fn strip_fragment_keeps_query() {
        assert_eq!(strip_fragment("https://a/b?c=1#d"), "https://a/b?c=1");
    }

    #[test]
    fn same_origin_ignores_case_and_slash() {
        assert!(same_origin("https://Store.Example", "https://store.example/"));
        assert!(!same_origin("https://store.example", "https://app.example"));
    }

    #[test]
    fn same_origin_drops_default_port() {
        assert!(same_origin("https://STORE.example:443/x/y", "https://store.example"));
        assert!(!same_origin("https://store.example:8443", "https://store.example"));
        assert!(!same_origin("/relative", "/relative"));
    }

    #[test]
    fn origin_is_normalized() {
        assert_eq!(
            origin_of("https://Store.Example:443/x/y?sig=1").as_deref(),
            Some("https://store.example")
        );
        assert_eq!(origin_of("http://app.example:80/").as_deref(), Some("http://app.example"));
    }

    #[test]
    fn equivalent_spellings_strip_to_one_key() {
        let canonical = strip_query("https://store.example/x/y?sig=1");
        assert_eq!(canonical, "https://store.example/x/y");
        assert_eq!(strip_query("https://STORE.example:443/x/y?sig=2"), canonical);
        assert_eq!(strip_query("https://Store.Example/x/y#part"), canonical);
        assert_eq!(strip_query(&canonical), canonical);
    }

    #[test]
    fn response_body_is_base64_in_json() {
        let resp = Response::new(200, b"hi".to_vec()).with_header("Content-Type", "text/plain");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"body\":\"aGk=\""));
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
        assert_eq!(back.header("content-type"), Some("text/plain"));
    }
}
