//! Declarative routing of intercepted requests to cache policies.
//!
//! Rules are evaluated in order and the first match wins. Requests no rule
//! claims go straight to the network and are never cached. Classification
//! is pure: it looks at the request only, never at the store.

use std::time::Duration;

use crate::namespace::CacheNamespace;
use crate::request::{Method, Request, RequestMode, origin_of, same_origin, strip_fragment, strip_query};

/// Default wait for a listing response before falling back to the cache.
pub const DEFAULT_LISTING_TIMEOUT: Duration = Duration::from_secs(3);

/// Where the worker's routes point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Origin the application itself is served from.
    pub app_origin: String,
    /// Origin of the object-storage host.
    pub storage_origin: String,
    pub api_prefix: String,
    pub asset_prefixes: Vec<String>,
    /// Path of the file-listing endpoint.
    pub listing_path: String,
    /// Prefix of single-file metadata endpoints (`<prefix><file id>`).
    pub metadata_prefix: String,
    pub listing_timeout: Duration,
}

impl RouterConfig {
    pub fn new(app_origin: impl Into<String>, storage_origin: impl Into<String>) -> Self {
        Self {
            app_origin: app_origin.into(),
            storage_origin: storage_origin.into(),
            api_prefix: "/api/".into(),
            asset_prefixes: vec!["/assets/".into()],
            listing_path: "/api/file/list".into(),
            metadata_prefix: "/api/file/".into(),
            listing_timeout: DEFAULT_LISTING_TIMEOUT,
        }
    }

    pub fn with_listing_timeout(mut self, timeout: Duration) -> Self {
        self.listing_timeout = timeout;
        self
    }
}

/// How a routed request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve the single cached app shell for any navigation.
    AppShell,
    /// Prefer the network; use the cache after `timeout` or on failure.
    NetworkFirst { timeout: Duration },
    /// Serve the cache immediately and refresh it in the background.
    StaleWhileRevalidate,
    /// Serve the cache; go to the network only on a miss.
    CacheFirst { accept_opaque: bool },
}

/// Classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Cache {
        namespace: CacheNamespace,
        policy: CachePolicy,
        /// Normalized cache key.
        key: String,
    },
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    /// Same-origin navigation outside API and asset paths.
    Navigation,
    PathEquals(String),
    /// `<prefix><one non-empty segment>`.
    SingleSegmentUnder(String),
    OriginEquals(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    namespace: CacheNamespace,
    matcher: Matcher,
    policy: CachePolicy,
}

/// Ordered rule table over a [`RouterConfig`].
#[derive(Debug, Clone)]
pub struct CacheRouter {
    config: RouterConfig,
    rules: Vec<Rule>,
}

impl CacheRouter {
    pub fn new(config: RouterConfig) -> Self {
        let rules = vec![
            Rule {
                namespace: CacheNamespace::NavigationShell,
                matcher: Matcher::Navigation,
                policy: CachePolicy::AppShell,
            },
            Rule {
                namespace: CacheNamespace::Listing,
                matcher: Matcher::PathEquals(config.listing_path.clone()),
                policy: CachePolicy::NetworkFirst {
                    timeout: config.listing_timeout,
                },
            },
            Rule {
                namespace: CacheNamespace::Metadata,
                matcher: Matcher::SingleSegmentUnder(config.metadata_prefix.clone()),
                policy: CachePolicy::StaleWhileRevalidate,
            },
            Rule {
                namespace: CacheNamespace::BlobContent,
                matcher: Matcher::OriginEquals(config.storage_origin.clone()),
                policy: CachePolicy::CacheFirst {
                    accept_opaque: true,
                },
            },
        ];
        Self { config, rules }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Routes `request` to the first matching rule.
    pub fn classify(&self, request: &Request) -> Route {
        if request.method != Method::Get {
            return Route::Passthrough;
        }
        self.rules
            .iter()
            .find(|rule| self.matches(&rule.matcher, request))
            .map(|rule| Route::Cache {
                namespace: rule.namespace,
                policy: rule.policy,
                key: self.cache_key(rule.namespace, &request.url),
            })
            .unwrap_or(Route::Passthrough)
    }

    /// Normalized key of `url` within `namespace`.
    ///
    /// Blob keys are normalized origin + path: the signed token in the query
    /// changes on every metadata refresh while the object does not, and host
    /// case or an explicit default port never split one object into two keys.
    /// Every navigation shares the one shell key.
    pub fn cache_key(&self, namespace: CacheNamespace, url: &str) -> String {
        match namespace {
            CacheNamespace::NavigationShell => self.shell_key(),
            CacheNamespace::BlobContent => strip_query(url),
            CacheNamespace::Listing | CacheNamespace::Metadata => strip_fragment(url),
        }
    }

    /// Fixed key the app shell is stored under.
    pub fn shell_key(&self) -> String {
        let origin = origin_of(&self.config.app_origin)
            .unwrap_or_else(|| self.config.app_origin.trim_end_matches('/').to_string());
        format!("{origin}/index.html")
    }

    fn matches(&self, matcher: &Matcher, request: &Request) -> bool {
        let from_app = || same_origin(&request.url, &self.config.app_origin);
        let path = request.path();
        match matcher {
            Matcher::Navigation => {
                request.mode == RequestMode::Navigate
                    && from_app()
                    && !path.starts_with(&self.config.api_prefix)
                    && !self
                        .config
                        .asset_prefixes
                        .iter()
                        .any(|prefix| path.starts_with(prefix.as_str()))
            }
            Matcher::PathEquals(expected) => from_app() && path == *expected,
            Matcher::SingleSegmentUnder(prefix) => {
                from_app()
                    && path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            }
            Matcher::OriginEquals(expected) => same_origin(&request.url, expected),
        }
    }
}
