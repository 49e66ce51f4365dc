//! Cache policy handlers.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::expiration::{ExpirationPolicy, prune};
use crate::namespace::{CacheEntry, CacheNamespace};
use crate::network::{Network, NetworkError};
use crate::request::{Request, Response};
use crate::store::CacheStore;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
}

/// Result of handling one intercepted request.
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
    /// Background refresh started by stale-while-revalidate.
    pub revalidation: Option<JoinHandle<()>>,
}

impl FetchOutcome {
    pub(crate) fn network(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
            revalidation: None,
        }
    }

    pub(crate) fn cache(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Cache,
            revalidation: None,
        }
    }
}

/// Collaborators shared by every policy handler.
#[derive(Clone)]
pub(crate) struct PolicyContext {
    pub store: Arc<dyn CacheStore>,
    pub network: Arc<dyn Network>,
    pub clock: Arc<dyn Clock>,
}

impl PolicyContext {
    /// Cached response for `key`, treating an over-age entry as a miss.
    ///
    /// Store failures degrade to a miss.
    fn lookup(&self, namespace: CacheNamespace, key: &str) -> Option<Response> {
        let entry = match self.store.get(namespace, key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(%namespace, key, error = %e, "cache read failed");
                return None;
            }
        };

        let policy = ExpirationPolicy::for_namespace(namespace);
        if policy.is_expired(&entry, self.clock.now()) {
            debug!(%namespace, key, "cache entry expired");
            if let Err(e) = self.store.delete(namespace, key) {
                warn!(%namespace, key, error = %e, "expired entry could not be removed");
            }
            return None;
        }
        Some(entry.response)
    }

    /// Stores `response` if its status is cacheable, then prunes the namespace.
    fn store_if_cacheable(
        &self,
        namespace: CacheNamespace,
        key: &str,
        response: &Response,
        accept_opaque: bool,
    ) {
        let cacheable = response.status == 200 || (accept_opaque && response.is_opaque());
        if !cacheable {
            debug!(%namespace, key, status = response.status, "response not cacheable");
            return;
        }

        let now = self.clock.now();
        let entry = CacheEntry::new(key, response.clone(), now);
        if let Err(e) = self.store.put(namespace, entry) {
            warn!(%namespace, key, error = %e, "cache write failed");
            return;
        }
        if let Err(e) = prune(self.store.as_ref(), namespace, now) {
            warn!(%namespace, error = %e, "cache pruning failed");
        }
    }
}

/// Network only; nothing is cached.
pub(crate) async fn passthrough(
    ctx: &PolicyContext,
    request: Request,
) -> Result<FetchOutcome, NetworkError> {
    let response = ctx.network.fetch(request).await?;
    Ok(FetchOutcome::network(response))
}

/// Serves the cache; fetches and stores on a miss.
pub(crate) async fn cache_first(
    ctx: &PolicyContext,
    namespace: CacheNamespace,
    key: &str,
    request: Request,
    accept_opaque: bool,
) -> Result<FetchOutcome, NetworkError> {
    if let Some(response) = ctx.lookup(namespace, key) {
        return Ok(FetchOutcome::cache(response));
    }
    let response = ctx.network.fetch(request).await?;
    ctx.store_if_cacheable(namespace, key, &response, accept_opaque);
    Ok(FetchOutcome::network(response))
}

/// Prefers the network, falling back to the cache on failure or after
/// `timeout`. On a timeout with nothing cached the network is awaited anyway.
pub(crate) async fn network_first(
    ctx: &PolicyContext,
    namespace: CacheNamespace,
    key: &str,
    request: Request,
    timeout: Duration,
) -> Result<FetchOutcome, NetworkError> {
    let mut fetch = ctx.network.fetch(request);

    match tokio::time::timeout(timeout, &mut fetch).await {
        Ok(Ok(response)) => {
            ctx.store_if_cacheable(namespace, key, &response, false);
            Ok(FetchOutcome::network(response))
        }
        Ok(Err(e)) => {
            debug!(%namespace, key, error = %e, "network failed, trying cache");
            ctx.lookup(namespace, key)
                .map(FetchOutcome::cache)
                .ok_or(e)
        }
        Err(_) => {
            debug!(%namespace, key, ?timeout, "network timed out, trying cache");
            if let Some(response) = ctx.lookup(namespace, key) {
                return Ok(FetchOutcome::cache(response));
            }
            let response = fetch.await?;
            ctx.store_if_cacheable(namespace, key, &response, false);
            Ok(FetchOutcome::network(response))
        }
    }
}

/// Serves the cache immediately and refreshes it on a spawned task.
/// A miss waits for the network.
pub(crate) async fn stale_while_revalidate(
    ctx: &PolicyContext,
    namespace: CacheNamespace,
    key: &str,
    request: Request,
) -> Result<FetchOutcome, NetworkError> {
    if let Some(response) = ctx.lookup(namespace, key) {
        let refresh = tokio::spawn(revalidate(ctx.clone(), namespace, key.to_string(), request));
        let mut outcome = FetchOutcome::cache(response);
        outcome.revalidation = Some(refresh);
        return Ok(outcome);
    }
    let response = ctx.network.fetch(request).await?;
    ctx.store_if_cacheable(namespace, key, &response, false);
    Ok(FetchOutcome::network(response))
}

async fn revalidate(ctx: PolicyContext, namespace: CacheNamespace, key: String, request: Request) {
    match ctx.network.fetch(request).await {
        Ok(response) => ctx.store_if_cacheable(namespace, &key, &response, false),
        Err(e) => debug!(%namespace, key, error = %e, "background refresh failed"),
    }
}
