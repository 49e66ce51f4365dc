//! Count and age bounds per namespace.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::namespace::{CacheEntry, CacheNamespace, EntryStamp};
use crate::store::{CacheError, CacheStore};

/// Expiration bound of one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    pub max_entries: usize,
    /// `None` keeps entries until evicted by count.
    pub max_age: Option<Duration>,
}

impl ExpirationPolicy {
    pub fn for_namespace(namespace: CacheNamespace) -> Self {
        match namespace {
            CacheNamespace::NavigationShell => Self {
                max_entries: 1,
                max_age: None,
            },
            CacheNamespace::Listing => Self {
                max_entries: 20,
                max_age: Some(Duration::minutes(5)),
            },
            // Signed download links stay valid for 30 minutes.
            CacheNamespace::Metadata => Self {
                max_entries: 50,
                max_age: Some(Duration::minutes(30)),
            },
            CacheNamespace::BlobContent => Self {
                max_entries: 50,
                max_age: Some(Duration::hours(24)),
            },
        }
    }

    pub fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        self.expired_at(entry.stored_at, now)
    }

    /// Whether something written at `stored_at` is over age at `now`.
    pub fn expired_at(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.max_age.is_some_and(|max_age| now - stored_at > max_age)
    }
}

/// Drops over-age entries of `namespace`, then the oldest until the count
/// bound holds. Returns how many entries were removed.
///
/// Works from [`CacheStore::stamps`] only; no response body is read.
pub fn prune(
    store: &dyn CacheStore,
    namespace: CacheNamespace,
    now: DateTime<Utc>,
) -> Result<usize, CacheError> {
    let policy = ExpirationPolicy::for_namespace(namespace);

    let mut live: Vec<EntryStamp> = Vec::new();
    let mut removed = 0;
    for stamp in store.stamps(namespace)? {
        if policy.expired_at(stamp.stored_at, now) {
            store.delete(namespace, &stamp.key)?;
            removed += 1;
        } else {
            live.push(stamp);
        }
    }

    if live.len() > policy.max_entries {
        // Oldest first; key breaks ties so eviction is deterministic.
        live.sort_by(|a, b| a.stored_at.cmp(&b.stored_at).then_with(|| a.key.cmp(&b.key)));
        let excess = live.len() - policy.max_entries;
        for stamp in live.into_iter().take(excess) {
            store.delete(namespace, &stamp.key)?;
            removed += 1;
        }
    }

    if removed > 0 {
        debug!(namespace = %namespace, removed, "pruned cache namespace");
    }
    Ok(removed)
}
