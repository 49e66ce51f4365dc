//! Offline caching layer for the file manager.
//!
//! Every read request passes through an [`OfflineWorker`], whose
//! [`CacheRouter`] classifies it into one of four cache namespaces and a
//! policy. Responses are written to an injected [`CacheStore`] and later
//! consumed by the [`OfflineRetriever`] when the network is gone.
//!
//! # Namespaces
//!
//! | Namespace | Policy | Bound |
//! |---|---|---|
//! | `navigation-shell` | cache-first app shell | 1 entry |
//! | `listing` | network-first with timeout | 20 entries, 5 min |
//! | `metadata` | stale-while-revalidate | 50 entries, 30 min |
//! | `blob-content` | cache-first, opaque allowed | 50 entries, 24 h |
//!
//! Blob keys drop the query string, so signed links that differ only in
//! their token share one entry.

pub mod clock;
pub mod disk;
pub mod expiration;
pub mod namespace;
pub mod network;
pub mod request;
pub mod retriever;
pub mod router;
pub mod store;
pub mod strategy;
pub mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use disk::DiskCacheStore;
pub use expiration::ExpirationPolicy;
pub use namespace::{CacheEntry, CacheNamespace, EntryStamp};
pub use network::{Network, NetworkError};
pub use request::{Method, Request, RequestMode, Response, strip_query};
pub use retriever::{MissReason, OfflineDataUnavailable, OfflineFile, OfflineRetriever};
pub use router::{CachePolicy, CacheRouter, Route, RouterConfig};
pub use store::{CacheError, CacheStore, MemoryCacheStore};
pub use strategy::{FetchOutcome, ResponseSource};
pub use worker::{OfflineWorker, WorkerError, WorkerState};
