use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::Response;

/// Independent cache key spaces, each with its own expiration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheNamespace {
    NavigationShell,
    Listing,
    Metadata,
    BlobContent,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 4] = [
        Self::NavigationShell,
        Self::Listing,
        Self::Metadata,
        Self::BlobContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NavigationShell => "navigation-shell",
            Self::Listing => "listing",
            Self::Metadata => "metadata",
            Self::BlobContent => "blob-content",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached response under its normalized key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub response: Response,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, response: Response, stored_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            response,
            stored_at,
        }
    }

    pub fn stamp(&self) -> EntryStamp {
        EntryStamp {
            key: self.key.clone(),
            stored_at: self.stored_at,
        }
    }
}

/// Key and write time of an entry, without its response.
///
/// Enough to list and expire a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStamp {
    pub key: String,
    pub stored_at: DateTime<Utc>,
}
