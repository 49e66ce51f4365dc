//! Disk-backed cache store.
//!
//! Entries live under `<root>/<namespace>/<hash>.json`, where `<hash>` is the
//! first 16 bytes of the SHA-256 of the key, hex-encoded. Each file holds the
//! whole [`CacheEntry`] (key included) with the body base64-encoded.
//!
//! Next to it, `<hash>.meta.json` holds the entry's [`EntryStamp`]. Listing
//! and pruning read only these, so they stay cheap however large the cached
//! blobs are.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::namespace::{CacheEntry, CacheNamespace, EntryStamp};
use crate::store::{CacheError, CacheStore};

const ENTRY_SUFFIX: &str = ".json";
const STAMP_SUFFIX: &str = ".meta.json";

/// File-per-entry cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskCacheStore {
    root: PathBuf,
}

impl DiskCacheStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: CacheNamespace) -> PathBuf {
        self.root.join(namespace.as_str())
    }

    fn entry_path(&self, namespace: CacheNamespace, key: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}{ENTRY_SUFFIX}", hash_key(key)))
    }

    fn stamp_path(&self, namespace: CacheNamespace, key: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}{STAMP_SUFFIX}", hash_key(key)))
    }
}

/// File stem for a cache key.
pub fn hash_key(key: &str) -> String {
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(&hash[..16])
}

/// Writes `value` as JSON to a temp file, then renames it over `path` so
/// readers never see a half-written file.
fn write_json(path: &Path, value: &impl Serialize) -> Result<(), CacheError> {
    let json = serde_json::to_vec(value)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<bool, CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl CacheStore for DiskCacheStore {
    fn get(&self, namespace: CacheNamespace, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(namespace, key);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: CacheEntry = serde_json::from_slice(&data)?;
        // Hash collision or a file renamed by hand.
        if entry.key != key {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn put(&self, namespace: CacheNamespace, entry: CacheEntry) -> Result<(), CacheError> {
        std::fs::create_dir_all(self.namespace_dir(namespace))?;
        // Entry first: a listed stamp always has its entry unless a write
        // was cut short in between.
        write_json(&self.entry_path(namespace, &entry.key), &entry)?;
        write_json(&self.stamp_path(namespace, &entry.key), &entry.stamp())
    }

    fn delete(&self, namespace: CacheNamespace, key: &str) -> Result<bool, CacheError> {
        let stamped = remove_if_present(&self.stamp_path(namespace, key))?;
        let stored = remove_if_present(&self.entry_path(namespace, key))?;
        Ok(stamped || stored)
    }

    fn stamps(&self, namespace: CacheNamespace) -> Result<Vec<EntryStamp>, CacheError> {
        let dir = self.namespace_dir(namespace);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut stamps = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_stamp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(STAMP_SUFFIX));
            if !is_stamp {
                continue;
            }
            let parsed = std::fs::read(&path)
                .map_err(CacheError::from)
                .and_then(|data| Ok(serde_json::from_slice::<EntryStamp>(&data)?));
            match parsed {
                Ok(stamp) => stamps.push(stamp),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable cache stamp"),
            }
        }
        stamps.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(stamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Response;
    use chrono::{TimeZone, Utc};

    fn entry(key: &str, body: &[u8]) -> CacheEntry {
        CacheEntry::new(
            key,
            Response::new(200, body.to_vec()).with_header("Content-Type", "application/json"),
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn hash_key_length() {
        assert_eq!(hash_key("https://store/x/y").len(), 32);
        assert_ne!(hash_key("a"), hash_key("b"));
    }

    #[test]
    fn put_get_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::open(tmp.path()).unwrap();
        store
            .put(CacheNamespace::Metadata, entry("https://app/api/file/abc", b"{}"))
            .unwrap();

        let reopened = DiskCacheStore::open(tmp.path()).unwrap();
        let got = reopened
            .get(CacheNamespace::Metadata, "https://app/api/file/abc")
            .unwrap()
            .unwrap();
        assert_eq!(got, entry("https://app/api/file/abc", b"{}"));
    }

    #[test]
    fn one_directory_per_namespace() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::open(tmp.path()).unwrap();
        store.put(CacheNamespace::BlobContent, entry("k", b"x")).unwrap();

        let file = tmp
            .path()
            .join("blob-content")
            .join(format!("{}.json", hash_key("k")));
        assert!(file.exists());
        assert!(store.get(CacheNamespace::Listing, "k").unwrap().is_none());
    }

    #[test]
    fn keys_and_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::open(tmp.path()).unwrap();
        assert!(store.keys(CacheNamespace::Listing).unwrap().is_empty());

        store.put(CacheNamespace::Listing, entry("b", b"1")).unwrap();
        store.put(CacheNamespace::Listing, entry("a", b"2")).unwrap();
        assert_eq!(store.keys(CacheNamespace::Listing).unwrap(), vec!["a", "b"]);

        assert!(store.delete(CacheNamespace::Listing, "a").unwrap());
        assert!(!store.delete(CacheNamespace::Listing, "a").unwrap());
        assert_eq!(store.keys(CacheNamespace::Listing).unwrap(), vec!["b"]);
    }

    #[test]
    fn corrupt_stamp_is_skipped_by_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::open(tmp.path()).unwrap();
        store.put(CacheNamespace::Listing, entry("good", b"1")).unwrap();
        std::fs::write(tmp.path().join("listing").join("junk.meta.json"), b"not json").unwrap();
        std::fs::write(tmp.path().join("listing").join("junk.json"), b"not json").unwrap();

        assert_eq!(store.keys(CacheNamespace::Listing).unwrap(), vec!["good"]);
    }

    #[test]
    fn listing_keys_never_reads_entry_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::open(tmp.path()).unwrap();
        store.put(CacheNamespace::BlobContent, entry("https://store/a", b"big")).unwrap();
        // Clobber the entry itself; only its stamp is left intact.
        let entry_file = tmp
            .path()
            .join("blob-content")
            .join(format!("{}.json", hash_key("https://store/a")));
        std::fs::write(&entry_file, b"{").unwrap();

        assert_eq!(store.keys(CacheNamespace::BlobContent).unwrap(), vec!["https://store/a"]);
        let stamps = store.stamps(CacheNamespace::BlobContent).unwrap();
        assert_eq!(stamps[0].stored_at, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        assert!(store.get(CacheNamespace::BlobContent, "https://store/a").is_err());
    }

    #[test]
    fn prune_over_disk_store_removes_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::open(tmp.path()).unwrap();
        store.put(CacheNamespace::Listing, entry("old", b"1")).unwrap();

        let later = Utc.with_ymd_and_hms(2026, 3, 1, 12, 6, 0).unwrap();
        let removed = crate::expiration::prune(&store, CacheNamespace::Listing, later).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(std::fs::read_dir(tmp.path().join("listing")).unwrap().count(), 0);
    }

    #[test]
    fn corrupt_entry_get_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::open(tmp.path()).unwrap();
        let dir = tmp.path().join("metadata");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.json", hash_key("k"))), b"{").unwrap();

        assert!(matches!(
            store.get(CacheNamespace::Metadata, "k"),
            Err(CacheError::Corrupt(_))
        ));
    }
}
