//! Sharded LRU disk cache.
//!
//! Layout: `{dir}/{shard:03}/{digest}.val` with a `{digest}.meta.json`
//! sidecar per entry. The digest is the blake3 hash of the key, so any
//! string is a valid key.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - TTL expiry checked on read; expired entries are removed
//! - LRU eviction down to the byte budget after each write
//! - Corrupt or orphaned entries are removed and reported as misses

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::provider::DataError;

/// Hard upper bound on shard directories.
const MAX_SHARDS: u32 = 1000;

/// Configuration for a [`DiskCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory of the cache.
    pub dir: PathBuf,
    /// Byte budget across all entries; least-recently-used entries are
    /// evicted once it is exceeded.
    pub size_limit: u64,
    /// Entries older than this read as misses and are removed.
    pub ttl: Duration,
    /// Number of shard subdirectories, clamped to `1..=1000`.
    pub shards: u32,
}

impl CacheConfig {
    /// Defaults: 1 GB budget, 7-day TTL, 64 shards.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            size_limit: 1_000_000_000,
            ttl: Duration::days(7),
            shards: 64,
        }
    }

    pub fn with_size_limit(mut self, bytes: u64) -> Self {
        self.size_limit = bytes;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_shards(mut self, shards: u32) -> Self {
        self.shards = shards;
        self
    }
}

/// Metadata sidecar for one cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    size: u64,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
}

/// Aggregate cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
}

/// Key→bytes store on local disk with LRU eviction and TTL expiry.
///
/// Lifecycle: construct one handle at startup with [`DiskCache::open`] and
/// inject it wherever caching is needed; clones are cheap and point at the
/// same directory. Every [`DiskCache::set`] is durable when it returns, so
/// there is no close or flush step. Two handles opened on the same directory
/// observe the same entries.
///
/// Cross-thread and cross-process safety rely on the atomicity of the
/// temp-file + rename writes; no locking is layered on top.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    size_limit: u64,
    ttl: Duration,
    shards: u32,
}

impl DiskCache {
    /// Open a cache at `config.dir`, creating the directory if absent.
    pub fn open(config: CacheConfig) -> Result<Self, DataError> {
        fs::create_dir_all(&config.dir).map_err(|e| {
            DataError::CacheError(format!(
                "failed to create cache dir {}: {e}",
                config.dir.display()
            ))
        })?;
        Ok(Self {
            dir: config.dir,
            size_limit: config.size_limit,
            ttl: config.ttl,
            shards: config.shards.clamp(1, MAX_SHARDS),
        })
    }

    /// Root directory of the cache.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up `key`. Misses, expired entries, and corrupt entries all
    /// return `Ok(None)`; a hit refreshes the entry's last-used stamp
    /// (best effort).
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DataError> {
        let (val_path, meta_path) = self.entry_paths(key);

        let Some(mut meta) = self.read_meta(&meta_path) else {
            if val_path.exists() {
                warn!(key, "removing cache value without metadata sidecar");
                let _ = fs::remove_file(&val_path);
            }
            return Ok(None);
        };

        let now = Utc::now();
        if now.signed_duration_since(meta.created_at) >= self.ttl {
            debug!(key, "cache entry expired");
            remove_entry(&val_path, &meta_path);
            return Ok(None);
        }

        let bytes = match fs::read(&val_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let _ = fs::remove_file(&meta_path);
                return Ok(None);
            }
            Err(e) => {
                return Err(DataError::CacheError(format!(
                    "failed to read value for '{key}': {e}"
                )))
            }
        };

        // Refresh recency; a failed stamp is not a read failure.
        meta.last_used = now;
        if let Err(e) = self.write_meta(&meta_path, &meta) {
            debug!(key, error = %e, "failed to refresh last-used stamp");
        }

        Ok(Some(bytes))
    }

    /// Store `bytes` under `key`, overwriting any previous value, then evict
    /// least-recently-used entries until the byte budget holds.
    pub fn set(&self, key: &str, bytes: &[u8]) -> Result<(), DataError> {
        let (val_path, meta_path) = self.entry_paths(key);
        let shard = val_path
            .parent()
            .expect("entry path always has a shard parent");
        fs::create_dir_all(shard).map_err(|e| {
            DataError::CacheError(format!("failed to create shard dir {}: {e}", shard.display()))
        })?;

        let tmp_path = val_path.with_extension("val.tmp");
        fs::write(&tmp_path, bytes).map_err(|e| {
            DataError::CacheError(format!("failed to write value for '{key}': {e}"))
        })?;
        fs::rename(&tmp_path, &val_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed for '{key}': {e}"))
        })?;

        let now = Utc::now();
        let meta = EntryMeta {
            key: key.to_string(),
            size: bytes.len() as u64,
            created_at: now,
            last_used: now,
        };
        self.write_meta(&meta_path, &meta)?;

        self.enforce_size_limit()
    }

    /// Whether `key` holds a live (non-expired) entry.
    pub fn contains(&self, key: &str) -> bool {
        let (_, meta_path) = self.entry_paths(key);
        self.read_meta(&meta_path)
            .is_some_and(|m| Utc::now().signed_duration_since(m.created_at) < self.ttl)
    }

    /// Remove the entry for `key`, if present.
    pub fn remove(&self, key: &str) -> Result<(), DataError> {
        let (val_path, meta_path) = self.entry_paths(key);
        for path in [&val_path, &meta_path] {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != ErrorKind::NotFound {
                    return Err(DataError::CacheError(format!(
                        "failed to remove {}: {e}",
                        path.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Remove every entry, including orphaned value files and stale temp
    /// files.
    pub fn clear(&self) -> Result<(), DataError> {
        let shards = fs::read_dir(&self.dir)
            .map_err(|e| DataError::CacheError(format!("read cache dir: {e}")))?;
        for shard in shards {
            let shard = shard.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }
            let files = fs::read_dir(&shard_path)
                .map_err(|e| DataError::CacheError(format!("read shard dir: {e}")))?;
            for file in files {
                let file = file.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
                if file.path().is_file() {
                    fs::remove_file(file.path()).map_err(|e| {
                        DataError::CacheError(format!(
                            "failed to remove {}: {e}",
                            file.path().display()
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Number of stored entries (including not-yet-purged expired ones).
    pub fn len(&self) -> Result<usize, DataError> {
        Ok(self.scan_entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, DataError> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry past its TTL. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize, DataError> {
        let now = Utc::now();
        let mut purged = 0;
        for entry in self.scan_entries()? {
            if now.signed_duration_since(entry.meta.created_at) >= self.ttl {
                remove_entry(&entry.val_path, &entry.meta_path);
                purged += 1;
            }
        }
        Ok(purged)
    }

    /// Entry count and total stored bytes.
    pub fn stats(&self) -> Result<CacheStats, DataError> {
        let entries = self.scan_entries()?;
        Ok(CacheStats {
            entries: entries.len(),
            total_bytes: entries.iter().map(|e| e.meta.size).sum(),
        })
    }

    // ── Layout ──────────────────────────────────────────────────────

    fn entry_paths(&self, key: &str) -> (PathBuf, PathBuf) {
        let hash = blake3::hash(key.as_bytes());
        let digest = hash.to_hex();
        let shard = u32::from_be_bytes(
            hash.as_bytes()[..4]
                .try_into()
                .expect("blake3 output is at least 4 bytes"),
        ) % self.shards;
        let shard_dir = self.dir.join(format!("{shard:03}"));
        (
            shard_dir.join(format!("{digest}.val")),
            shard_dir.join(format!("{digest}.meta.json")),
        )
    }

    fn read_meta(&self, meta_path: &Path) -> Option<EntryMeta> {
        let content = fs::read_to_string(meta_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(meta) => Some(meta),
            Err(e) => {
                // Corrupt sidecar: drop the whole entry and report a miss.
                warn!(path = %meta_path.display(), error = %e, "removing corrupt cache metadata");
                let val_path = meta_path.with_extension("").with_extension("val");
                remove_entry(&val_path, meta_path);
                None
            }
        }
    }

    fn write_meta(&self, meta_path: &Path, meta: &EntryMeta) -> Result<(), DataError> {
        let json = serde_json::to_string(meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        let tmp_path = meta_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;
        fs::rename(&tmp_path, meta_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("meta rename: {e}"))
        })
    }

    // ── Eviction ────────────────────────────────────────────────────

    fn enforce_size_limit(&self) -> Result<(), DataError> {
        let mut entries = self.scan_entries()?;
        let mut total: u64 = entries.iter().map(|e| e.meta.size).sum();
        if total <= self.size_limit {
            return Ok(());
        }

        // Oldest access first; creation time breaks ties.
        entries.sort_by(|a, b| {
            (a.meta.last_used, a.meta.created_at).cmp(&(b.meta.last_used, b.meta.created_at))
        });

        for entry in entries {
            if total <= self.size_limit {
                break;
            }
            debug!(
                key = entry.meta.key.as_str(),
                size = entry.meta.size,
                "evicting least-recently-used cache entry"
            );
            remove_entry(&entry.val_path, &entry.meta_path);
            total = total.saturating_sub(entry.meta.size);
        }
        Ok(())
    }

    fn scan_entries(&self) -> Result<Vec<ScannedEntry>, DataError> {
        let mut entries = Vec::new();

        let shards = fs::read_dir(&self.dir)
            .map_err(|e| DataError::CacheError(format!("read cache dir: {e}")))?;
        for shard in shards {
            let shard = shard.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }

            let files = fs::read_dir(&shard_path)
                .map_err(|e| DataError::CacheError(format!("read shard dir: {e}")))?;
            for file in files {
                let file = file.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
                let meta_path = file.path();
                if !meta_path.to_string_lossy().ends_with(".meta.json") {
                    continue;
                }
                if let Some(meta) = self.read_meta(&meta_path) {
                    let val_path = meta_path.with_extension("").with_extension("val");
                    entries.push(ScannedEntry {
                        meta,
                        val_path,
                        meta_path,
                    });
                }
            }
        }
        Ok(entries)
    }
}

struct ScannedEntry {
    meta: EntryMeta,
    val_path: PathBuf,
    meta_path: PathBuf,
}

fn remove_entry(val_path: &Path, meta_path: &Path) {
    let _ = fs::remove_file(val_path);
    let _ = fs::remove_file(meta_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_cache(dir: &Path) -> DiskCache {
        DiskCache::open(CacheConfig::new(dir)).unwrap()
    }

    #[test]
    fn set_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_cache(dir.path());

        cache.set("YahooFinance.parquet", b"payload").unwrap();
        assert_eq!(
            cache.get("YahooFinance.parquet").unwrap().as_deref(),
            Some(&b"payload"[..])
        );
    }

    #[test]
    fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_cache(dir.path());

        assert_eq!(cache.get("nope").unwrap(), None);
        assert!(!cache.contains("nope"));
    }

    #[test]
    fn overwrite_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_cache(dir.path());

        cache.set("k", b"one").unwrap();
        cache.set("k", b"two").unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            DiskCache::open(CacheConfig::new(dir.path()).with_ttl(Duration::zero())).unwrap();

        cache.set("k", b"v").unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
        // The expired entry was removed, not just hidden.
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn lru_eviction_respects_recency() {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            DiskCache::open(CacheConfig::new(dir.path()).with_size_limit(250)).unwrap();

        cache.set("a", &[0u8; 100]).unwrap();
        cache.set("b", &[0u8; 100]).unwrap();
        // Touch `a` so `b` becomes the least recently used.
        assert!(cache.get("a").unwrap().is_some());

        cache.set("c", &[0u8; 100]).unwrap();

        assert_eq!(cache.get("b").unwrap(), None);
        assert!(cache.get("a").unwrap().is_some());
        assert!(cache.get("c").unwrap().is_some());
    }

    #[test]
    fn entry_larger_than_budget_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::open(CacheConfig::new(dir.path()).with_size_limit(10)).unwrap();

        cache.set("big", &[0u8; 64]).unwrap();
        assert_eq!(cache.stats().unwrap().total_bytes, 0);
    }

    #[test]
    fn two_handles_share_entries() {
        let dir = tempfile::tempdir().unwrap();
        let first = open_cache(dir.path());
        let second = open_cache(dir.path());

        first.set("shared", b"v").unwrap();
        assert_eq!(second.get("shared").unwrap().as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn clear_and_len() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_cache(dir.path());

        for i in 0..5 {
            cache.set(&format!("k{i}"), b"v").unwrap();
        }
        assert_eq!(cache.len().unwrap(), 5);

        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_cache(dir.path());

        cache.set("k", b"v").unwrap();
        cache.remove("k").unwrap();
        cache.remove("k").unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn purge_expired_counts() {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            DiskCache::open(CacheConfig::new(dir.path()).with_ttl(Duration::zero())).unwrap();

        cache.set("a", b"v").unwrap();
        cache.set("b", b"v").unwrap();
        assert_eq!(cache.purge_expired().unwrap(), 2);
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn shard_count_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            DiskCache::open(CacheConfig::new(dir.path()).with_shards(5000)).unwrap();

        cache.set("k", b"v").unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn corrupt_sidecar_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_cache(dir.path());

        cache.set("k", b"v").unwrap();
        let (_, meta_path) = cache.entry_paths("k");
        fs::write(&meta_path, "not json").unwrap();

        assert_eq!(cache.get("k").unwrap(), None);
    }
}
