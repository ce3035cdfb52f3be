//! Disk Store Module
//!
//! The on-disk cache tier: one file per key under the cache directory,
//! with each file's modification time serving as its expiry clock.

use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use std::time::{Duration, SystemTime};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::key::CacheKey;
use crate::stats::CacheStats;

// == Constants ==
/// Extension of disk tier entry files.
const CACHE_FILE_EXT: &str = "cache";

// == Disk File ==
/// One scanned cache file with the metadata eviction needs.
#[derive(Debug)]
struct DiskFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

// == Disk Store ==
/// Bounded on-disk key-value storage.
///
/// Lookup is direct path construction from the key, never a directory
/// scan. Scans happen only in the eviction and janitor sweeps, which are
/// serialized against each other by an internal lock; concurrent sets make
/// the size accounting approximate, which is accepted.
#[derive(Debug)]
pub struct DiskStore {
    /// Root directory holding the entry files
    dir: PathBuf,
    /// Ceiling on the total size of entry files, in bytes
    max_bytes: u64,
    /// Serializes the list-and-delete sweeps
    sweep_lock: Mutex<()>,
    /// Performance statistics
    stats: StdMutex<CacheStats>,
}

impl DiskStore {
    // == Constructor ==
    /// Creates a new DiskStore rooted at `dir`.
    ///
    /// # Arguments
    /// * `dir` - Cache directory (created by `ensure_dir`)
    /// * `max_bytes` - Ceiling on the total size of entry files
    pub fn new(dir: PathBuf, max_bytes: u64) -> Self {
        Self {
            dir,
            max_bytes,
            sweep_lock: Mutex::new(()),
            stats: StdMutex::new(CacheStats::new()),
        }
    }

    // == Ensure Directory ==
    /// Creates the cache directory if it does not exist.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    // == Path Construction ==
    /// Returns the file path for a key: `<dir>/<key>.cache`.
    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key.as_str(), CACHE_FILE_EXT))
    }

    // == Get ==
    /// Retrieves the value bytes for a key.
    ///
    /// A file older than `ttl_seconds` is deleted on access (lazy
    /// expiration) and reported as a miss. Read failures are logged and
    /// reported as misses, never propagated.
    pub async fn get(&self, key: &CacheKey, ttl_seconds: u64) -> Option<Vec<u8>> {
        let path = self.entry_path(key);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(_) => {
                self.record_miss();
                return None;
            }
        };

        if file_age(&metadata) > Duration::from_secs(ttl_seconds) {
            if let Err(e) = fs::remove_file(&path).await {
                debug!(path = %path.display(), "failed to remove expired cache file: {e}");
            }
            self.record_miss();
            return None;
        }

        match fs::read(&path).await {
            Ok(bytes) => {
                self.record_hit();
                Some(bytes)
            }
            Err(e) => {
                warn!(path = %path.display(), "failed to read cache file: {e}");
                self.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Writes the value bytes to the key's file, overwriting any prior
    /// contents. The write refreshes the file's mtime, which extends its
    /// effective expiry. Triggers size eviction afterwards.
    pub async fn set(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        fs::write(&path, bytes).await?;
        self.evict_if_over_capacity().await?;
        Ok(())
    }

    // == Remove ==
    /// Removes the key's file. Returns true if it existed.
    pub async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // == Eviction ==
    /// Deletes oldest-modified files until the total size of the cache
    /// directory is at or below the configured maximum.
    async fn evict_if_over_capacity(&self) -> Result<()> {
        let _guard = self.sweep_lock.lock().await;

        let mut files = self.scan().await?;
        let mut total: u64 = files.iter().map(|f| f.size).sum();

        if total <= self.max_bytes {
            self.set_total_bytes(total);
            return Ok(());
        }

        files.sort_by_key(|f| f.modified);

        let mut evicted = 0usize;
        for file in &files {
            if total <= self.max_bytes {
                break;
            }
            match fs::remove_file(&file.path).await {
                Ok(()) => {
                    total -= file.size;
                    evicted += 1;
                    self.record_eviction();
                }
                Err(e) => {
                    warn!(path = %file.path.display(), "failed to evict cache file: {e}");
                }
            }
        }

        debug!(
            evicted,
            total_bytes = total,
            max_bytes = self.max_bytes,
            "disk tier evicted oldest files"
        );
        self.set_total_bytes(total);
        Ok(())
    }

    // == Sweep Expired ==
    /// Removes all files whose age exceeds `ttl_seconds`.
    ///
    /// Returns the number of files removed. Called by the background
    /// janitor; redundant with lazy expiration so that files which are
    /// never read again still get reclaimed.
    pub async fn sweep_expired(&self, ttl_seconds: u64) -> Result<usize> {
        let _guard = self.sweep_lock.lock().await;

        let ttl = Duration::from_secs(ttl_seconds);
        let files = self.scan().await?;

        let mut removed = 0usize;
        let mut total: u64 = 0;
        for file in &files {
            let age = SystemTime::now()
                .duration_since(file.modified)
                .unwrap_or(Duration::ZERO);
            if age > ttl {
                match fs::remove_file(&file.path).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(path = %file.path.display(), "failed to remove expired cache file: {e}");
                        total += file.size;
                    }
                }
            } else {
                total += file.size;
            }
        }

        self.set_total_bytes(total);
        Ok(removed)
    }

    // == Total Size ==
    /// Returns the current total size of entry files in bytes.
    pub async fn total_size(&self) -> Result<u64> {
        Ok(self.scan().await?.iter().map(|f| f.size).sum())
    }

    // == Stats ==
    /// Returns current tier statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().expect("stats lock poisoned").clone()
    }

    // == Scan ==
    /// Lists all entry files with size and mtime.
    async fn scan(&self) -> Result<Vec<DiskFile>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_cache_file(&path) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push(DiskFile {
                path,
                size: metadata.len(),
                modified,
            });
        }

        Ok(files)
    }

    fn record_hit(&self) {
        self.stats.lock().expect("stats lock poisoned").record_hit();
    }

    fn record_miss(&self) {
        self.stats.lock().expect("stats lock poisoned").record_miss();
    }

    fn record_eviction(&self) {
        self.stats
            .lock()
            .expect("stats lock poisoned")
            .record_eviction();
    }

    fn set_total_bytes(&self, bytes: u64) {
        self.stats
            .lock()
            .expect("stats lock poisoned")
            .set_total_bytes(bytes);
    }
}

// == Utility Functions ==
/// Age of a file according to its modification time. Files with a future
/// mtime count as age zero.
fn file_age(metadata: &std::fs::Metadata) -> Duration {
    metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .unwrap_or(Duration::ZERO)
}

/// Returns true for `*.cache` entry files.
fn is_cache_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == CACHE_FILE_EXT).unwrap_or(false)
}
