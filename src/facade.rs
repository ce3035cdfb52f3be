//! Cache Facade Module
//!
//! Composes the tiers behind the public entry point: `Cache` owns the
//! tiers and the janitor, and `cached` wraps a computation so its results
//! are looked up memory-first, disk-second, and computed only on a full
//! miss.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::disk::DiskStore;
use crate::error::Result;
use crate::key::{self, CacheArgs, CacheKey};
use crate::memory::MemoryStore;
use crate::stats::CacheStats;
use crate::tasks::Janitor;

// == Cached Options ==
/// Per-wrapper caching options.
#[derive(Debug, Clone, Copy)]
pub struct CachedOptions {
    /// TTL in seconds; the configured default applies when None
    pub ttl: Option<u64>,
    /// Whether results go through the memory tier
    pub use_memory: bool,
    /// Whether results go through the disk tier
    pub use_disk: bool,
}

impl Default for CachedOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            use_memory: true,
            use_disk: false,
        }
    }
}

impl CachedOptions {
    /// Creates the default options: memory tier only, default TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL in seconds.
    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Enables or disables the memory tier for this wrapper.
    pub fn use_memory(mut self, enabled: bool) -> Self {
        self.use_memory = enabled;
        self
    }

    /// Enables or disables the disk tier for this wrapper.
    pub fn use_disk(mut self, enabled: bool) -> Self {
        self.use_disk = enabled;
        self
    }
}

// == Cache ==
/// The public cache handle.
///
/// Cheap to clone; all clones share the same tiers and janitor. Constructed
/// once at process start via `initialize` and passed to whoever wraps
/// computations — the tiers are never recreated implicitly.
#[derive(Debug, Clone)]
pub struct Cache {
    config: CacheConfig,
    memory: Arc<RwLock<MemoryStore>>,
    disk: Arc<DiskStore>,
    janitor: Arc<Janitor>,
}

impl Cache {
    // == Initialize ==
    /// Builds the tiers from configuration, ensures the cache directory
    /// exists, and starts the janitor. When caching is disabled neither
    /// happens and every wrapped call invokes its computation directly.
    pub async fn initialize(config: CacheConfig) -> Result<Self> {
        let memory = Arc::new(RwLock::new(MemoryStore::new(
            config.max_entries,
            config.default_ttl,
        )));
        let disk = Arc::new(DiskStore::new(
            config.cache_dir.clone(),
            config.max_size_bytes,
        ));
        let janitor = Arc::new(Janitor::new(
            Arc::clone(&memory),
            Arc::clone(&disk),
            config.default_ttl,
            config.cleanup_interval,
        ));

        if config.enabled {
            disk.ensure_dir().await?;
            janitor.start();
        } else {
            debug!("caching disabled; all wrapped calls compute directly");
        }

        Ok(Self {
            config,
            memory,
            disk,
            janitor,
        })
    }

    // == Shutdown ==
    /// Signals the janitor to stop. Tier contents are left in place.
    pub fn shutdown(&self) {
        self.janitor.stop();
    }

    // == Enabled ==
    /// Returns true when caching is globally enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    // == Cached ==
    /// Wraps a computation so its results are cached per argument set.
    ///
    /// The wrapper has the same logical signature as the computation:
    /// `call(&args)` yields exactly what `compute(&args)` would, with the
    /// cache layered in front.
    ///
    /// # Arguments
    /// * `operation` - Logical operation identifier, part of every key
    /// * `options` - Per-wrapper TTL and tier selection
    /// * `compute` - The underlying computation
    pub fn cached<A, T, F>(
        &self,
        operation: impl Into<String>,
        options: CachedOptions,
        compute: F,
    ) -> CachedFn<A, T, F>
    where
        A: CacheArgs,
        T: Serialize + DeserializeOwned,
        F: Fn(&A) -> T,
    {
        CachedFn {
            cache: self.clone(),
            operation: operation.into(),
            options,
            compute,
            _marker: PhantomData,
        }
    }

    // == Invalidate ==
    /// Removes one logical call's entry from both tiers.
    pub async fn invalidate(&self, operation: &str, args: &impl CacheArgs) {
        let key = key::derive(operation, &args.call_args());
        self.memory.write().await.remove(&key);
        if let Err(e) = self.disk.remove(&key).await {
            warn!(operation, "failed to remove cache file: {e}");
        }
    }

    // == Stats ==
    /// Returns current memory tier statistics.
    pub async fn memory_stats(&self) -> CacheStats {
        self.memory.read().await.stats()
    }

    /// Returns current disk tier statistics.
    pub fn disk_stats(&self) -> CacheStats {
        self.disk.stats()
    }

    // == Internal Tier Access ==
    async fn memory_get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        // Write lock even for reads: a hit refreshes the access timestamp
        self.memory.write().await.get(key)
    }

    async fn memory_set(&self, key: CacheKey, bytes: Vec<u8>, ttl: u64) {
        self.memory.write().await.set(key, bytes, Some(ttl));
    }

    #[cfg(test)]
    pub(crate) async fn memory_contains_live(&self, key: &CacheKey) -> bool {
        self.memory.read().await.contains_live(key)
    }

    #[cfg(test)]
    pub(crate) fn janitor_running(&self) -> bool {
        self.janitor.is_running()
    }
}

// == Cached Fn ==
/// A computation wrapped with tiered caching.
///
/// Created by [`Cache::cached`]. `call` has the identical input/output
/// contract as the wrapped computation; no cache condition ever changes
/// the value the caller receives.
pub struct CachedFn<A, T, F> {
    cache: Cache,
    operation: String,
    options: CachedOptions,
    compute: F,
    _marker: PhantomData<fn(&A) -> T>,
}

impl<A, T, F> CachedFn<A, T, F>
where
    A: CacheArgs,
    T: Serialize + DeserializeOwned,
    F: Fn(&A) -> T,
{
    // == Call ==
    /// Invokes the wrapped computation through the cache.
    ///
    /// Lookup order: memory tier, then disk tier (each only when enabled
    /// for this wrapper), then the computation itself. A disk hit is
    /// promoted into the memory tier. Expiry checks run inside the tier
    /// lookups, so a stale value is never returned.
    pub async fn call(&self, args: &A) -> T {
        if !self.cache.config.enabled {
            return (self.compute)(args);
        }

        let key = key::derive(&self.operation, &args.call_args());
        let ttl = self.options.ttl.unwrap_or(self.cache.config.default_ttl);

        if self.options.use_memory {
            if let Some(bytes) = self.cache.memory_get(&key).await {
                match serde_json::from_slice(&bytes) {
                    Ok(value) => {
                        debug!(operation = %self.operation, "memory tier hit");
                        return value;
                    }
                    Err(e) => {
                        warn!(
                            operation = %self.operation,
                            "discarding undecodable memory entry: {e}"
                        );
                    }
                }
            }
        }

        if self.options.use_disk {
            if let Some(bytes) = self.cache.disk.get(&key, ttl).await {
                match serde_json::from_slice(&bytes) {
                    Ok(value) => {
                        debug!(operation = %self.operation, "disk tier hit");
                        if self.options.use_memory {
                            // Promotion: the next lookup is served from memory
                            self.cache.memory_set(key, bytes, ttl).await;
                        }
                        return value;
                    }
                    Err(e) => {
                        warn!(
                            operation = %self.operation,
                            "discarding undecodable cache file: {e}"
                        );
                    }
                }
            }
        }

        let value = (self.compute)(args);

        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                if self.options.use_disk {
                    if let Err(e) = self.cache.disk.set(&key, &bytes).await {
                        warn!(operation = %self.operation, "disk tier write failed: {e}");
                    }
                }
                if self.options.use_memory {
                    self.cache.memory_set(key, bytes, ttl).await;
                }
            }
            Err(e) => {
                warn!(
                    operation = %self.operation,
                    "result not serializable, skipping cache: {e}"
                );
            }
        }

        value
    }
}
