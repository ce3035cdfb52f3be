//! Background Janitor Task
//!
//! Periodically removes expired entries from both tiers, independent of
//! access patterns. Redundant with lazy expiration: the janitor reclaims
//! memory and disk space for entries that are never looked up again, while
//! lazy expiration keeps results correct even when the janitor is disabled
//! or lagging.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::disk::DiskStore;
use crate::memory::MemoryStore;

// == Constants ==
/// Shortened sleep used after a failed sweep, so a persistent error does
/// not turn into a fast failure loop.
const RETRY_INTERVAL_SECS: u64 = 60;

// == Janitor State ==
/// Running state: the stop signal sender plus the task handle.
#[derive(Debug)]
struct RunningState {
    stop_tx: watch::Sender<bool>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

// == Janitor ==
/// The periodic background sweeper.
///
/// Two states: Running and Stopped. `start` is a no-op while running;
/// `stop` signals the loop, which observes the signal at the top of each
/// iteration and during its sleep, never mid-sweep.
#[derive(Debug)]
pub struct Janitor {
    /// Shared memory tier
    memory: Arc<RwLock<MemoryStore>>,
    /// Shared disk tier
    disk: Arc<DiskStore>,
    /// TTL in seconds applied to the disk sweep
    sweep_ttl: u64,
    /// Sleep between sweeps, in seconds
    interval: u64,
    /// Current run state
    state: StdMutex<Option<RunningState>>,
}

impl Janitor {
    // == Constructor ==
    /// Creates a stopped Janitor over the given tiers.
    ///
    /// # Arguments
    /// * `memory` - Shared memory tier
    /// * `disk` - Shared disk tier
    /// * `sweep_ttl` - TTL in seconds for the disk sweep
    /// * `interval` - Seconds between sweep iterations
    pub fn new(
        memory: Arc<RwLock<MemoryStore>>,
        disk: Arc<DiskStore>,
        sweep_ttl: u64,
        interval: u64,
    ) -> Self {
        Self {
            memory,
            disk,
            sweep_ttl,
            interval,
            state: StdMutex::new(None),
        }
    }

    // == Start ==
    /// Spawns the sweep loop. No-op if already running.
    pub fn start(&self) {
        let mut state = self.state.lock().expect("janitor state lock poisoned");
        if state.is_some() {
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let memory = Arc::clone(&self.memory);
        let disk = Arc::clone(&self.disk);
        let sweep_ttl = self.sweep_ttl;
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            run_sweep_loop(memory, disk, sweep_ttl, interval, stop_rx).await;
        });

        info!(interval_secs = interval, "janitor started");
        *state = Some(RunningState { stop_tx, handle });
    }

    // == Stop ==
    /// Signals the sweep loop to exit. No-op if already stopped.
    ///
    /// The loop finishes any sweep in progress before observing the signal.
    pub fn stop(&self) {
        let mut state = self.state.lock().expect("janitor state lock poisoned");
        if let Some(running) = state.take() {
            let _ = running.stop_tx.send(true);
            info!("janitor stop requested");
        }
    }

    // == Is Running ==
    /// Returns true if the sweep loop has been started and not stopped.
    pub fn is_running(&self) -> bool {
        self.state
            .lock()
            .expect("janitor state lock poisoned")
            .is_some()
    }
}

// == Sweep Loop ==
/// The long-lived loop: sweep memory, sweep disk, sleep, repeat until the
/// stop signal is observed.
async fn run_sweep_loop(
    memory: Arc<RwLock<MemoryStore>>,
    disk: Arc<DiskStore>,
    sweep_ttl: u64,
    interval: u64,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        if *stop_rx.borrow() {
            break;
        }

        let mut sweep_failed = false;

        // Memory sweep
        let removed = {
            let mut memory = memory.write().await;
            memory.cleanup_expired()
        };
        if removed > 0 {
            info!(removed, "janitor removed expired memory entries");
        } else {
            debug!("janitor found no expired memory entries");
        }

        // Disk sweep
        match disk.sweep_expired(sweep_ttl).await {
            Ok(removed) => {
                if removed > 0 {
                    info!(removed, "janitor removed expired cache files");
                } else {
                    debug!("janitor found no expired cache files");
                }
            }
            Err(e) => {
                warn!("janitor disk sweep failed: {e}");
                sweep_failed = true;
            }
        }

        // Shorter sleep after a failure; interruptible by the stop signal
        let sleep_secs = if sweep_failed {
            RETRY_INTERVAL_SECS.min(interval)
        } else {
            interval
        };
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(sleep_secs)) => {}
            _ = stop_rx.changed() => {}
        }
    }

    info!("janitor stopped");
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{derive, CacheKey, CallArgs};
    use tempfile::tempdir;

    fn key(tag: &str) -> CacheKey {
        derive("janitor_test", &CallArgs::new().arg(tag))
    }

    fn janitor_over(dir: &std::path::Path, sweep_ttl: u64, interval: u64) -> Janitor {
        let memory = Arc::new(RwLock::new(MemoryStore::new(100, 300)));
        let disk = Arc::new(DiskStore::new(dir.to_path_buf(), 1024 * 1024));
        Janitor::new(memory, disk, sweep_ttl, interval)
    }

    #[tokio::test]
    async fn test_janitor_removes_expired_entries() {
        let dir = tempdir().unwrap();
        let memory = Arc::new(RwLock::new(MemoryStore::new(100, 300)));
        let disk = Arc::new(DiskStore::new(dir.path().to_path_buf(), 1024 * 1024));
        disk.ensure_dir().await.unwrap();

        // Entries with a 1 second TTL in both tiers
        {
            let mut memory = memory.write().await;
            memory.set(key("expire_soon"), b"value".to_vec(), Some(1));
        }
        disk.set(&key("expire_soon"), b"value").await.unwrap();

        let janitor = Janitor::new(Arc::clone(&memory), Arc::clone(&disk), 1, 1);
        janitor.start();

        // Wait for the entries to expire and a sweep to run
        tokio::time::sleep(Duration::from_millis(2500)).await;

        {
            let memory = memory.read().await;
            assert!(
                !memory.contains_live(&key("expire_soon")),
                "Expired memory entry should have been swept"
            );
        }
        assert_eq!(
            disk.total_size().await.unwrap(),
            0,
            "Expired cache file should have been swept"
        );

        janitor.stop();
    }

    #[tokio::test]
    async fn test_janitor_preserves_valid_entries() {
        let dir = tempdir().unwrap();
        let memory = Arc::new(RwLock::new(MemoryStore::new(100, 300)));
        let disk = Arc::new(DiskStore::new(dir.path().to_path_buf(), 1024 * 1024));
        disk.ensure_dir().await.unwrap();

        {
            let mut memory = memory.write().await;
            memory.set(key("long_lived"), b"value".to_vec(), Some(3600));
        }
        disk.set(&key("long_lived"), b"value").await.unwrap();

        let janitor = Janitor::new(Arc::clone(&memory), Arc::clone(&disk), 3600, 1);
        janitor.start();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        {
            let mut memory = memory.write().await;
            assert_eq!(memory.get(&key("long_lived")), Some(b"value".to_vec()));
        }
        assert_eq!(
            disk.get(&key("long_lived"), 3600).await,
            Some(b"value".to_vec())
        );

        janitor.stop();
    }

    #[tokio::test]
    async fn test_janitor_start_is_idempotent() {
        let dir = tempdir().unwrap();
        let janitor = janitor_over(dir.path(), 3600, 3600);

        janitor.start();
        janitor.start();
        assert!(janitor.is_running());

        janitor.stop();
        assert!(!janitor.is_running());
    }

    #[tokio::test]
    async fn test_janitor_stop_when_stopped_is_noop() {
        let dir = tempdir().unwrap();
        let janitor = janitor_over(dir.path(), 3600, 3600);

        janitor.stop();
        assert!(!janitor.is_running());

        janitor.start();
        janitor.stop();
        janitor.stop();
        assert!(!janitor.is_running());
    }

    #[tokio::test]
    async fn test_janitor_survives_missing_directory() {
        let dir = tempdir().unwrap();
        // Point the disk tier at a directory that does not exist; the disk
        // sweep errors and the loop must keep running
        let missing = dir.path().join("never_created");
        let janitor = janitor_over(&missing, 1, 1);

        janitor.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(janitor.is_running());

        janitor.stop();
    }
}
