//! Cache service lifecycle management.
//!
//! `CacheService` wraps a [`TileCache`] with startup and shutdown
//! coordination: the startup expiry sweep, the initial size check, and the
//! optional periodic maintenance daemon.
//!
//! # Usage
//!
//! ```ignore
//! use tilestore::cache::{CacheConfig, CacheService};
//!
//! let config = CacheConfig::default().with_maintenance_interval(300);
//! let service = CacheService::start(config).await;
//!
//! let cache = service.cache();
//! // share `cache` across request handlers...
//!
//! service.shutdown().await;
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::config::CacheConfig;
use crate::cache::daemon::run_maintenance_daemon;
use crate::cache::disk::TileCache;

/// A running tile cache with its background maintenance.
///
/// Shut down gracefully with [`shutdown`] so an in-flight maintenance
/// pass can finish; dropping the service without it just cancels the
/// daemon at the next await point.
///
/// [`shutdown`]: CacheService::shutdown
pub struct CacheService {
    cache: Arc<TileCache>,
    daemon: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl CacheService {
    /// Build the cache, run the startup maintenance, and spawn the
    /// periodic daemon when the config asks for one.
    pub async fn start(config: CacheConfig) -> Self {
        let interval = config.maintenance_interval();
        let cache = Arc::new(TileCache::new(config));
        let shutdown = CancellationToken::new();

        let daemon = if cache.is_enabled() {
            match interval {
                Some(interval) => {
                    // The daemon's initial pass covers startup maintenance
                    Some(tokio::spawn(run_maintenance_daemon(
                        cache.directory().to_path_buf(),
                        cache.max_size_bytes(),
                        interval,
                        shutdown.clone(),
                    )))
                }
                None => {
                    let sweep = cache.clean_expired_tiles().await;
                    let eviction = cache.evict_if_needed().await;
                    info!(
                        expired_deleted = sweep.files_deleted,
                        evicted = eviction.files_deleted,
                        "Tile cache started"
                    );
                    None
                }
            }
        } else {
            None
        };

        Self {
            cache,
            daemon,
            shutdown,
        }
    }

    /// Get a handle to the cache for sharing across tasks.
    pub fn cache(&self) -> Arc<TileCache> {
        Arc::clone(&self.cache)
    }

    /// Shutdown gracefully, waiting for the maintenance daemon to finish
    /// any in-progress pass.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(daemon) = self.daemon.take() {
            let _ = daemon.await;
        }
    }
}

impl Drop for CacheService {
    fn drop(&mut self) {
        // Stops the daemon even when shutdown() was never called
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    use crate::cache::path::tile_path;
    use crate::cache::types::TileKey;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let temp = TempDir::new().unwrap();
        let service = CacheService::start(CacheConfig::new(temp.path())).await;

        let cache = service.cache();
        cache.set(TileKey::new(1, 12, 0, 0), &[1, 2, 3]).await;
        assert_eq!(cache.get(TileKey::new(1, 12, 0, 0)).await, Some(vec![1, 2, 3]));

        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_startup_sweep_removes_expired_tiles() {
        let temp = TempDir::new().unwrap();
        let key = TileKey::new(1, 18, 0, 0);
        let path = tile_path(temp.path(), key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"png").unwrap();
        std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(6 * 60 * 60))
            .unwrap();

        let service = CacheService::start(CacheConfig::new(temp.path())).await;

        assert!(!path.exists());
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_service_with_daemon_shuts_down() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig::new(temp.path()).with_maintenance_interval(3600);

        let service = CacheService::start(config).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_disabled_service_starts_without_daemon() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig::new(temp.path())
            .with_enabled(false)
            .with_maintenance_interval(1);

        let service = CacheService::start(config).await;
        assert!(!service.cache().is_enabled());
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_shared_cache_handles() {
        let temp = TempDir::new().unwrap();
        let service = CacheService::start(CacheConfig::new(temp.path())).await;

        let cache1 = service.cache();
        let cache2 = service.cache();

        cache1.set(TileKey::new(1, 12, 0, 0), &[7]).await;
        assert_eq!(cache2.get(TileKey::new(1, 12, 0, 0)).await, Some(vec![7]));

        service.shutdown().await;
    }
}
