//! Disk-backed tile cache.
//!
//! One file per tile under `<root>/<raster_id>/<zoom>/<x>/<y>.png`, with
//! the filesystem's mtime as the expiry clock. Caching is strictly
//! best-effort: every failure degrades to a miss (on read) or a dropped
//! write, never to an error the caller has to handle.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::SystemTime;

use rand::Rng;
use tracing::{debug, error, warn};

use crate::cache::config::CacheConfig;
use crate::cache::eviction::{self, EvictionResult};
use crate::cache::path::{raster_directory, tile_path};
use crate::cache::stats::CacheStats;
use crate::cache::sweeper::{self, SweepResult};
use crate::cache::ttl::ttl_for;
use crate::cache::types::TileKey;

/// Probability that a successful write triggers a background size check.
/// Amortizes the cost of walking the whole tree instead of checking on
/// every write.
const EVICTION_CHECK_PROBABILITY: f64 = 0.01;

/// Disk-backed cache for rendered raster tiles.
///
/// Safe to share across concurrent tile requests: per-file operations are
/// isolated by the filesystem and the hit/miss counters are atomic. A
/// write racing a read on the same key may yield either old or new
/// content; a write racing a delete may fail with "not found" - both are
/// tolerated silently.
pub struct TileCache {
    /// Cache directory root
    directory: PathBuf,
    /// Maximum size in bytes
    max_size_bytes: u64,
    /// Cleared permanently if the cache root cannot be created
    enabled: AtomicBool,
    /// Cumulative hit count
    hits: AtomicU64,
    /// Cumulative miss count
    misses: AtomicU64,
}

impl TileCache {
    /// Create a tile cache from configuration.
    ///
    /// If the cache root cannot be created the cache disables itself for
    /// the remainder of the process instead of failing: caching is an
    /// optional performance layer and must never take the host service
    /// down.
    pub fn new(config: CacheConfig) -> Self {
        let enabled = if config.enabled {
            match std::fs::create_dir_all(&config.directory) {
                Ok(()) => true,
                Err(e) => {
                    error!(
                        directory = %config.directory.display(),
                        error = %e,
                        "Cannot create cache directory, disabling tile cache"
                    );
                    false
                }
            }
        } else {
            false
        };

        let max_size_bytes = config.max_size_bytes();
        Self {
            directory: config.directory,
            max_size_bytes,
            enabled: AtomicBool::new(enabled),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Whether caching is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// The configured cache root.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The configured size budget in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Get a cached tile.
    ///
    /// Returns `Some(bytes)` for a live cached tile, `None` otherwise.
    /// Absence, TTL expiry, and I/O failure all surface as a miss; the
    /// caller renders the tile itself and repopulates with [`set`].
    /// A tile found past its TTL is deleted on the way out (best effort).
    ///
    /// [`set`]: TileCache::set
    pub async fn get(&self, key: TileKey) -> Option<Vec<u8>> {
        if !self.is_enabled() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let path = tile_path(&self.directory, key);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|mtime| SystemTime::now().duration_since(mtime).ok());

        if age.is_some_and(|age| age > ttl_for(key.zoom)) {
            // Lazy expiry: drop the stale file on first access past TTL
            let _ = tokio::fs::remove_file(&path).await;
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        match tokio::fs::read(&path).await {
            Ok(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
            Err(e) => {
                // Lost a race with eviction or a sweep
                debug!(path = %path.display(), error = %e, "Tile read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a rendered tile.
    ///
    /// Write failures are logged and swallowed - the caller already has
    /// the tile bytes in hand and can still serve its response. With low
    /// probability (~1%) a successful write spawns a background size
    /// check, so eviction cost is amortized across writes.
    pub async fn set(&self, key: TileKey, data: &[u8]) {
        if !self.is_enabled() {
            return;
        }

        if data.is_empty() {
            debug!(?key, "Ignoring empty tile payload");
            return;
        }

        let path = tile_path(&self.directory, key);
        if let Err(e) = write_tile(&path, data).await {
            warn!(path = %path.display(), error = %e, "Failed to write tile to cache");
            return;
        }

        if rand::rng().random_bool(EVICTION_CHECK_PROBABILITY) {
            let directory = self.directory.clone();
            let max_size_bytes = self.max_size_bytes;
            tokio::spawn(async move {
                eviction::evict_if_needed(&directory, max_size_bytes).await;
            });
        }
    }

    /// Delete every cached tile for one raster.
    ///
    /// Used when the raster is replaced or deleted upstream. A raster
    /// with no cached tiles is not an error.
    pub async fn invalidate_raster(&self, raster_id: u64) {
        if !self.is_enabled() {
            return;
        }

        let dir = raster_directory(&self.directory, raster_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(raster_id, "Invalidated cached tiles for raster"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(raster_id, error = %e, "Failed to invalidate raster tiles"),
        }
    }

    /// Delete every cached tile and reset the hit/miss counters.
    pub async fn invalidate_all(&self) {
        if self.is_enabled() {
            match tokio::fs::read_dir(&self.directory).await {
                Ok(mut entries) => {
                    while let Ok(Some(entry)) = entries.next_entry().await {
                        let path = entry.path();
                        let removal = match entry.file_type().await {
                            Ok(t) if t.is_dir() => tokio::fs::remove_dir_all(&path).await,
                            Ok(_) => tokio::fs::remove_file(&path).await,
                            Err(e) => Err(e),
                        };
                        if let Err(e) = removal {
                            warn!(path = %path.display(), error = %e, "Failed to remove cache entry");
                        }
                    }
                }
                Err(e) => {
                    warn!(directory = %self.directory.display(), error = %e, "Failed to list cache root");
                }
            }
        }

        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Check cache size and evict oldest tiles if over budget.
    pub async fn evict_if_needed(&self) -> EvictionResult {
        if !self.is_enabled() {
            return EvictionResult::default();
        }
        eviction::evict_if_needed(&self.directory, self.max_size_bytes).await
    }

    /// Sweep out tiles already past their TTL.
    pub async fn clean_expired_tiles(&self) -> SweepResult {
        if !self.is_enabled() {
            return SweepResult::default();
        }
        sweeper::clean_expired_tiles(&self.directory).await
    }

    /// Snapshot current cache statistics.
    ///
    /// Size and count come from a full tree walk; a disabled cache
    /// reports them as zero but keeps its cumulative hit/miss counters.
    pub async fn stats(&self) -> CacheStats {
        let (tile_count, size_bytes) = if self.is_enabled() {
            eviction::disk_usage(&self.directory).await
        } else {
            (0, 0)
        };

        CacheStats {
            enabled: self.is_enabled(),
            directory: self.directory.clone(),
            size_bytes,
            max_size_bytes: self.max_size_bytes,
            tile_count,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Write tile bytes via a temp file so a reader never observes a partial
/// tile at the final path.
async fn write_tile(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, data).await?;
    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}
