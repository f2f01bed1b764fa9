//! Size-bounded cache eviction.
//!
//! When the cache tree grows past its configured budget, the oldest tiles
//! (by file mtime) are deleted first until the tree is back under a target
//! threshold. The policy is a global LRU approximation across all rasters
//! and zoom levels.
//!
//! Total size is never tracked as shared in-memory state; every pass
//! recomputes it by walking the tree, so external tampering or partial
//! writes cannot desynchronize the eviction decision from disk reality.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use tracing::{debug, info};

use crate::cache::path::is_tile_file;

/// Fraction of the size budget to evict down to (0.8 = 80%).
/// The 20% headroom prevents evict-then-immediately-over-again thrashing
/// once the cache first reaches its limit.
const EVICTION_TARGET_PERCENTAGE: f64 = 0.8;

/// Result of an eviction pass.
#[derive(Debug, Clone, Default)]
pub struct EvictionResult {
    /// Number of tiles deleted
    pub files_deleted: usize,
    /// Total bytes freed
    pub bytes_freed: u64,
    /// Cache size before eviction
    pub size_before: u64,
    /// Cache size after eviction
    pub size_after: u64,
    /// Duration of the pass in milliseconds
    pub duration_ms: u64,
}

/// Check cache size and evict oldest tiles if over budget.
///
/// Walks the tree to sum tile sizes; if the total is within
/// `max_size_bytes` this is a no-op. Otherwise tiles are deleted
/// oldest-mtime-first until the projected size is at or below 80% of the
/// budget. Individual delete failures are skipped, and empty directories
/// are pruned afterwards.
///
/// The walk runs on the blocking thread pool so concurrent tile requests
/// are not held up.
pub async fn evict_if_needed(root: &Path, max_size_bytes: u64) -> EvictionResult {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || evict_blocking(&root, max_size_bytes))
        .await
        .unwrap_or_default()
}

/// Current tile count and total size on disk.
///
/// Only files matching the tile naming pattern are counted.
pub async fn disk_usage(root: &Path) -> (u64, u64) {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || disk_usage_blocking(&root))
        .await
        .unwrap_or((0, 0))
}

pub(crate) fn disk_usage_blocking(root: &Path) -> (u64, u64) {
    let files = collect_tile_files(root);
    let bytes = files.iter().map(|(_, _, size)| size).sum();
    (files.len() as u64, bytes)
}

fn evict_blocking(root: &Path, max_size_bytes: u64) -> EvictionResult {
    let start = Instant::now();

    let (file_count, total_size) = disk_usage_blocking(root);

    if total_size <= max_size_bytes {
        debug!(
            size_bytes = total_size,
            limit_bytes = max_size_bytes,
            "Cache under limit, no eviction needed"
        );
        return EvictionResult {
            size_before: total_size,
            size_after: total_size,
            duration_ms: start.elapsed().as_millis() as u64,
            ..Default::default()
        };
    }

    let target_size = (max_size_bytes as f64 * EVICTION_TARGET_PERCENTAGE) as u64;

    info!(
        current_size_bytes = total_size,
        limit_bytes = max_size_bytes,
        target_bytes = target_size,
        file_count = file_count,
        "Cache over limit, starting eviction"
    );

    // Second walk collects mtimes for the LRU ordering
    let mut files = collect_tile_files(root);
    files.sort_by_key(|(_, mtime, _)| *mtime);

    let mut remaining_size = total_size;
    let mut bytes_freed = 0u64;
    let mut files_deleted = 0usize;

    for (path, _mtime, size) in files {
        if remaining_size <= target_size {
            break;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                bytes_freed += size;
                remaining_size = remaining_size.saturating_sub(size);
                files_deleted += 1;
            }
            Err(e) => {
                debug!(
                    path = %path.display(),
                    error = %e,
                    "Failed to delete tile during eviction"
                );
            }
        }
    }

    cleanup_empty_dirs(root);

    EvictionResult {
        files_deleted,
        bytes_freed,
        size_before: total_size,
        size_after: remaining_size,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Collect every tile file with its mtime and size.
fn collect_tile_files(root: &Path) -> Vec<(PathBuf, SystemTime, u64)> {
    let mut files = Vec::new();
    collect_recursive(root, &mut files);
    files
}

fn collect_recursive(dir: &Path, files: &mut Vec<(PathBuf, SystemTime, u64)>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(
                dir = %dir.display(),
                error = %e,
                "Failed to read directory during cache scan"
            );
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            collect_recursive(&path, files);
        } else if is_tile_file(&path) {
            if let Ok(metadata) = entry.metadata() {
                let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((path, mtime, metadata.len()));
            }
        }
    }
}

/// Remove empty directories left behind by tile deletion.
pub(crate) fn cleanup_empty_dirs(dir: &Path) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            // Recurse first so nested empty shells collapse bottom-up
            cleanup_empty_dirs(&path);
            // Fails silently if not empty
            let _ = std::fs::remove_dir(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::cache::path::tile_path;
    use crate::cache::types::TileKey;

    /// Write a tile of the given size whose mtime lies `age` in the past.
    fn write_aged_tile(root: &Path, key: TileKey, size: usize, age: Duration) {
        let path = tile_path(root, key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, vec![0u8; size]).unwrap();

        let mtime = SystemTime::now() - age;
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap();
        file.set_modified(mtime).unwrap();
    }

    #[tokio::test]
    async fn test_under_limit_is_noop() {
        let temp = TempDir::new().unwrap();
        write_aged_tile(temp.path(), TileKey::new(1, 12, 0, 0), 100, Duration::ZERO);

        let result = evict_if_needed(temp.path(), 10_000).await;

        assert_eq!(result.files_deleted, 0);
        assert_eq!(result.bytes_freed, 0);
        assert_eq!(result.size_before, 100);
        assert_eq!(result.size_after, 100);
    }

    #[tokio::test]
    async fn test_evicts_oldest_first_to_target() {
        let temp = TempDir::new().unwrap();
        // Three 1000-byte tiles, budget 2000: total 3000 is over, target is
        // 1600, so the two oldest must go.
        write_aged_tile(
            temp.path(),
            TileKey::new(1, 12, 0, 0),
            1000,
            Duration::from_secs(300),
        );
        write_aged_tile(
            temp.path(),
            TileKey::new(1, 12, 0, 1),
            1000,
            Duration::from_secs(200),
        );
        write_aged_tile(
            temp.path(),
            TileKey::new(1, 12, 0, 2),
            1000,
            Duration::from_secs(100),
        );

        let result = evict_if_needed(temp.path(), 2000).await;

        assert_eq!(result.files_deleted, 2);
        assert_eq!(result.bytes_freed, 2000);
        assert_eq!(result.size_after, 1000);

        // Only the newest tile survives
        assert!(!tile_path(temp.path(), TileKey::new(1, 12, 0, 0)).exists());
        assert!(!tile_path(temp.path(), TileKey::new(1, 12, 0, 1)).exists());
        assert!(tile_path(temp.path(), TileKey::new(1, 12, 0, 2)).exists());
    }

    #[tokio::test]
    async fn test_eviction_spans_rasters_globally() {
        let temp = TempDir::new().unwrap();
        // Oldest tile lives in raster 2; LRU ordering ignores raster bounds.
        write_aged_tile(
            temp.path(),
            TileKey::new(2, 12, 0, 0),
            1000,
            Duration::from_secs(500),
        );
        write_aged_tile(
            temp.path(),
            TileKey::new(1, 12, 0, 0),
            1000,
            Duration::from_secs(100),
        );

        let result = evict_if_needed(temp.path(), 1000).await;

        assert_eq!(result.files_deleted, 1);
        assert!(!tile_path(temp.path(), TileKey::new(2, 12, 0, 0)).exists());
        assert!(tile_path(temp.path(), TileKey::new(1, 12, 0, 0)).exists());
    }

    #[tokio::test]
    async fn test_non_tile_files_not_counted_or_deleted() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("notes.txt"), vec![0u8; 5000]).unwrap();
        write_aged_tile(temp.path(), TileKey::new(1, 12, 0, 0), 100, Duration::ZERO);

        let (count, bytes) = disk_usage(temp.path()).await;
        assert_eq!(count, 1);
        assert_eq!(bytes, 100);

        let result = evict_if_needed(temp.path(), 10_000).await;
        assert_eq!(result.files_deleted, 0);
        assert!(temp.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_empty_directories_pruned_after_eviction() {
        let temp = TempDir::new().unwrap();
        write_aged_tile(
            temp.path(),
            TileKey::new(1, 12, 0, 0),
            1000,
            Duration::from_secs(100),
        );

        // Budget zero forces everything out
        let result = evict_if_needed(temp.path(), 0).await;

        assert_eq!(result.files_deleted, 1);
        assert!(!temp.path().join("1").exists());
        // The cache root itself stays
        assert!(temp.path().exists());
    }

    #[tokio::test]
    async fn test_disk_usage_empty_root() {
        let temp = TempDir::new().unwrap();

        let (count, bytes) = disk_usage(temp.path()).await;

        assert_eq!(count, 0);
        assert_eq!(bytes, 0);
    }

    #[tokio::test]
    async fn test_disk_usage_missing_root() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let (count, bytes) = disk_usage(&missing).await;

        assert_eq!(count, 0);
        assert_eq!(bytes, 0);
    }
}
