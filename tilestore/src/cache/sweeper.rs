//! Proactive expired-tile sweep.
//!
//! Expiry is normally lazy (detected on first read after the TTL elapses);
//! the sweeper runs at startup and on demand to clear tiles nobody has
//! asked for since they went stale, and to prune the empty directory
//! shells they leave behind.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info};

use crate::cache::ttl::{ttl_for, FALLBACK_TTL};

/// Result of an expiry sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    /// Number of expired files deleted
    pub files_deleted: usize,
    /// Total bytes freed
    pub bytes_freed: u64,
    /// Duration of the sweep in milliseconds
    pub duration_ms: u64,
}

/// Delete every tile already past its TTL and prune empty directories.
///
/// The walk is depth-first from the cache root: first-level directories are
/// raster ids, second-level are zoom levels, and the zoom directory's name
/// selects the TTL its files are aged against. Errors reading or removing
/// any single entry are logged and skipped; one bad entry never aborts the
/// sweep.
pub async fn clean_expired_tiles(root: &Path) -> SweepResult {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || sweep_blocking(&root))
        .await
        .unwrap_or_default()
}

fn sweep_blocking(root: &Path) -> SweepResult {
    let start = Instant::now();
    let now = SystemTime::now();
    let mut result = SweepResult::default();

    let rasters = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "Failed to read cache root for sweep");
            return result;
        }
    };

    for raster in rasters.flatten() {
        let raster_dir = raster.path();
        if !raster_dir.is_dir() {
            continue;
        }

        let zooms = match std::fs::read_dir(&raster_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %raster_dir.display(), error = %e, "Skipping unreadable raster directory");
                continue;
            }
        };

        for zoom in zooms.flatten() {
            let zoom_dir = zoom.path();
            if !zoom_dir.is_dir() {
                continue;
            }

            let ttl = zoom
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u8>().ok())
                .map(ttl_for)
                .unwrap_or(FALLBACK_TTL);

            sweep_directory(&zoom_dir, ttl, now, &mut result);
            let _ = std::fs::remove_dir(&zoom_dir);
        }

        let _ = std::fs::remove_dir(&raster_dir);
    }

    result.duration_ms = start.elapsed().as_millis() as u64;

    if result.files_deleted > 0 {
        info!(
            files_deleted = result.files_deleted,
            bytes_freed = result.bytes_freed,
            duration_ms = result.duration_ms,
            "Expired tile sweep complete"
        );
    }

    result
}

/// Delete expired files under one zoom directory, recursing into column
/// directories, then drop any directory left empty.
fn sweep_directory(dir: &Path, ttl: Duration, now: SystemTime, result: &mut SweepResult) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory during sweep");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            sweep_directory(&path, ttl, now, result);
            let _ = std::fs::remove_dir(&path);
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable file during sweep");
                continue;
            }
        };

        let expired = metadata
            .modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .is_some_and(|age| age > ttl);

        if expired {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    result.files_deleted += 1;
                    result.bytes_freed += metadata.len();
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Failed to delete expired tile");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::cache::path::tile_path;
    use crate::cache::types::TileKey;

    fn write_aged_tile(root: &Path, key: TileKey, age: Duration) {
        let path = tile_path(root, key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"png").unwrap();

        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_expired_tiles_removed_live_kept() {
        let temp = TempDir::new().unwrap();
        // Zoom 18 TTL is 4 hours
        let expired = TileKey::new(1, 18, 0, 0);
        let live = TileKey::new(1, 18, 0, 1);
        write_aged_tile(temp.path(), expired, Duration::from_secs(5 * 60 * 60));
        write_aged_tile(temp.path(), live, Duration::from_secs(60));

        let result = clean_expired_tiles(temp.path()).await;

        assert_eq!(result.files_deleted, 1);
        assert!(!tile_path(temp.path(), expired).exists());
        assert!(tile_path(temp.path(), live).exists());
    }

    #[tokio::test]
    async fn test_ttl_selected_per_zoom_directory() {
        let temp = TempDir::new().unwrap();
        let age = Duration::from_secs(5 * 60 * 60);
        // Five hours old: expired at zoom 18 (4h TTL), live at zoom 12 (24h TTL)
        let high_zoom = TileKey::new(1, 18, 0, 0);
        let mid_zoom = TileKey::new(1, 12, 0, 0);
        write_aged_tile(temp.path(), high_zoom, age);
        write_aged_tile(temp.path(), mid_zoom, age);

        clean_expired_tiles(temp.path()).await;

        assert!(!tile_path(temp.path(), high_zoom).exists());
        assert!(tile_path(temp.path(), mid_zoom).exists());
    }

    #[tokio::test]
    async fn test_empty_shells_pruned() {
        let temp = TempDir::new().unwrap();
        let key = TileKey::new(7, 18, 3, 4);
        write_aged_tile(temp.path(), key, Duration::from_secs(6 * 60 * 60));

        clean_expired_tiles(temp.path()).await;

        // Raster, zoom and column directories all collapse once empty
        assert!(!temp.path().join("7").exists());
        assert!(temp.path().exists());
    }

    #[tokio::test]
    async fn test_directories_with_live_tiles_survive() {
        let temp = TempDir::new().unwrap();
        let live = TileKey::new(7, 18, 3, 4);
        write_aged_tile(temp.path(), live, Duration::from_secs(60));

        clean_expired_tiles(temp.path()).await;

        assert!(tile_path(temp.path(), live).exists());
    }

    #[tokio::test]
    async fn test_missing_root_is_harmless() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let result = clean_expired_tiles(&missing).await;

        assert_eq!(result.files_deleted, 0);
    }

    #[tokio::test]
    async fn test_unparseable_zoom_directory_uses_fallback_ttl() {
        let temp = TempDir::new().unwrap();
        // A stray directory that doesn't parse as a zoom level: its files
        // age against the fallback 24-hour TTL.
        let odd_dir = temp.path().join("9").join("staging");
        std::fs::create_dir_all(&odd_dir).unwrap();
        let stale = odd_dir.join("1.png");
        std::fs::write(&stale, b"png").unwrap();
        std::fs::OpenOptions::new()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(25 * 60 * 60))
            .unwrap();

        let result = clean_expired_tiles(temp.path()).await;

        assert_eq!(result.files_deleted, 1);
        assert!(!stale.exists());
    }
}
