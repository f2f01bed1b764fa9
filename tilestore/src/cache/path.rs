//! Cache path construction.
//!
//! Tiles are nested as `<root>/<raster_id>/<zoom>/<x>/<y>.png`. The nesting
//! bounds the number of files per directory and makes per-raster
//! invalidation a single recursive directory delete.

use std::path::{Path, PathBuf};

use crate::cache::types::TileKey;

/// Construct the full path for a cached tile.
///
/// The mapping is a pure function of its inputs; no two distinct keys
/// resolve to the same path.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use tilestore::cache::{tile_path, TileKey};
///
/// let root = PathBuf::from("/cache");
/// let key = TileKey::new(42, 15, 12754, 5279);
///
/// assert_eq!(tile_path(&root, key), PathBuf::from("/cache/42/15/12754/5279.png"));
/// ```
pub fn tile_path(root: &Path, key: TileKey) -> PathBuf {
    root.join(key.raster_id.to_string())
        .join(key.zoom.to_string())
        .join(key.x.to_string())
        .join(format!("{}.png", key.y))
}

/// Get the directory holding every tile for a raster.
///
/// Deleting this directory invalidates the whole raster.
pub fn raster_directory(root: &Path, raster_id: u64) -> PathBuf {
    root.join(raster_id.to_string())
}

/// Get the directory holding a raster's tiles at one zoom level.
pub fn zoom_directory(root: &Path, raster_id: u64, zoom: u8) -> PathBuf {
    root.join(raster_id.to_string()).join(zoom.to_string())
}

/// Whether a path looks like a tile file (`<y>.png` with a numeric stem).
///
/// Eviction and stats only count files matching this pattern, so stray
/// files dropped into the cache tree are never summed or deleted.
pub fn is_tile_file(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return false;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.parse::<u32>().is_ok())
}
