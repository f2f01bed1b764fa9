//! Cache management CLI commands.

use std::io;
use std::path::Path;

use tilestore::cache::{clean_expired_tiles, disk_usage, evict_if_needed, CacheConfig, TileCache};
use tilestore::config::format_size;

/// Show tile count, on-disk size, and the configured budget.
pub async fn stats(directory: &Path, max_size_bytes: u64) -> io::Result<()> {
    ensure_exists(directory)?;

    let (files, bytes) = disk_usage(directory).await;

    println!("Tile cache: {}", directory.display());
    println!("  Tiles:  {}", files);
    println!("  Size:   {}", format_size(bytes));
    println!("  Budget: {}", format_size(max_size_bytes));
    Ok(())
}

/// Delete every cached tile.
pub async fn clear(directory: &Path) -> io::Result<()> {
    ensure_exists(directory)?;

    let (files, bytes) = disk_usage(directory).await;

    let cache = TileCache::new(CacheConfig::new(directory));
    cache.invalidate_all().await;

    println!(
        "Cleared {} tiles, freed {} from {}",
        files,
        format_size(bytes),
        directory.display()
    );
    Ok(())
}

/// Delete tiles already past their TTL.
pub async fn sweep(directory: &Path) -> io::Result<()> {
    ensure_exists(directory)?;

    let result = clean_expired_tiles(directory).await;

    println!(
        "Swept {} expired tiles, freed {} in {} ms",
        result.files_deleted,
        format_size(result.bytes_freed),
        result.duration_ms
    );
    Ok(())
}

/// Run an eviction pass against the given size budget.
pub async fn evict(directory: &Path, max_size_bytes: u64) -> io::Result<()> {
    ensure_exists(directory)?;

    let result = evict_if_needed(directory, max_size_bytes).await;

    if result.files_deleted == 0 {
        println!(
            "Cache is within budget ({} of {})",
            format_size(result.size_before),
            format_size(max_size_bytes)
        );
    } else {
        println!(
            "Evicted {} tiles, freed {} ({} -> {})",
            result.files_deleted,
            format_size(result.bytes_freed),
            format_size(result.size_before),
            format_size(result.size_after)
        );
    }
    Ok(())
}

fn ensure_exists(directory: &Path) -> io::Result<()> {
    if directory.is_dir() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("cache directory '{}' does not exist", directory.display()),
        ))
    }
}
