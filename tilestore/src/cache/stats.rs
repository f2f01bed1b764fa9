//! Cache statistics reporting.

use std::path::PathBuf;

use crate::config::format_size;

/// Snapshot of cache state for observability.
///
/// Size and count are recomputed from disk at snapshot time rather than
/// maintained incrementally; hit/miss counters are cumulative for the
/// process lifetime and reset only by a full cache clear.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Whether caching is enabled
    pub enabled: bool,
    /// Configured cache root
    pub directory: PathBuf,
    /// Total size of cached tiles on disk, in bytes
    pub size_bytes: u64,
    /// Configured maximum size, in bytes
    pub max_size_bytes: u64,
    /// Number of cached tiles on disk
    pub tile_count: u64,
    /// Cumulative hit count
    pub hits: u64,
    /// Cumulative miss count
    pub misses: u64,
}

impl CacheStats {
    /// Cache hit rate (0.0 to 1.0), zero when no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Format statistics as a human-readable report.
    pub fn format(&self) -> String {
        format!(
            r#"Tile cache: {}
  Enabled:  {}
  Tiles:    {}
  Size:     {} / {}
  Hits:     {}
  Misses:   {}
  Hit rate: {:.1}%
"#,
            self.directory.display(),
            self.enabled,
            self.tile_count,
            format_size(self.size_bytes),
            format_size(self.max_size_bytes),
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
        )
    }
}
