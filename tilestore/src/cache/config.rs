//! Tile cache configuration.

use std::path::PathBuf;
use std::time::Duration;

const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Tile cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether caching is enabled. When false, every operation is a
    /// no-op/always-miss.
    pub enabled: bool,
    /// Cache directory root. Created recursively if absent.
    pub directory: PathBuf,
    /// Maximum cache size in gigabytes (default: 8 GB).
    pub max_size_gb: u64,
    /// Interval between periodic maintenance passes (sweep + eviction
    /// check). Zero disables the daemon; the probabilistic per-write
    /// trigger still runs.
    pub maintenance_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let directory = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tilestore");

        Self {
            enabled: true,
            directory,
            max_size_gb: 8,
            maintenance_interval_secs: 0,
        }
    }
}

impl CacheConfig {
    /// Create a configuration rooted at the given directory.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// Enable or disable caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the cache directory.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set the maximum cache size in gigabytes.
    pub fn with_max_size_gb(mut self, gb: u64) -> Self {
        self.max_size_gb = gb;
        self
    }

    /// Set the periodic maintenance interval in seconds (0 = disabled).
    pub fn with_maintenance_interval(mut self, secs: u64) -> Self {
        self.maintenance_interval_secs = secs;
        self
    }

    /// Maximum cache size in bytes, for size comparisons.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_gb * BYTES_PER_GB
    }

    /// Maintenance interval as a `Duration`, `None` when the daemon is
    /// disabled.
    pub fn maintenance_interval(&self) -> Option<Duration> {
        (self.maintenance_interval_secs > 0)
            .then(|| Duration::from_secs(self.maintenance_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();

        assert!(config.enabled);
        assert_eq!(config.max_size_gb, 8);
        assert_eq!(config.maintenance_interval_secs, 0);
        assert!(config.directory.ends_with("tilestore"));
    }

    #[test]
    fn test_max_size_bytes_conversion() {
        let config = CacheConfig::default().with_max_size_gb(2);

        assert_eq!(config.max_size_bytes(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new("/tmp/tiles")
            .with_enabled(false)
            .with_max_size_gb(16)
            .with_maintenance_interval(300);

        assert!(!config.enabled);
        assert_eq!(config.directory, PathBuf::from("/tmp/tiles"));
        assert_eq!(config.max_size_gb, 16);
        assert_eq!(
            config.maintenance_interval(),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_zero_interval_disables_daemon() {
        let config = CacheConfig::default();

        assert_eq!(config.maintenance_interval(), None);
    }
}
