//! Background cache maintenance daemon.
//!
//! Periodically sweeps expired tiles and runs the size check, as an
//! amortized alternative to doing either on the write path. The per-write
//! probabilistic trigger still runs; the two compose.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::{eviction, sweeper};

/// Run the cache maintenance daemon.
///
/// Runs one pass immediately, then one per interval until cancelled.
/// Each pass sweeps expired tiles first, then checks the size budget;
/// both halves are best-effort and report through their result structs.
pub async fn run_maintenance_daemon(
    directory: PathBuf,
    max_size_bytes: u64,
    interval: Duration,
    cancellation: CancellationToken,
) {
    info!(
        directory = %directory.display(),
        max_size_bytes,
        interval_secs = interval.as_secs(),
        "Starting cache maintenance daemon"
    );

    maintenance_pass(&directory, max_size_bytes).await;

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => {
                info!("Cache maintenance daemon shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                maintenance_pass(&directory, max_size_bytes).await;
            }
        }
    }
}

async fn maintenance_pass(directory: &Path, max_size_bytes: u64) {
    let sweep = sweeper::clean_expired_tiles(directory).await;
    let eviction = eviction::evict_if_needed(directory, max_size_bytes).await;

    if sweep.files_deleted > 0 || eviction.files_deleted > 0 {
        info!(
            expired_deleted = sweep.files_deleted,
            evicted = eviction.files_deleted,
            bytes_freed = sweep.bytes_freed + eviction.bytes_freed,
            "Cache maintenance pass complete"
        );
    }
}
