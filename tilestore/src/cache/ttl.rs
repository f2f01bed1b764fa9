//! Zoom-dependent time-to-live policy.
//!
//! Coarse tiles (continent and region overviews) change rarely and are
//! requested often, so they live longest; high-zoom detail tiles are the
//! most volatile and expire first.

use std::time::Duration;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// Fallback TTL for zoom levels outside the table (the zoom-14 class).
pub(crate) const FALLBACK_TTL: Duration = Duration::from_secs(DAY);

/// Look up the time-to-live for a zoom level.
///
/// Every zoom level resolves to some duration; levels above 22 fall back
/// to the zoom-14 class (24 hours).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tilestore::cache::ttl_for;
///
/// assert_eq!(ttl_for(3), Duration::from_secs(7 * 24 * 60 * 60));
/// assert_eq!(ttl_for(12), Duration::from_secs(24 * 60 * 60));
/// ```
pub fn ttl_for(zoom: u8) -> Duration {
    match zoom {
        0..=6 => Duration::from_secs(7 * DAY),
        7..=10 => Duration::from_secs(3 * DAY),
        11..=14 => Duration::from_secs(DAY),
        15..=17 => Duration::from_secs(12 * HOUR),
        18..=22 => Duration::from_secs(4 * HOUR),
        _ => FALLBACK_TTL,
    }
}

/// TTL for a zoom level in whole seconds.
///
/// Intended for HTTP `Cache-Control: max-age` headers set by the caller.
pub fn ttl_seconds(zoom: u8) -> u64 {
    ttl_for(zoom).as_secs()
}
