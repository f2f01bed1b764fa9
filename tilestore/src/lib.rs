//! TileStore - disk-backed raster tile cache
//!
//! This library stores rendered map tiles (PNG images keyed by raster id and
//! tile coordinate) on local disk, serves them back on demand, expires them
//! by a zoom-dependent TTL, and evicts the oldest tiles when the cache grows
//! past its configured size budget.
//!
//! # High-Level API
//!
//! For most use cases, [`cache::CacheService`] wires everything together:
//!
//! ```ignore
//! use tilestore::cache::{CacheConfig, CacheService, TileKey};
//!
//! let config = CacheConfig::default().with_max_size_gb(8);
//! let service = CacheService::start(config).await;
//! let cache = service.cache();
//!
//! let key = TileKey::new(42, 12, 2150, 1375);
//! match cache.get(key).await {
//!     Some(png) => serve(png),
//!     None => {
//!         let png = render_tile(key).await?; // external renderer
//!         cache.set(key, &png).await;
//!         serve(png)
//!     }
//! }
//!
//! service.shutdown().await;
//! ```

pub mod cache;
pub mod config;
pub mod logging;

/// Version of the TileStore library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
