//! Cache sizing and paging defaults.
//!
//! These are the values a [`PagerConfig`](crate::config::PagerConfig) starts
//! from. They favour a few large units over many small ones, since a unit
//! miss costs a seek plus a full read.

// ============================================================================
// Page cache
// ============================================================================

/// Default byte budget of one page cache (one open raster).
pub const DEFAULT_MAX_CACHE_SIZE: usize = 64 * 1024 * 1024;

/// Resident memory limit as a multiple of the cache budget.
///
/// Units evicted from a cache stay alive while pages still point into them,
/// so live memory can exceed the cache budget. This bounds by how much.
pub const DEFAULT_RESIDENT_FACTOR: usize = 4;

/// Minimum rows read into a unit on a cache miss.
pub const DEFAULT_ROWS_PER_UNIT: u32 = 64;

// ============================================================================
// GeoTIFF block cache
// ============================================================================

/// Default number of strip/tile units kept by the GeoTIFF block cache.
pub const DEFAULT_GEOTIFF_CACHE_BLOCKS: usize = 8;

// ============================================================================
// Converted page buffers
// ============================================================================

/// Buffers kept for reuse by converting pagers.
pub const DEFAULT_BUFFER_POOL_DEPTH: usize = 16;

/// Buffers larger than this are not returned to the pool.
pub const MAX_POOLED_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Fraction of a budget above which it reports pressure.
pub const PRESSURE_RATIO: f32 = 0.9;
