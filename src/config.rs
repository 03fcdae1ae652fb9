//! Pager configuration.

use crate::constants::{
    DEFAULT_BUFFER_POOL_DEPTH, DEFAULT_GEOTIFF_CACHE_BLOCKS, DEFAULT_MAX_CACHE_SIZE,
    DEFAULT_RESIDENT_FACTOR, DEFAULT_ROWS_PER_UNIT,
};

/// Tuning shared by every pager in the crate.
///
/// ```
/// use cubepage::config::PagerConfig;
///
/// let config = PagerConfig::default()
///     .with_max_cache_size(8 * 1024 * 1024)
///     .with_rows_per_unit(16);
/// assert_eq!(config.resident_limit(), 32 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerConfig {
    /// Byte budget of the page cache.
    pub max_cache_size: usize,
    /// Cap on live unit bytes, cached or not. `None` derives it from the cache budget.
    pub resident_limit: Option<usize>,
    /// Minimum rows read per cache miss.
    pub rows_per_unit: u32,
    /// Unit count of the GeoTIFF block cache.
    pub geotiff_cache_blocks: usize,
    /// Buffers kept by converting pagers.
    pub buffer_pool_depth: usize,
}

impl PagerConfig {
    pub fn with_max_cache_size(mut self, bytes: usize) -> Self {
        self.max_cache_size = bytes;
        self
    }

    pub fn with_resident_limit(mut self, bytes: usize) -> Self {
        self.resident_limit = Some(bytes);
        self
    }

    pub fn with_rows_per_unit(mut self, rows: u32) -> Self {
        self.rows_per_unit = rows.max(1);
        self
    }

    pub fn with_geotiff_cache_blocks(mut self, blocks: usize) -> Self {
        self.geotiff_cache_blocks = blocks.max(1);
        self
    }

    pub fn with_buffer_pool_depth(mut self, depth: usize) -> Self {
        self.buffer_pool_depth = depth;
        self
    }

    /// The effective resident byte limit.
    pub fn resident_limit(&self) -> usize {
        self.resident_limit
            .unwrap_or_else(|| self.max_cache_size.saturating_mul(DEFAULT_RESIDENT_FACTOR))
    }
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            resident_limit: None,
            rows_per_unit: DEFAULT_ROWS_PER_UNIT,
            geotiff_cache_blocks: DEFAULT_GEOTIFF_CACHE_BLOCKS,
            buffer_pool_depth: DEFAULT_BUFFER_POOL_DEPTH,
        }
    }
}
