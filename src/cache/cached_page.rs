use std::sync::Arc;

use super::unit::CacheUnit;
use crate::raster::{DimensionDescriptor, RasterPage};

/// A page that points into a shared [`CacheUnit`] without copying.
///
/// Holding the page keeps the unit alive even after the cache evicts it.
pub struct CachedPage {
    unit: Arc<CacheUnit>,
    offset: usize,
    start_row: DimensionDescriptor,
}

impl CachedPage {
    pub(crate) fn new(unit: Arc<CacheUnit>, offset: usize, start_row: DimensionDescriptor) -> Self {
        Self {
            unit,
            offset,
            start_row,
        }
    }

    pub fn unit(&self) -> &Arc<CacheUnit> {
        &self.unit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn start_row(&self) -> DimensionDescriptor {
        self.start_row
    }
}

impl RasterPage for CachedPage {
    fn raw_data(&self) -> &[u8] {
        &self.unit.data()[self.offset..]
    }

    fn num_rows(&self) -> u32 {
        let skipped = self.start_row.active_number - self.unit.start_row().active_number;
        self.unit.concurrent_rows().saturating_sub(skipped)
    }

    fn num_columns(&self) -> u32 {
        0
    }

    fn num_bands(&self) -> u32 {
        0
    }

    fn interline_bytes(&self) -> u32 {
        self.unit.interline_bytes()
    }
}
