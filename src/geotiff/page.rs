use std::sync::Arc;

use super::block_cache::TiffBlockUnit;
use crate::raster::RasterPage;

/// A page pointing into an assembled block unit.
///
/// Rows are always full image width; columns and bands report the full
/// extent.
pub struct GeoTiffPage {
    unit: Arc<TiffBlockUnit>,
    offset: usize,
    rows: u32,
}

impl GeoTiffPage {
    pub(crate) fn new(unit: Arc<TiffBlockUnit>, offset: usize, rows: u32) -> Self {
        Self { unit, offset, rows }
    }

    pub fn unit(&self) -> &Arc<TiffBlockUnit> {
        &self.unit
    }
}

impl RasterPage for GeoTiffPage {
    fn raw_data(&self) -> &[u8] {
        self.unit.data().get(self.offset..).unwrap_or(&[])
    }

    fn num_rows(&self) -> u32 {
        self.rows
    }

    fn num_columns(&self) -> u32 {
        0
    }

    fn num_bands(&self) -> u32 {
        0
    }

    fn interline_bytes(&self) -> u32 {
        0
    }
}
