use std::sync::Arc;

use super::page::ConvertToBsqPage;
use super::source::{for_each_source_row, resolve_extent};
use crate::cache::BufferPool;
use crate::config::PagerConfig;
use crate::raster::{
    DataRequest, DimensionDescriptor, InterleaveFormat, PagerError, RasterDataDescriptor,
    RasterPage, RasterPager, Result,
};

/// Serves single-band BSQ pages from a BIP or BIL cube.
pub struct ConvertToBsqPager {
    source: Arc<dyn RasterPager>,
    descriptor: RasterDataDescriptor,
    pool: Arc<BufferPool>,
}

impl ConvertToBsqPager {
    pub fn new(source: Arc<dyn RasterPager>, descriptor: RasterDataDescriptor, config: &PagerConfig) -> Self {
        Self {
            source,
            descriptor,
            pool: BufferPool::new(config.buffer_pool_depth),
        }
    }

    pub fn descriptor(&self) -> &RasterDataDescriptor {
        &self.descriptor
    }
}

impl RasterPager for ConvertToBsqPager {
    fn get_page(
        &self,
        request: &DataRequest,
        start_row: DimensionDescriptor,
        start_column: DimensionDescriptor,
        start_band: DimensionDescriptor,
    ) -> Result<Box<dyn RasterPage>> {
        let d = &self.descriptor;
        if request.writable {
            return Err(PagerError::ReadOnly);
        }
        let unsupported = PagerError::UnsupportedInterleave {
            requested: request.interleave,
            native: d.interleave,
        };
        if request.interleave != InterleaveFormat::Bsq || d.interleave == InterleaveFormat::Bsq {
            return Err(unsupported);
        }

        let extent = resolve_extent(d, request, start_row, start_column, start_band)?;
        let mut page = ConvertToBsqPage::with_pool(
            extent.rows,
            extent.columns,
            d.bytes_per_element,
            Some(&self.pool),
        )?;
        let bpe = d.bytes_per_element as usize;
        let band = extent.start_band as usize;
        let column = extent.start_column as usize;

        let (first, skip_bytes) = match d.interleave {
            InterleaveFormat::Bip => {
                let pixel = d.bands as usize * bpe;
                (column * pixel + band * bpe, pixel)
            }
            InterleaveFormat::Bil => ((band * d.columns as usize + column) * bpe, bpe),
            InterleaveFormat::Bsq => return Err(unsupported),
        };
        for_each_source_row(&self.source, d, &extent, 0, |row, data| {
            page.feed(row, skip_bytes, &data[first..])
        })?;

        tracing::trace!(
            from = %d.interleave,
            start_row = start_row.active_number,
            band = extent.start_band,
            rows = extent.rows,
            "converted page to BSQ"
        );
        Ok(Box::new(page))
    }
}
