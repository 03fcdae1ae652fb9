use std::sync::Arc;

use super::page::ConvertToBipPage;
use super::source::{for_each_source_row, resolve_extent};
use crate::cache::BufferPool;
use crate::config::PagerConfig;
use crate::raster::{
    DataRequest, DimensionDescriptor, InterleaveFormat, PagerError, RasterDataDescriptor,
    RasterPage, RasterPager, Result,
};

/// Serves BIP pages from a BSQ or BIL cube.
pub struct ConvertToBipPager {
    source: Arc<dyn RasterPager>,
    descriptor: RasterDataDescriptor,
    pool: Arc<BufferPool>,
}

impl ConvertToBipPager {
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

impl RasterPager for ConvertToBipPager {
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
        if request.interleave != InterleaveFormat::Bip || d.interleave == InterleaveFormat::Bip {
            return Err(unsupported);
        }

        let extent = resolve_extent(d, request, start_row, start_column, start_band)?;
        let mut page = ConvertToBipPage::with_pool(
            extent.rows,
            extent.columns,
            extent.bands,
            d.bytes_per_element,
            Some(&self.pool),
        )?;
        let bpe = d.bytes_per_element as usize;
        let line = extent.columns as usize * bpe;

        match d.interleave {
            InterleaveFormat::Bsq => {
                let first = extent.start_column as usize * bpe;
                for band in 0..extent.bands {
                    for_each_source_row(
                        &self.source,
                        d,
                        &extent,
                        extent.start_band + band,
                        |row, data| page.feed(row, band, &data[first..first + line]),
                    )?;
                }
            }
            InterleaveFormat::Bil => {
                let source_columns = d.columns as usize;
                for_each_source_row(&self.source, d, &extent, 0, |row, data| {
                    for band in 0..extent.bands {
                        let b = (extent.start_band + band) as usize;
                        let at = (b * source_columns + extent.start_column as usize) * bpe;
                        page.feed(row, band, &data[at..at + line])?;
                    }
                    Ok(())
                })?;
            }
            InterleaveFormat::Bip => return Err(unsupported),
        }

        tracing::trace!(
            from = %d.interleave,
            start_row = start_row.active_number,
            rows = extent.rows,
            "converted page to BIP"
        );
        Ok(Box::new(page))
    }
}
