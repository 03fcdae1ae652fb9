use std::sync::Arc;

use super::page::ConvertToBilPage;
use super::source::{for_each_source_row, resolve_extent};
use crate::cache::BufferPool;
use crate::config::PagerConfig;
use crate::raster::{
    DataRequest, DimensionDescriptor, InterleaveFormat, PagerError, RasterDataDescriptor,
    RasterPage, RasterPager, Result,
};

/// Serves BIL pages from a BIP or BSQ cube.
pub struct ConvertToBilPager {
    source: Arc<dyn RasterPager>,
    descriptor: RasterDataDescriptor,
    pool: Arc<BufferPool>,
}

impl ConvertToBilPager {
    /// `descriptor` describes the cube as `source` serves it.
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

impl RasterPager for ConvertToBilPager {
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
        if request.interleave != InterleaveFormat::Bil || d.interleave == InterleaveFormat::Bil {
            return Err(unsupported);
        }

        let extent = resolve_extent(d, request, start_row, start_column, start_band)?;
        let mut page = ConvertToBilPage::with_pool(
            extent.rows,
            extent.columns,
            extent.bands,
            d.bytes_per_element,
            Some(&self.pool),
        )?;
        let bpe = d.bytes_per_element as usize;
        let first = extent.start_column as usize * bpe;
        let line = extent.columns as usize * bpe;

        match d.interleave {
            InterleaveFormat::Bsq => {
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
            InterleaveFormat::Bip => {
                let source_bands = d.bands as usize;
                let mut scratch = vec![0u8; line];
                for_each_source_row(&self.source, d, &extent, 0, |row, data| {
                    for band in 0..extent.bands {
                        let b = (extent.start_band + band) as usize;
                        for (column, dest) in scratch.chunks_exact_mut(bpe).enumerate() {
                            let c = extent.start_column as usize + column;
                            let at = (c * source_bands + b) * bpe;
                            dest.copy_from_slice(&data[at..at + bpe]);
                        }
                        page.feed(row, band, &scratch)?;
                    }
                    Ok(())
                })?;
            }
            InterleaveFormat::Bil => return Err(unsupported),
        }

        tracing::trace!(
            from = %d.interleave,
            start_row = start_row.active_number,
            rows = extent.rows,
            "converted page to BIL"
        );
        Ok(Box::new(page))
    }
}
