use bytes::Bytes;

use crate::raster::{
    DataRequest, DimensionDescriptor, InterleaveFormat, PagerError, RasterDataDescriptor,
    RasterPage, RasterPager, Result,
};

/// A page sliced out of an in-memory cube.
pub struct InMemoryPage {
    data: Bytes,
    rows: u32,
}

impl RasterPage for InMemoryPage {
    fn raw_data(&self) -> &[u8] {
        &self.data
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

/// Serves pages from a whole cube held in one buffer.
pub struct InMemoryPager {
    descriptor: RasterDataDescriptor,
    data: Bytes,
}

impl InMemoryPager {
    pub fn new(descriptor: RasterDataDescriptor, data: Bytes) -> Result<Self> {
        let needed = descriptor.total_bytes();
        if (data.len() as u64) < needed {
            return Err(PagerError::InvalidRequest(format!(
                "cube needs {} bytes but buffer holds {}",
                needed,
                data.len()
            )));
        }
        Ok(Self { descriptor, data })
    }

    pub fn descriptor(&self) -> &RasterDataDescriptor {
        &self.descriptor
    }
}

impl RasterPager for InMemoryPager {
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
        if request.interleave != d.interleave {
            return Err(PagerError::UnsupportedInterleave {
                requested: request.interleave,
                native: d.interleave,
            });
        }
        check_start(d, start_row, start_column, start_band)?;

        let (row, column, band) = (
            start_row.active_number as u64,
            start_column.active_number as u64,
            start_band.active_number as u64,
        );
        let (rows, columns, bands) = (d.rows as u64, d.columns as u64, d.bands as u64);
        let bpe = d.bytes_per_element as u64;

        let (start, end) = match d.interleave {
            InterleaveFormat::Bsq => {
                let plane = rows * columns;
                (
                    band * plane + row * columns + column,
                    (band + 1) * plane,
                )
            }
            format => (
                format.element_offset(row, column, band, columns, bands),
                rows * columns * bands,
            ),
        };

        Ok(Box::new(InMemoryPage {
            data: self.data.slice((start * bpe) as usize..(end * bpe) as usize),
            rows: d.rows - start_row.active_number,
        }))
    }
}

pub(crate) fn check_start(
    d: &RasterDataDescriptor,
    start_row: DimensionDescriptor,
    start_column: DimensionDescriptor,
    start_band: DimensionDescriptor,
) -> Result<()> {
    if start_row.active_number >= d.rows {
        return Err(PagerError::out_of_range("row", start_row.active_number, d.rows));
    }
    if start_column.active_number >= d.columns {
        return Err(PagerError::out_of_range(
            "column",
            start_column.active_number,
            d.columns,
        ));
    }
    if start_band.active_number >= d.bands {
        return Err(PagerError::out_of_range("band", start_band.active_number, d.bands));
    }
    Ok(())
}
