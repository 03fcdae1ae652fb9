use std::sync::Arc;

use bytes::BytesMut;

use crate::cache::BufferPool;
use crate::raster::{PagerError, RasterPage, Result};

/// A converted page's private buffer, returned to its pool on drop.
struct PageBuffer {
    data: Option<BytesMut>,
    rows: u32,
    columns: u32,
    bands: u32,
    bytes_per_element: u32,
    pool: Option<Arc<BufferPool>>,
}

impl PageBuffer {
    fn new(
        rows: u32,
        columns: u32,
        bands: u32,
        bytes_per_element: u32,
        pool: Option<&Arc<BufferPool>>,
    ) -> Result<Self> {
        let size = rows as u64 * columns as u64 * bands as u64 * bytes_per_element as u64;
        let size = usize::try_from(size)
            .ok()
            .filter(|&s| s <= isize::MAX as usize)
            .ok_or(PagerError::AllocationFailed(usize::MAX))?;
        let data = match pool {
            Some(pool) => pool.get(size),
            None => BytesMut::zeroed(size),
        };
        Ok(Self {
            data: Some(data),
            rows,
            columns,
            bands,
            bytes_per_element,
            pool: pool.cloned(),
        })
    }

    fn bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    fn line_bytes(&self) -> usize {
        self.columns as usize * self.bytes_per_element as usize
    }

    fn check_row(&self, row: u32) -> Result<()> {
        if row >= self.rows {
            return Err(PagerError::out_of_range("row", row, self.rows));
        }
        Ok(())
    }

    fn check_band(&self, band: u32) -> Result<()> {
        if band >= self.bands {
            return Err(PagerError::out_of_range("band", band, self.bands));
        }
        Ok(())
    }

    fn check_source(&self, data: &[u8], needed: usize) -> Result<()> {
        if data.len() < needed {
            return Err(PagerError::InvalidRequest(format!(
                "source row holds {} bytes, {} needed",
                data.len(),
                needed
            )));
        }
        Ok(())
    }
}

impl Drop for PageBuffer {
    fn drop(&mut self) {
        if let (Some(data), Some(pool)) = (self.data.take(), self.pool.as_ref()) {
            pool.put(data);
        }
    }
}

macro_rules! converted_page {
    ($name:ident) => {
        impl $name {
            pub fn rows(&self) -> u32 {
                self.buffer.rows
            }

            pub fn columns(&self) -> u32 {
                self.buffer.columns
            }

            pub fn bands(&self) -> u32 {
                self.buffer.bands
            }

            pub fn bytes_per_element(&self) -> u32 {
                self.buffer.bytes_per_element
            }
        }

        impl RasterPage for $name {
            fn raw_data(&self) -> &[u8] {
                self.buffer.bytes()
            }

            fn num_rows(&self) -> u32 {
                self.buffer.rows
            }

            fn num_columns(&self) -> u32 {
                self.buffer.columns
            }

            fn num_bands(&self) -> u32 {
                self.buffer.bands
            }

            fn interline_bytes(&self) -> u32 {
                0
            }
        }
    };
}

/// A BIP page assembled one band-row at a time.
pub struct ConvertToBipPage {
    buffer: PageBuffer,
}

impl ConvertToBipPage {
    pub fn new(rows: u32, columns: u32, bands: u32, bytes_per_element: u32) -> Result<Self> {
        Self::with_pool(rows, columns, bands, bytes_per_element, None)
    }

    pub(crate) fn with_pool(
        rows: u32,
        columns: u32,
        bands: u32,
        bytes_per_element: u32,
        pool: Option<&Arc<BufferPool>>,
    ) -> Result<Self> {
        Ok(Self {
            buffer: PageBuffer::new(rows, columns, bands, bytes_per_element, pool)?,
        })
    }

    /// Scatters one row of a single band into its interleaved positions.
    ///
    /// `data` holds `columns` contiguous elements of `band`.
    pub fn feed(&mut self, row: u32, band: u32, data: &[u8]) -> Result<()> {
        let b = &self.buffer;
        b.check_row(row)?;
        b.check_band(band)?;
        b.check_source(data, b.line_bytes())?;

        let bpe = b.bytes_per_element as usize;
        let bands = b.bands as usize;
        let columns = b.columns as usize;
        let row_start = row as usize * columns * bands;
        let dest = self.buffer.bytes_mut();
        for (column, element) in data.chunks_exact(bpe).take(columns).enumerate() {
            let at = (row_start + column * bands + band as usize) * bpe;
            dest[at..at + bpe].copy_from_slice(element);
        }
        Ok(())
    }
}

converted_page!(ConvertToBipPage);

/// A single-band BSQ page condensed from interleaved rows.
pub struct ConvertToBsqPage {
    buffer: PageBuffer,
}

impl ConvertToBsqPage {
    pub fn new(rows: u32, columns: u32, bytes_per_element: u32) -> Result<Self> {
        Self::with_pool(rows, columns, bytes_per_element, None)
    }

    pub(crate) fn with_pool(
        rows: u32,
        columns: u32,
        bytes_per_element: u32,
        pool: Option<&Arc<BufferPool>>,
    ) -> Result<Self> {
        Ok(Self {
            buffer: PageBuffer::new(rows, columns, 1, bytes_per_element, pool)?,
        })
    }

    /// Copies one row of the page's band out of an interleaved source row.
    ///
    /// `data` starts at the band's element for the first column and
    /// `skip_bytes` is the distance between consecutive columns: the element
    /// size for BIL sources, the pixel size for BIP sources.
    pub fn feed(&mut self, row: u32, skip_bytes: usize, data: &[u8]) -> Result<()> {
        let b = &self.buffer;
        b.check_row(row)?;

        let bpe = b.bytes_per_element as usize;
        let columns = b.columns as usize;
        let line = b.line_bytes();
        let start = row as usize * line;

        if skip_bytes == bpe {
            b.check_source(data, line)?;
            self.buffer.bytes_mut()[start..start + line].copy_from_slice(&data[..line]);
            return Ok(());
        }

        if skip_bytes < bpe {
            return Err(PagerError::InvalidRequest(format!(
                "column stride {} is smaller than an element",
                skip_bytes
            )));
        }
        let needed = if columns == 0 {
            0
        } else {
            (columns - 1) * skip_bytes + bpe
        };
        b.check_source(data, needed)?;
        let dest = &mut self.buffer.bytes_mut()[start..start + line];
        for (column, element) in dest.chunks_exact_mut(bpe).enumerate() {
            let at = column * skip_bytes;
            element.copy_from_slice(&data[at..at + bpe]);
        }
        Ok(())
    }
}

converted_page!(ConvertToBsqPage);

/// A BIL page assembled one band-row at a time.
pub struct ConvertToBilPage {
    buffer: PageBuffer,
}

impl ConvertToBilPage {
    pub fn new(rows: u32, columns: u32, bands: u32, bytes_per_element: u32) -> Result<Self> {
        Self::with_pool(rows, columns, bands, bytes_per_element, None)
    }

    pub(crate) fn with_pool(
        rows: u32,
        columns: u32,
        bands: u32,
        bytes_per_element: u32,
        pool: Option<&Arc<BufferPool>>,
    ) -> Result<Self> {
        Ok(Self {
            buffer: PageBuffer::new(rows, columns, bands, bytes_per_element, pool)?,
        })
    }

    /// Copies one row of a single band into its line of the page.
    pub fn feed(&mut self, row: u32, band: u32, data: &[u8]) -> Result<()> {
        let b = &self.buffer;
        b.check_row(row)?;
        b.check_band(band)?;
        let line = b.line_bytes();
        b.check_source(data, line)?;

        let start = (row as usize * b.bands as usize + band as usize) * line;
        self.buffer.bytes_mut()[start..start + line].copy_from_slice(&data[..line]);
        Ok(())
    }
}

converted_page!(ConvertToBilPage);
