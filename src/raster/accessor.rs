use std::sync::Arc;

use super::descriptor::RasterDataDescriptor;
use super::dimension::DimensionDescriptor;
use super::error::PagerError;
use super::page::{RasterPage, RasterPager};
use super::request::DataRequest;

/// Walks a cube row by row, fetching and releasing pages as it goes.
///
/// The accessor is valid while it holds a page covering the current row.
/// Callers are expected to check [`is_valid`](DataAccessor::is_valid) before
/// every step; a failed fetch leaves the accessor invalid and keeps the error
/// for inspection.
pub struct DataAccessor {
    pager: Arc<dyn RasterPager>,
    descriptor: RasterDataDescriptor,
    request: DataRequest,
    row: DimensionDescriptor,
    column: DimensionDescriptor,
    band: DimensionDescriptor,
    stop_row: u32,
    page: Option<Box<dyn RasterPage>>,
    page_row: u32,
    row_stride: usize,
    row_len: usize,
    error: Option<PagerError>,
}

impl DataAccessor {
    /// An accessor positioned at row 0, column 0, band 0.
    pub fn new(
        pager: Arc<dyn RasterPager>,
        descriptor: RasterDataDescriptor,
        request: DataRequest,
    ) -> Self {
        Self::starting_at(
            pager,
            descriptor,
            request,
            DimensionDescriptor::new(0),
            DimensionDescriptor::new(0),
            DimensionDescriptor::new(0),
        )
    }

    pub fn starting_at(
        pager: Arc<dyn RasterPager>,
        descriptor: RasterDataDescriptor,
        request: DataRequest,
        row: DimensionDescriptor,
        column: DimensionDescriptor,
        band: DimensionDescriptor,
    ) -> Self {
        let stop_row = request.stop_row_in(descriptor.rows);
        let mut accessor = Self {
            pager,
            descriptor,
            request,
            row,
            column,
            band,
            stop_row,
            page: None,
            page_row: 0,
            row_stride: 0,
            row_len: 0,
            error: None,
        };
        accessor.fetch();
        accessor
    }

    pub fn is_valid(&self) -> bool {
        self.page.is_some()
    }

    /// The error that invalidated the accessor, if any.
    pub fn error(&self) -> Option<&PagerError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<PagerError> {
        self.error.take()
    }

    pub fn current_row(&self) -> DimensionDescriptor {
        self.row
    }

    /// Bytes of the current row, starting at the accessor's column and band.
    pub fn row(&self) -> Option<&[u8]> {
        let page = self.page.as_ref()?;
        let data = page.raw_data();
        let start = self.page_row as usize * self.row_stride;
        if start >= data.len() {
            return None;
        }
        let end = (start + self.row_len).min(data.len());
        Some(&data[start..end])
    }

    /// Moves to the next row, fetching a new page if the current one is used up.
    pub fn next_row(&mut self) {
        if self.page.is_none() {
            return;
        }
        self.row = self.row.offset_by(1);
        if self.row.active_number > self.stop_row {
            self.release();
            return;
        }
        self.page_row += 1;
        let available = self.page.as_ref().map(|p| p.num_rows().max(1)).unwrap_or(0);
        if self.page_row >= available {
            self.release();
            self.fetch();
        }
    }

    fn fetch(&mut self) {
        if self.row.active_number > self.stop_row || self.row.active_number >= self.descriptor.rows {
            return;
        }
        match self
            .pager
            .get_page(&self.request, self.row, self.column, self.band)
        {
            Ok(page) => {
                let interleave = self.request.interleave;
                let bpe = self.descriptor.bytes_per_element as u64;
                let (columns, bands, skipped) = match (page.num_columns(), page.num_bands()) {
                    // full-width page whose data begins at the start column and band
                    (0, 0) => {
                        let columns = self.descriptor.columns as u64;
                        let bands = self.descriptor.bands as u64;
                        let column = self.column.active_number as u64;
                        let band = self.band.active_number as u64;
                        let skipped = interleave.element_offset(0, column, band, columns, bands);
                        (columns, bands, skipped * bpe)
                    }
                    (columns, bands) => {
                        let columns = if columns == 0 { self.descriptor.columns } else { columns };
                        let bands = if bands == 0 { self.descriptor.bands } else { bands };
                        (columns as u64, bands as u64, 0)
                    }
                };
                let full_row = interleave.row_bytes(columns, bands, bpe);
                self.row_len = full_row.saturating_sub(skipped) as usize;
                self.row_stride = full_row as usize + page.interline_bytes() as usize;
                self.page_row = 0;
                self.page = Some(page);
            }
            Err(e) => {
                tracing::trace!(row = self.row.active_number, "page fetch failed: {}", e);
                self.error = Some(e);
            }
        }
    }

    fn release(&mut self) {
        if let Some(page) = self.page.take() {
            self.pager.release_page(page);
        }
    }
}

impl Drop for DataAccessor {
    fn drop(&mut self) {
        self.release();
    }
}
