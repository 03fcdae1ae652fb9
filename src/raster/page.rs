use super::dimension::DimensionDescriptor;
use super::error::Result;
use super::request::DataRequest;

/// A read-only view over one contiguous block of cube data.
///
/// `raw_data` starts at the element the page was requested for. A zero from
/// `num_columns` or `num_bands` means the page spans the full extent of the
/// cube's descriptor in that dimension.
pub trait RasterPage: Send + Sync {
    fn raw_data(&self) -> &[u8];

    /// Rows available from the first row of the page onward.
    fn num_rows(&self) -> u32;

    fn num_columns(&self) -> u32;

    fn num_bands(&self) -> u32;

    /// Padding bytes between the end of one row and the start of the next.
    fn interline_bytes(&self) -> u32;
}

/// Produces pages for a consumer.
///
/// Every page returned from [`get_page`](RasterPager::get_page) must be
/// handed back through [`release_page`](RasterPager::release_page) or
/// dropped; dropping releases whatever the page holds.
pub trait RasterPager: Send + Sync {
    fn get_page(
        &self,
        request: &DataRequest,
        start_row: DimensionDescriptor,
        start_column: DimensionDescriptor,
        start_band: DimensionDescriptor,
    ) -> Result<Box<dyn RasterPage>>;

    fn release_page(&self, page: Box<dyn RasterPage>) {
        drop(page);
    }
}
