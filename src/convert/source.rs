use std::sync::Arc;

use crate::raster::{
    DataAccessor, DataRequest, DimensionDescriptor, InterleaveFormat, PagerError,
    RasterDataDescriptor, RasterPager, Result,
};

/// The block a converting pager has to produce for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Extent {
    pub start_row: DimensionDescriptor,
    pub start_column: u32,
    pub start_band: u32,
    pub rows: u32,
    pub columns: u32,
    pub bands: u32,
}

fn span(what: &'static str, start: u32, stop: u32, extent: u32) -> Result<u32> {
    if start >= extent {
        return Err(PagerError::out_of_range(what, start, extent));
    }
    if stop >= extent || stop < start {
        return Err(PagerError::out_of_range(what, stop, extent));
    }
    Ok(stop - start + 1)
}

/// Resolves the request against the cube. BSQ targets always cover one band.
pub(crate) fn resolve_extent(
    descriptor: &RasterDataDescriptor,
    request: &DataRequest,
    start_row: DimensionDescriptor,
    start_column: DimensionDescriptor,
    start_band: DimensionDescriptor,
) -> Result<Extent> {
    let d = descriptor;
    let row = start_row.active_number;
    let column = start_column.active_number;
    let band = start_band.active_number;

    let rows = span("row", row, request.stop_row_in(d.rows), d.rows)?;
    let columns = span("column", column, request.stop_column_in(d.columns), d.columns)?;
    let bands = match request.interleave {
        InterleaveFormat::Bsq => span("band", band, band, d.bands)?,
        InterleaveFormat::Bip | InterleaveFormat::Bil => {
            span("band", band, request.stop_band_in(d.bands), d.bands)?
        }
    };

    Ok(Extent {
        start_row,
        start_column: column,
        start_band: band,
        rows: rows.min(request.concurrent_rows.max(1)),
        columns,
        bands,
    })
}

/// Reads `extent.rows` native rows from `source`, starting at column 0.
///
/// For BSQ sources `band` selects the plane; other layouts read every band.
/// `f` gets the row index within the extent and the full native row.
pub(crate) fn for_each_source_row(
    source: &Arc<dyn RasterPager>,
    descriptor: &RasterDataDescriptor,
    extent: &Extent,
    band: u32,
    mut f: impl FnMut(u32, &[u8]) -> Result<()>,
) -> Result<()> {
    let mut request = DataRequest::new(descriptor.interleave)
        .with_concurrent_rows(extent.rows)
        .with_stop_row(extent.start_row.active_number + extent.rows - 1);
    let start_band = match descriptor.interleave {
        InterleaveFormat::Bsq => {
            request = request.with_concurrent_bands(1);
            band
        }
        InterleaveFormat::Bip | InterleaveFormat::Bil => 0,
    };

    let mut accessor = DataAccessor::starting_at(
        Arc::clone(source),
        descriptor.clone(),
        request,
        extent.start_row,
        DimensionDescriptor::new(0),
        DimensionDescriptor::new(start_band),
    );
    let row_bytes = descriptor.row_bytes() as usize;
    for row in 0..extent.rows {
        let data = match accessor.row() {
            Some(data) if data.len() >= row_bytes => data,
            Some(_) => {
                return Err(PagerError::InvalidRequest(
                    "source page ended mid-row".to_string(),
                ))
            }
            None => {
                return Err(accessor.take_error().unwrap_or_else(|| {
                    PagerError::InvalidRequest("source rows exhausted".to_string())
                }))
            }
        };
        f(row, &data[..row_bytes])?;
        accessor.next_row();
    }
    Ok(())
}
