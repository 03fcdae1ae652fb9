use super::interleave::InterleaveFormat;

/// What a consumer wants from a pager.
///
/// Stop values are inclusive active numbers. A stop of `None` means "to the
/// end of the cube".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub interleave: InterleaveFormat,
    pub stop_row: Option<u32>,
    pub stop_column: Option<u32>,
    pub stop_band: Option<u32>,
    pub concurrent_rows: u32,
    pub concurrent_columns: Option<u32>,
    pub concurrent_bands: Option<u32>,
    pub writable: bool,
}

impl DataRequest {
    pub fn new(interleave: InterleaveFormat) -> Self {
        Self {
            interleave,
            stop_row: None,
            stop_column: None,
            stop_band: None,
            concurrent_rows: 1,
            concurrent_columns: None,
            concurrent_bands: None,
            writable: false,
        }
    }

    pub fn with_concurrent_rows(mut self, rows: u32) -> Self {
        self.concurrent_rows = rows.max(1);
        self
    }

    pub fn with_concurrent_columns(mut self, columns: u32) -> Self {
        self.concurrent_columns = Some(columns);
        self
    }

    pub fn with_concurrent_bands(mut self, bands: u32) -> Self {
        self.concurrent_bands = Some(bands);
        self
    }

    pub fn with_stop_row(mut self, row: u32) -> Self {
        self.stop_row = Some(row);
        self
    }

    pub fn with_stop_column(mut self, column: u32) -> Self {
        self.stop_column = Some(column);
        self
    }

    pub fn with_stop_band(mut self, band: u32) -> Self {
        self.stop_band = Some(band);
        self
    }

    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Inclusive stop row, resolved against a cube of `rows` rows.
    pub fn stop_row_in(&self, rows: u32) -> u32 {
        self.stop_row.unwrap_or(rows.saturating_sub(1))
    }

    pub fn stop_column_in(&self, columns: u32) -> u32 {
        self.stop_column.unwrap_or(columns.saturating_sub(1))
    }

    pub fn stop_band_in(&self, bands: u32) -> u32 {
        self.stop_band.unwrap_or(bands.saturating_sub(1))
    }

    /// Columns per row the consumer wants, starting at `start_column`.
    pub fn concurrent_columns_in(&self, start_column: u32, columns: u32) -> u32 {
        self.concurrent_columns
            .unwrap_or_else(|| columns.saturating_sub(start_column))
    }

    /// Bands the consumer wants, starting at `start_band`. BSQ is always one band.
    pub fn concurrent_bands_in(&self, start_band: u32, bands: u32) -> u32 {
        match self.interleave {
            InterleaveFormat::Bsq => self.concurrent_bands.unwrap_or(1),
            _ => self
                .concurrent_bands
                .unwrap_or_else(|| bands.saturating_sub(start_band)),
        }
    }
}

impl Default for DataRequest {
    fn default() -> Self {
        Self::new(InterleaveFormat::default())
    }
}
