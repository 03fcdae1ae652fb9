use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;

use super::in_memory::check_start;
use super::lease::LeaseCounter;
use crate::cache::{CacheUnit, MemoryBudget, PageCache, UnitBand};
use crate::config::PagerConfig;
use crate::raster::{
    ByteOrder, DataRequest, DimensionDescriptor, InterleaveFormat, PagerError,
    RasterDataDescriptor, RasterPage, RasterPager, Result,
};

/// Where the cube's elements sit inside a raw file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeFileLayout {
    pub descriptor: RasterDataDescriptor,
    /// Bytes before the first band or row.
    pub header_bytes: u64,
    /// Padding before each row.
    pub preline_bytes: u32,
    /// Padding after each row.
    pub postline_bytes: u32,
    /// Padding before each BSQ band plane.
    pub preband_bytes: u64,
    /// Padding after each BSQ band plane.
    pub postband_bytes: u64,
    pub byte_order: ByteOrder,
}

impl CubeFileLayout {
    pub fn new(descriptor: RasterDataDescriptor) -> Self {
        Self {
            descriptor,
            header_bytes: 0,
            preline_bytes: 0,
            postline_bytes: 0,
            preband_bytes: 0,
            postband_bytes: 0,
            byte_order: ByteOrder::native(),
        }
    }

    pub fn with_header_bytes(mut self, bytes: u64) -> Self {
        self.header_bytes = bytes;
        self
    }

    pub fn with_line_padding(mut self, preline: u32, postline: u32) -> Self {
        self.preline_bytes = preline;
        self.postline_bytes = postline;
        self
    }

    pub fn with_band_padding(mut self, preband: u64, postband: u64) -> Self {
        self.preband_bytes = preband;
        self.postband_bytes = postband;
        self
    }

    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    fn interline_bytes(&self) -> u32 {
        self.preline_bytes + self.postline_bytes
    }

    /// Bytes from the start of one stored row to the start of the next.
    fn line_bytes(&self) -> u64 {
        self.descriptor.row_bytes() + self.interline_bytes() as u64
    }

    /// File offset of the first element of `row` in `band`.
    fn row_offset(&self, row: u32, band: u32) -> u64 {
        let line = self.line_bytes();
        let rows_start = match self.descriptor.interleave {
            InterleaveFormat::Bsq => {
                let plane = self.preband_bytes
                    + self.descriptor.rows as u64 * line
                    + self.postband_bytes;
                self.header_bytes + band as u64 * plane + self.preband_bytes
            }
            InterleaveFormat::Bip | InterleaveFormat::Bil => self.header_bytes,
        };
        rows_start + row as u64 * line + self.preline_bytes as u64
    }

    fn needs_swap(&self) -> bool {
        self.descriptor.bytes_per_element > 1 && self.byte_order != ByteOrder::native()
    }
}

/// Serves pages from a raw BIP, BIL or BSQ cube file.
///
/// Each cache miss reads at least `rows_per_unit` rows (fewer at the end of
/// the cube) into a new [`CacheUnit`], or just the requested rows while the
/// resident budget is under pressure. BSQ units hold a single band. Files
/// stored in the other byte order are swapped as they are read, before the
/// unit becomes visible to anyone else.
pub struct CubeFilePager {
    path: PathBuf,
    layout: CubeFileLayout,
    file: Mutex<File>,
    cache: PageCache,
    budget: Arc<MemoryBudget>,
    rows_per_unit: u32,
    leases: LeaseCounter,
}

impl CubeFilePager {
    pub fn open(path: impl AsRef<Path>, layout: CubeFileLayout, config: PagerConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let d = &layout.descriptor;
        if d.is_empty() {
            return Err(PagerError::InvalidRequest("cube has no elements".to_string()));
        }

        let file = File::open(&path)?;
        let expected = layout.row_offset(d.rows - 1, d.bands - 1) + d.row_bytes();
        let actual = file.metadata()?.len();
        if actual < expected {
            return Err(PagerError::InvalidRequest(format!(
                "{} holds {} bytes, layout needs {}",
                path.display(),
                actual,
                expected
            )));
        }

        let cache = PageCache::new(config.max_cache_size);
        cache.initialize(d.bytes_per_element, d.columns, d.bands);
        tracing::debug!(
            path = %path.display(),
            interleave = %d.interleave,
            rows = d.rows,
            columns = d.columns,
            bands = d.bands,
            "opened cube file"
        );

        Ok(Self {
            path,
            file: Mutex::new(file),
            cache,
            budget: MemoryBudget::new(config.resident_limit()),
            rows_per_unit: config.rows_per_unit.max(1),
            leases: LeaseCounter::new(),
            layout,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &CubeFileLayout {
        &self.layout
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn budget(&self) -> &Arc<MemoryBudget> {
        &self.budget
    }

    /// Pages handed out and not yet released.
    pub fn outstanding_pages(&self) -> usize {
        self.leases.outstanding()
    }

    fn read_unit(
        &self,
        start_row: DimensionDescriptor,
        rows: u32,
        band: UnitBand,
        disk_band: u32,
    ) -> Result<CacheUnit> {
        let layout = &self.layout;
        let interline = layout.interline_bytes() as u64;
        let size = (rows as u64 * layout.line_bytes() - interline) as usize;

        let permit = self.budget.try_allocate(size).ok_or_else(|| {
            tracing::warn!(
                bytes = size,
                resident = self.budget.current_usage(),
                limit = self.budget.total_limit(),
                "resident budget exhausted"
            );
            PagerError::AllocationFailed(size)
        })?;

        let offset = layout.row_offset(start_row.on_disk_number, disk_band);
        let mut buf = BytesMut::zeroed(size);
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf).map_err(|e| {
                tracing::warn!(path = %self.path.display(), offset, size, "cube read failed: {}", e);
                e
            })?;
        }

        if layout.needs_swap() {
            swap_rows(
                &mut buf,
                layout.descriptor.bytes_per_element as usize,
                layout.descriptor.row_bytes() as usize,
                layout.line_bytes() as usize,
            );
        }

        tracing::debug!(
            start_row = start_row.active_number,
            rows,
            ?band,
            bytes = size,
            "read cube unit"
        );
        Ok(CacheUnit::new(buf.freeze(), start_row, rows, band, layout.interline_bytes())
            .with_permit(permit))
    }
}

impl RasterPager for CubeFilePager {
    fn get_page(
        &self,
        request: &DataRequest,
        start_row: DimensionDescriptor,
        start_column: DimensionDescriptor,
        start_band: DimensionDescriptor,
    ) -> Result<Box<dyn RasterPage>> {
        let d = &self.layout.descriptor;
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

        let remaining = d.rows - start_row.active_number;
        let wanted = request.concurrent_rows.clamp(1, remaining);
        let band = match d.interleave {
            InterleaveFormat::Bsq => UnitBand::Band(start_band.active_number),
            InterleaveFormat::Bip | InterleaveFormat::Bil => UnitBand::All,
        };

        let unit = match self.cache.find(start_row, wanted, band) {
            Some(unit) => unit,
            None => {
                let rows = if self.budget.is_under_pressure() {
                    tracing::debug!(
                        resident = self.budget.current_usage(),
                        limit = self.budget.total_limit(),
                        rows = wanted,
                        "resident budget under pressure, reading requested rows only"
                    );
                    wanted
                } else {
                    wanted.max(self.rows_per_unit).min(remaining)
                };
                Arc::new(self.read_unit(start_row, rows, band, start_band.on_disk_number)?)
            }
        };

        let page = self
            .cache
            .create_page(unit, d.interleave, start_row, start_column, start_band)?;
        Ok(Box::new(self.leases.lease(page)))
    }
}

/// Reverses the bytes of every element, skipping the padding between rows.
fn swap_rows(buf: &mut [u8], bytes_per_element: usize, row_bytes: usize, line_bytes: usize) {
    for line in buf.chunks_mut(line_bytes) {
        let len = row_bytes.min(line.len());
        for element in line[..len].chunks_exact_mut(bytes_per_element) {
            element.reverse();
        }
    }
}
