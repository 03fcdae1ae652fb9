use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use super::memory_budget::MemoryPermit;
use crate::raster::DimensionDescriptor;

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// Which bands a cache unit holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitBand {
    /// Every band of each row (BIP and BIL units).
    All,
    /// A single band plane (BSQ units).
    Band(u32),
}

/// One physically fetched block of cube rows.
///
/// The buffer is frozen before the unit is built, so once a unit is shared
/// through an `Arc` its contents can no longer change. A unit lives until
/// the cache and every page pointing into it have dropped their handles.
pub struct CacheUnit {
    id: u64,
    data: Bytes,
    start_row: DimensionDescriptor,
    concurrent_rows: u32,
    band: UnitBand,
    interline_bytes: u32,
    permit: Option<MemoryPermit>,
}

impl CacheUnit {
    pub fn new(
        data: Bytes,
        start_row: DimensionDescriptor,
        concurrent_rows: u32,
        band: UnitBand,
        interline_bytes: u32,
    ) -> Self {
        Self {
            id: NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed),
            data,
            start_row,
            concurrent_rows,
            band,
            interline_bytes,
            permit: None,
        }
    }

    /// Ties the unit's lifetime to a resident-memory charge.
    pub fn with_permit(mut self, permit: MemoryPermit) -> Self {
        self.permit = Some(permit);
        self
    }

    /// Whether `[start_row, start_row + concurrent_rows)` lies wholly inside
    /// this unit and `band` is the band it holds.
    ///
    /// Partial overlaps do not match.
    pub fn matches(&self, start_row: DimensionDescriptor, concurrent_rows: u32, band: UnitBand) -> bool {
        let requested = start_row.active_number as u64;
        let first = self.start_row.active_number as u64;
        requested >= first
            && band == self.band
            && requested + concurrent_rows as u64 <= first + self.concurrent_rows as u64
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn start_row(&self) -> DimensionDescriptor {
        self.start_row
    }

    pub fn concurrent_rows(&self) -> u32 {
        self.concurrent_rows
    }

    pub fn band(&self) -> UnitBand {
        self.band
    }

    pub fn interline_bytes(&self) -> u32 {
        self.interline_bytes
    }

    /// Bytes charged against the resident budget, if the unit carries a permit.
    pub fn charged_bytes(&self) -> usize {
        self.permit.as_ref().map(MemoryPermit::bytes).unwrap_or(0)
    }
}

impl std::fmt::Debug for CacheUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheUnit")
            .field("id", &self.id)
            .field("start_row", &self.start_row.active_number)
            .field("concurrent_rows", &self.concurrent_rows)
            .field("band", &self.band)
            .field("size", &self.data.len())
            .finish()
    }
}
