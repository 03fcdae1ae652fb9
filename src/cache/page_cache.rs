use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::cached_page::CachedPage;
use super::unit::{CacheUnit, UnitBand};
use crate::raster::{DataRequest, DimensionDescriptor, InterleaveFormat, PagerError, Result};

#[derive(Debug, Clone, Copy)]
struct Geometry {
    bytes_per_element: u32,
    columns: u32,
    bands: u32,
}

struct Slot {
    unit: Arc<CacheUnit>,
    stamp: u64,
}

#[derive(Default)]
struct CacheState {
    geometry: Option<Geometry>,
    units: HashMap<u64, Slot>,
    /// Touch order, oldest first.
    recency: BTreeMap<u64, u64>,
    /// Units per band keyed by (first active row, id).
    by_band: HashMap<UnitBand, BTreeSet<(u32, u64)>>,
    next_stamp: u64,
    cache_size: usize,
}

impl CacheState {
    fn stamp(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    fn touch(&mut self, id: u64) {
        let stamp = self.stamp();
        if let Some(slot) = self.units.get_mut(&id) {
            self.recency.remove(&slot.stamp);
            slot.stamp = stamp;
            self.recency.insert(stamp, id);
        }
    }

    fn insert(&mut self, unit: Arc<CacheUnit>) {
        let id = unit.id();
        if self.units.contains_key(&id) {
            self.touch(id);
            return;
        }
        let stamp = self.stamp();
        self.cache_size += unit.size();
        self.by_band
            .entry(unit.band())
            .or_default()
            .insert((unit.start_row().active_number, id));
        self.recency.insert(stamp, id);
        self.units.insert(id, Slot { unit, stamp });
    }

    fn remove(&mut self, id: u64) -> Option<Arc<CacheUnit>> {
        let slot = self.units.remove(&id)?;
        self.recency.remove(&slot.stamp);
        let band = slot.unit.band();
        if let Some(rows) = self.by_band.get_mut(&band) {
            rows.remove(&(slot.unit.start_row().active_number, id));
            if rows.is_empty() {
                self.by_band.remove(&band);
            }
        }
        self.cache_size -= slot.unit.size();
        Some(slot.unit)
    }

    fn evict_oldest(&mut self) -> Option<Arc<CacheUnit>> {
        let (_, &id) = self.recency.first_key_value()?;
        self.remove(id)
    }

    fn find(&self, start_row: DimensionDescriptor, concurrent_rows: u32, band: UnitBand) -> Option<u64> {
        let rows = self.by_band.get(&band)?;
        rows.range(..=(start_row.active_number, u64::MAX))
            .rev()
            .map(|&(_, id)| id)
            .find(|id| {
                self.units
                    .get(id)
                    .is_some_and(|slot| slot.unit.matches(start_row, concurrent_rows, band))
            })
    }
}

/// Snapshot of a page cache's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub units: usize,
    pub cached_bytes: usize,
    pub max_bytes: usize,
}

/// A byte-bounded pool of recently fetched cube units for one raster.
///
/// Lookups that find a unit move it to the most recent end; inserts evict
/// from the least recent end until the cached bytes fit the budget again.
/// Eviction only drops the cache's handle, so units still referenced by
/// outstanding pages stay alive until those pages are released.
///
/// All bookkeeping sits behind one mutex. Unit buffers are immutable and
/// are read without locking.
pub struct PageCache {
    state: Mutex<CacheState>,
    max_cache_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PageCache {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_cache_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Sets the geometry used for offset arithmetic. Must be called before
    /// [`create_page`](PageCache::create_page). Clears the hit and miss counters.
    pub fn initialize(&self, bytes_per_element: u32, columns: u32, bands: u32) {
        self.state.lock().geometry = Some(Geometry {
            bytes_per_element,
            columns,
            bands,
        });
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Looks for a unit that fully contains the request's rows.
    ///
    /// BSQ requests must also match the band; other layouts store every
    /// band together so only the rows are compared. `None` is an ordinary
    /// miss and tells the caller to read the data itself.
    pub fn get_unit(
        &self,
        request: &DataRequest,
        start_row: DimensionDescriptor,
        start_band: DimensionDescriptor,
    ) -> Option<Arc<CacheUnit>> {
        let band = match request.interleave {
            InterleaveFormat::Bsq => UnitBand::Band(start_band.active_number),
            InterleaveFormat::Bip | InterleaveFormat::Bil => UnitBand::All,
        };
        self.find(start_row, request.concurrent_rows, band)
    }

    /// Like [`get_unit`](PageCache::get_unit) with an explicit row count and band.
    pub fn find(
        &self,
        start_row: DimensionDescriptor,
        concurrent_rows: u32,
        band: UnitBand,
    ) -> Option<Arc<CacheUnit>> {
        let mut state = self.state.lock();
        match state.find(start_row, concurrent_rows, band) {
            Some(id) => {
                state.touch(id);
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(row = start_row.active_number, ?band, "page cache hit");
                state.units.get(&id).map(|slot| Arc::clone(&slot.unit))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(row = start_row.active_number, ?band, "page cache miss");
                None
            }
        }
    }

    /// Publishes `unit` as the most recent entry and returns a page into it.
    ///
    /// The unit may be new or a previous hit. A new unit whose rows are
    /// already covered by a cached one is dropped in favour of the cached
    /// unit. After insertion the oldest units are evicted until the cache
    /// fits its budget. A rejected request leaves the cache untouched.
    pub fn create_page(
        &self,
        unit: Arc<CacheUnit>,
        format: InterleaveFormat,
        start_row: DimensionDescriptor,
        start_column: DimensionDescriptor,
        start_band: DimensionDescriptor,
    ) -> Result<CachedPage> {
        let mut state = self.state.lock();
        let geometry = state.geometry.ok_or(PagerError::NotInitialized)?;

        let unit = if state.units.contains_key(&unit.id()) {
            unit
        } else {
            match state.find(unit.start_row(), unit.concurrent_rows(), unit.band()) {
                Some(id) => {
                    tracing::debug!(
                        start_row = unit.start_row().active_number,
                        rows = unit.concurrent_rows(),
                        "rows already cached, dropping duplicate unit"
                    );
                    state
                        .units
                        .get(&id)
                        .map(|slot| Arc::clone(&slot.unit))
                        .unwrap_or(unit)
                }
                None => unit,
            }
        };

        let offset = page_offset(&unit, geometry, format, start_row, start_column, start_band)?;
        state.insert(Arc::clone(&unit));
        self.enforce_cache_size(&mut state);
        drop(state);
        Ok(CachedPage::new(unit, offset, start_row))
    }

    fn enforce_cache_size(&self, state: &mut CacheState) {
        while state.cache_size > self.max_cache_size {
            match state.evict_oldest() {
                Some(evicted) => {
                    tracing::debug!(
                        start_row = evicted.start_row().active_number,
                        rows = evicted.concurrent_rows(),
                        bytes = evicted.size(),
                        still_referenced = Arc::strong_count(&evicted) > 1,
                        "evicted cache unit"
                    );
                }
                None => break,
            }
        }
    }

    /// Drops the cache's handle to `unit`, if it holds one.
    pub fn remove(&self, unit: &CacheUnit) -> bool {
        self.state.lock().remove(unit.id()).is_some()
    }

    pub fn contains(&self, unit: &CacheUnit) -> bool {
        self.state.lock().units.contains_key(&unit.id())
    }

    pub fn len(&self) -> usize {
        self.state.lock().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes held by units currently in the cache.
    pub fn cache_size(&self) -> usize {
        self.state.lock().cache_size
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            units: state.units.len(),
            cached_bytes: state.cache_size,
            max_bytes: self.max_cache_size,
        }
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.units.clear();
        state.recency.clear();
        state.by_band.clear();
        state.cache_size = 0;
    }
}

/// Byte offset of the requested element inside `unit`.
fn page_offset(
    unit: &CacheUnit,
    geometry: Geometry,
    format: InterleaveFormat,
    start_row: DimensionDescriptor,
    start_column: DimensionDescriptor,
    start_band: DimensionDescriptor,
) -> Result<usize> {
    let first = unit.start_row().active_number as u64;
    let end = first + unit.concurrent_rows() as u64;
    let row = start_row.active_number as u64;
    if row < first || row >= end {
        return Err(PagerError::out_of_range("row", row, end));
    }

    let relative_row = row - first;
    let element = format.element_offset(
        relative_row,
        start_column.active_number as u64,
        start_band.active_number as u64,
        geometry.columns as u64,
        geometry.bands as u64,
    );
    let offset = element * geometry.bytes_per_element as u64
        + relative_row * unit.interline_bytes() as u64;
    if offset >= unit.size() as u64 {
        return Err(PagerError::out_of_range("offset", offset, unit.size() as u64));
    }
    Ok(offset as usize)
}
