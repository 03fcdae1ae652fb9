use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;

/// Decoded strips or tiles covering a run of image rows, laid out row-major
/// across the full image width.
pub struct TiffBlockUnit {
    blocks: Vec<u32>,
    data: Bytes,
    first_row: u32,
    rows: u32,
}

impl TiffBlockUnit {
    pub fn new(blocks: Vec<u32>, data: Bytes, first_row: u32, rows: u32) -> Self {
        Self {
            blocks,
            data,
            first_row,
            rows,
        }
    }

    /// Chunk indices this unit was assembled from, in assembly order.
    pub fn blocks(&self) -> &[u32] {
        &self.blocks
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }
}

impl std::fmt::Debug for TiffBlockUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiffBlockUnit")
            .field("blocks", &self.blocks)
            .field("first_row", &self.first_row)
            .field("rows", &self.rows)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A small recency-ordered cache of assembled block units, keyed by their
/// exact block list.
///
/// Only units no page refers to are evicted. When every unit is in use the
/// cache grows past its capacity rather than dropping data a reader holds;
/// it shrinks back on later inserts once those pages are released.
pub struct TiffBlockCache {
    units: VecDeque<Arc<TiffBlockUnit>>,
    capacity: usize,
}

impl TiffBlockCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            units: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Finds the unit built from exactly `blocks` and marks it most recently used.
    pub fn get(&mut self, blocks: &[u32]) -> Option<Arc<TiffBlockUnit>> {
        let position = self.units.iter().position(|u| u.blocks() == blocks)?;
        let unit = self.units.remove(position)?;
        self.units.push_back(Arc::clone(&unit));
        Some(unit)
    }

    pub fn insert(&mut self, unit: Arc<TiffBlockUnit>) {
        if let Some(position) = self.units.iter().position(|u| u.blocks() == unit.blocks()) {
            self.units.remove(position);
        }
        while self.units.len() >= self.capacity {
            if !self.evict_unreferenced() {
                tracing::debug!(
                    units = self.units.len(),
                    capacity = self.capacity,
                    "every cached block unit is in use, growing"
                );
                break;
            }
        }
        self.units.push_back(unit);
    }

    /// Drops the least recently used unit nobody else holds.
    fn evict_unreferenced(&mut self) -> bool {
        let Some(position) = self.units.iter().position(|u| Arc::strong_count(u) == 1) else {
            return false;
        };
        if let Some(unit) = self.units.remove(position) {
            tracing::trace!(blocks = ?unit.blocks(), "evicted block unit");
        }
        true
    }

    /// Outstanding references to the unit built from `blocks`, excluding the cache's own.
    pub fn references(&self, blocks: &[u32]) -> Option<usize> {
        self.units
            .iter()
            .find(|u| u.blocks() == blocks)
            .map(|u| Arc::strong_count(u) - 1)
    }

    pub fn contains(&self, blocks: &[u32]) -> bool {
        self.units.iter().any(|u| u.blocks() == blocks)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.units.clear();
    }
}
