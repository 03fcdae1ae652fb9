use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::constants::PRESSURE_RATIO;

/// Counts the bytes held by live cache units against a fixed limit.
///
/// A page cache only accounts for the units in its own list. Units it has
/// evicted stay alive while pages point into them, so the budget is charged
/// when a unit buffer is allocated and credited when the last holder drops
/// it, not when the cache lets go.
pub struct MemoryBudget {
    total_limit: usize,
    current_usage: AtomicUsize,
}

impl MemoryBudget {
    pub fn new(total_limit: usize) -> Arc<Self> {
        Arc::new(Self {
            total_limit,
            current_usage: AtomicUsize::new(0),
        })
    }

    pub fn try_allocate(self: &Arc<Self>, bytes: usize) -> Option<MemoryPermit> {
        let mut current = self.current_usage.load(Ordering::Relaxed);
        loop {
            let next = current
                .checked_add(bytes)
                .filter(|&next| next <= self.total_limit)?;
            match self.current_usage.compare_exchange_weak(
                current,
                next,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return Some(MemoryPermit {
                        budget: Arc::clone(self),
                        bytes,
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self, bytes: usize) {
        self.current_usage.fetch_sub(bytes, Ordering::SeqCst);
    }

    pub fn current_usage(&self) -> usize {
        self.current_usage.load(Ordering::Relaxed)
    }

    pub fn total_limit(&self) -> usize {
        self.total_limit
    }

    /// Whether usage is past [`PRESSURE_RATIO`] of the limit.
    pub fn is_under_pressure(&self) -> bool {
        let usage = self.current_usage.load(Ordering::Relaxed);
        usage > (self.total_limit as f32 * PRESSURE_RATIO) as usize
    }
}

/// A charge against a [`MemoryBudget`], returned when dropped.
pub struct MemoryPermit {
    budget: Arc<MemoryBudget>,
    bytes: usize,
}

impl MemoryPermit {
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for MemoryPermit {
    fn drop(&mut self) {
        self.budget.release(self.bytes);
    }
}

impl std::fmt::Debug for MemoryPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPermit").field("bytes", &self.bytes).finish()
    }
}
