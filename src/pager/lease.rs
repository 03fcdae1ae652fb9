use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::raster::RasterPage;

/// Counts pages a pager has handed out and not yet had back.
#[derive(Clone, Default)]
pub struct LeaseCounter {
    outstanding: Arc<AtomicUsize>,
}

impl LeaseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `page` so that dropping it returns the lease.
    pub fn lease<P: RasterPage + 'static>(&self, page: P) -> LeasedPage<P> {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        LeasedPage {
            page,
            outstanding: Arc::clone(&self.outstanding),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

/// A page that decrements its pager's lease count when dropped.
pub struct LeasedPage<P> {
    page: P,
    outstanding: Arc<AtomicUsize>,
}

impl<P> LeasedPage<P> {
    pub fn inner(&self) -> &P {
        &self.page
    }
}

impl<P: RasterPage> RasterPage for LeasedPage<P> {
    fn raw_data(&self) -> &[u8] {
        self.page.raw_data()
    }

    fn num_rows(&self) -> u32 {
        self.page.num_rows()
    }

    fn num_columns(&self) -> u32 {
        self.page.num_columns()
    }

    fn num_bands(&self) -> u32 {
        self.page.num_bands()
    }

    fn interline_bytes(&self) -> u32 {
        self.page.interline_bytes()
    }
}

impl<P> Drop for LeasedPage<P> {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
