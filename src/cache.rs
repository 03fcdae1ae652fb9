//! Page caching for on-disk cubes.
//!
//! Cubes are often far larger than memory, so pagers read them a block of
//! rows at a time and keep recently read blocks around for the next request.
//!
//! # Overview
//!
//! - [`CacheUnit`] - one immutable block of rows (all bands, or one BSQ band)
//! - [`PageCache`] - a byte-bounded, recency-ordered set of units for one raster
//! - [`CachedPage`] - a zero-copy page pointing into a unit
//! - [`MemoryBudget`] - a limit on live unit bytes, evicted or not
//! - [`BufferPool`] - reusable buffers for converted pages
//!
//! # Ownership
//!
//! Units are shared through `Arc`. The cache holds one handle and every
//! outstanding page holds another, so eviction never frees memory a consumer
//! is still reading; the buffer goes away with the last handle. Between
//! eviction and release the same rows may briefly exist twice if they are
//! read again; a [`MemoryBudget`] bounds how much such memory can pile up.
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use cubepage::cache::{CacheUnit, PageCache, UnitBand};
//! use cubepage::raster::{DataRequest, DimensionDescriptor, InterleaveFormat, RasterPage};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 10 rows x 5 columns x 3 bands, one byte per element, BSQ
//! let cache = PageCache::new(1024);
//! cache.initialize(1, 5, 3);
//!
//! let request = DataRequest::new(InterleaveFormat::Bsq).with_concurrent_rows(5);
//! let row0 = DimensionDescriptor::new(0);
//! let band1 = DimensionDescriptor::new(1);
//! assert!(cache.get_unit(&request, row0, band1).is_none());
//!
//! let unit = Arc::new(CacheUnit::new(
//!     Bytes::from(vec![7u8; 25]),
//!     row0,
//!     5,
//!     UnitBand::Band(1),
//!     0,
//! ));
//! let page = cache.create_page(unit, InterleaveFormat::Bsq, row0, DimensionDescriptor::new(0), band1)?;
//! assert_eq!(page.num_rows(), 5);
//! assert_eq!(cache.cache_size(), 25);
//! # Ok(())
//! # }
//! ```

mod buffer_pool;
mod cached_page;
mod memory_budget;
mod page_cache;
mod unit;

pub use buffer_pool::BufferPool;
pub use cached_page::CachedPage;
pub use memory_budget::{MemoryBudget, MemoryPermit};
pub use page_cache::{CacheStats, PageCache};
pub use unit::{CacheUnit, UnitBand};
