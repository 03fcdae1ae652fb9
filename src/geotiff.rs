//! Paging over TIFF images.
//!
//! TIFF stores pixels in strips or tiles, each compressed on its own, so a
//! row of the image can only be read by decoding every block that crosses
//! it. [`GeoTiffPager`] rounds each request out to whole rows of blocks,
//! assembles them into a full-width [`TiffBlockUnit`] and serves zero-copy
//! [`GeoTiffPage`]s into it.
//!
//! Units live in a [`TiffBlockCache`] keyed by the exact list of blocks they
//! were built from. A unit still referenced by a page is never evicted.
//!
//! # Examples
//!
//! ```no_run
//! use cubepage::config::PagerConfig;
//! use cubepage::geotiff::GeoTiffPager;
//! use cubepage::raster::{DataAccessor, DataRequest, InterleaveFormat, RasterDataDescriptor};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = RasterDataDescriptor::new(512, 512, 3, InterleaveFormat::Bip, 1);
//! let pager = GeoTiffPager::open("scene.tif", descriptor.clone(), PagerConfig::default())?;
//!
//! let request = DataRequest::new(InterleaveFormat::Bip).with_concurrent_rows(32);
//! let mut accessor = DataAccessor::new(Arc::new(pager), descriptor, request);
//! while let Some(row) = accessor.row() {
//!     let _red = row[0];
//!     accessor.next_row();
//! }
//! # Ok(())
//! # }
//! ```

mod block_cache;
mod layout;
mod page;
mod pager;

pub use block_cache::{TiffBlockCache, TiffBlockUnit};
pub use layout::BlockShape;
pub use page::GeoTiffPage;
pub use pager::GeoTiffPager;

#[cfg(test)]
mod tests;
