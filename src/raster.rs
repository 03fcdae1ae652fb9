//! Raster cube model and the paging contract.
//!
//! A cube is a three dimensional (rows × columns × bands) dataset stored in
//! one of three interleave layouts. Consumers never touch the storage
//! directly; they ask a [`RasterPager`] for a [`RasterPage`] covering some
//! starting row, column and band, read from it, and release it.
//!
//! # Components
//!
//! - [`InterleaveFormat`] - BIP, BIL and BSQ layouts and their offset math
//! - [`DimensionDescriptor`] - a row, column or band index in its several numberings
//! - [`RasterDataDescriptor`] - the extent and element size of a cube
//! - [`DataRequest`] - what a consumer wants from a pager
//! - [`RasterPage`] / [`RasterPager`] - the paging contract
//! - [`DataAccessor`] - a row cursor that walks pages on behalf of a consumer
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use cubepage::pager::InMemoryPager;
//! use cubepage::raster::{DataAccessor, DataRequest, InterleaveFormat, RasterDataDescriptor};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = RasterDataDescriptor::new(4, 3, 2, InterleaveFormat::Bip, 1);
//! let data = Bytes::from((0..24u8).collect::<Vec<_>>());
//! let pager = Arc::new(InMemoryPager::new(descriptor.clone(), data)?);
//!
//! let request = DataRequest::new(InterleaveFormat::Bip).with_concurrent_rows(2);
//! let mut accessor = DataAccessor::new(pager, descriptor, request);
//! while accessor.is_valid() {
//!     let row = accessor.row().expect("valid accessor has a row");
//!     assert_eq!(row.len(), 6);
//!     accessor.next_row();
//! }
//! # Ok(())
//! # }
//! ```

mod accessor;
mod descriptor;
mod dimension;
mod error;
mod interleave;
mod page;
mod request;

pub use accessor::DataAccessor;
pub use descriptor::{ByteOrder, RasterDataDescriptor};
pub use dimension::DimensionDescriptor;
pub use error::{PagerError, Result};
pub use interleave::InterleaveFormat;
pub use page::{RasterPage, RasterPager};
pub use request::DataRequest;
