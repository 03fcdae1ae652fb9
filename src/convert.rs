//! Pagers that serve a cube in a layout other than the one it is stored in.
//!
//! Each converting pager wraps a native pager and builds a private page per
//! request by walking the native rows with a [`DataAccessor`](crate::raster::DataAccessor)
//! and scattering them into the target layout. Converted pages are never
//! cached; their buffers are recycled through a
//! [`BufferPool`](crate::cache::BufferPool) once the consumer drops them.
//!
//! | Pager | Serves | From |
//! |-------|--------|------|
//! | [`ConvertToBipPager`] | BIP | BSQ, BIL |
//! | [`ConvertToBilPager`] | BIL | BIP, BSQ |
//! | [`ConvertToBsqPager`] | BSQ, one band per page | BIP, BIL |
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use cubepage::config::PagerConfig;
//! use cubepage::convert::ConvertToBilPager;
//! use cubepage::pager::InMemoryPager;
//! use cubepage::raster::{
//!     DataRequest, DimensionDescriptor, InterleaveFormat, RasterDataDescriptor, RasterPager,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 2 rows x 2 columns x 2 bands stored BSQ
//! let descriptor = RasterDataDescriptor::new(2, 2, 2, InterleaveFormat::Bsq, 1);
//! let native = InMemoryPager::new(descriptor.clone(), Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7, 8]))?;
//! let pager = ConvertToBilPager::new(Arc::new(native), descriptor, &PagerConfig::default());
//!
//! let request = DataRequest::new(InterleaveFormat::Bil).with_concurrent_rows(2);
//! let origin = DimensionDescriptor::new(0);
//! let page = pager.get_page(&request, origin, origin, origin)?;
//! assert_eq!(page.raw_data(), &[1, 2, 5, 6, 3, 4, 7, 8]);
//! # Ok(())
//! # }
//! ```

mod bil;
mod bip;
mod bsq;
mod page;
mod source;

pub use bil::ConvertToBilPager;
pub use bip::ConvertToBipPager;
pub use bsq::ConvertToBsqPager;
pub use page::{ConvertToBilPage, ConvertToBipPage, ConvertToBsqPage};
