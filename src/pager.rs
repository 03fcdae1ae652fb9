//! Pagers over cubes stored in their native interleave.
//!
//! # Components
//!
//! - [`InMemoryPager`] - pages are zero-copy slices of a cube held in memory
//! - [`CubeFilePager`] - reads blocks of rows from a raw cube file through a
//!   [`PageCache`](crate::cache::PageCache)
//! - [`CubeFileLayout`] - header, line padding and byte order of a raw cube file
//!
//! Both refuse requests for a layout other than the one the data is stored
//! in; the [`convert`](crate::convert) pagers sit on top of them for that.
//!
//! # Examples
//!
//! ```no_run
//! use cubepage::config::PagerConfig;
//! use cubepage::pager::{CubeFileLayout, CubeFilePager};
//! use cubepage::raster::{
//!     DataRequest, DimensionDescriptor, InterleaveFormat, RasterDataDescriptor, RasterPager,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = RasterDataDescriptor::new(1024, 1024, 224, InterleaveFormat::Bil, 2);
//! let layout = CubeFileLayout::new(descriptor).with_header_bytes(512);
//! let pager = CubeFilePager::open("scene.bil", layout, PagerConfig::default())?;
//!
//! let request = DataRequest::new(InterleaveFormat::Bil).with_concurrent_rows(16);
//! let origin = DimensionDescriptor::new(0);
//! let page = pager.get_page(&request, origin, origin, origin)?;
//! println!("{} rows available", page.num_rows());
//! pager.release_page(page);
//! # Ok(())
//! # }
//! ```

mod cube_file;
mod in_memory;
mod lease;

pub use cube_file::{CubeFileLayout, CubeFilePager};
pub(crate) use in_memory::check_start;
pub use in_memory::{InMemoryPage, InMemoryPager};
pub use lease::{LeaseCounter, LeasedPage};
