//! cubepage - paging and caching for multi-band raster cubes
//!
//! Serves rows of large BIP, BIL and BSQ cubes to consumers a page at a
//! time, keeping recently read blocks of rows in a bounded cache and
//! converting between interleave layouts on the fly.
//!
//! # Modules
//!
//! - [`raster`] - Cube model, requests, and the page/pager contract
//! - [`cache`] - Page cache, cache units, memory budget and buffer pool
//! - [`pager`] - Pagers for cubes in memory and in raw cube files
//! - [`convert`] - Pagers that serve a cube in another interleave
//! - [`geotiff`] - Pager over the strips and tiles of TIFF images
//! - [`config`] - Tuning shared by every pager

pub mod cache;
pub mod config;
pub mod constants;
pub mod convert;
pub mod geotiff;
pub mod pager;
pub mod raster;

pub use cache::{BufferPool, CacheUnit, CachedPage, MemoryBudget, PageCache};
pub use config::PagerConfig;
pub use convert::{
    ConvertToBilPage, ConvertToBilPager, ConvertToBipPage, ConvertToBipPager, ConvertToBsqPage,
    ConvertToBsqPager,
};
pub use geotiff::{GeoTiffPage, GeoTiffPager, TiffBlockCache};
pub use pager::{CubeFileLayout, CubeFilePager, InMemoryPager};
pub use raster::{
    DataAccessor, DataRequest, DimensionDescriptor, InterleaveFormat, PagerError,
    RasterDataDescriptor, RasterPage, RasterPager,
};
