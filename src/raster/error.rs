use thiserror::Error;

use super::interleave::InterleaveFormat;

#[derive(Debug, Error)]
pub enum PagerError {
    #[error("{what} {index} is out of range (extent {extent})")]
    OutOfRange {
        what: &'static str,
        index: u64,
        extent: u64,
    },

    #[error("cannot serve {requested} pages from {native} data")]
    UnsupportedInterleave {
        requested: InterleaveFormat,
        native: InterleaveFormat,
    },

    #[error("pager is read-only")]
    ReadOnly,

    #[error("failed to allocate {0} bytes for a page")]
    AllocationFailed(usize),

    #[error("page cache geometry has not been initialized")]
    NotInitialized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tiff error: {0}")]
    Tiff(#[from] tiff::TiffError),
}

impl PagerError {
    pub(crate) fn out_of_range(what: &'static str, index: impl Into<u64>, extent: impl Into<u64>) -> Self {
        PagerError::OutOfRange {
            what,
            index: index.into(),
            extent: extent.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PagerError>;
