use super::interleave::InterleaveFormat;

/// Byte order of multi-byte elements in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// The byte order of the running host.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// Extent, layout and element size of a cube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterDataDescriptor {
    pub rows: u32,
    pub columns: u32,
    pub bands: u32,
    pub interleave: InterleaveFormat,
    pub bytes_per_element: u32,
}

impl RasterDataDescriptor {
    pub fn new(
        rows: u32,
        columns: u32,
        bands: u32,
        interleave: InterleaveFormat,
        bytes_per_element: u32,
    ) -> Self {
        Self {
            rows,
            columns,
            bands,
            interleave,
            bytes_per_element,
        }
    }

    /// The same cube described in another layout.
    pub fn with_interleave(&self, interleave: InterleaveFormat) -> Self {
        Self {
            interleave,
            ..self.clone()
        }
    }

    pub fn total_elements(&self) -> u64 {
        self.rows as u64 * self.columns as u64 * self.bands as u64
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_elements() * self.bytes_per_element as u64
    }

    /// Bytes in one stored row, excluding padding. For BSQ this is one band's row.
    pub fn row_bytes(&self) -> u64 {
        self.interleave.row_bytes(
            self.columns as u64,
            self.bands as u64,
            self.bytes_per_element as u64,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.total_elements() == 0 || self.bytes_per_element == 0
    }
}
