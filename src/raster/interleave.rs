use std::fmt;

/// Layout of a multi-band cube in memory or on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterleaveFormat {
    /// Band interleaved by pixel: every band of a pixel is adjacent.
    #[default]
    Bip,
    /// Band interleaved by line: each row holds one run of columns per band.
    Bil,
    /// Band sequential: each band is a complete plane.
    Bsq,
}

impl InterleaveFormat {
    /// Element index of (row, column, band) relative to the start of a block.
    ///
    /// `row` counts from the first row of the block. For BSQ the band is
    /// implied by the block (one plane per block) and is ignored here.
    pub fn element_offset(self, row: u64, column: u64, band: u64, columns: u64, bands: u64) -> u64 {
        match self {
            InterleaveFormat::Bip => (row * columns + column) * bands + band,
            InterleaveFormat::Bsq => row * columns + column,
            InterleaveFormat::Bil => row * bands * columns + band * columns + column,
        }
    }

    /// Bytes in one row of a block in this layout, excluding interline padding.
    ///
    /// A BSQ row only covers the block's single band.
    pub fn row_bytes(self, columns: u64, bands: u64, bytes_per_element: u64) -> u64 {
        match self {
            InterleaveFormat::Bip | InterleaveFormat::Bil => columns * bands * bytes_per_element,
            InterleaveFormat::Bsq => columns * bytes_per_element,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InterleaveFormat::Bip => "BIP",
            InterleaveFormat::Bil => "BIL",
            InterleaveFormat::Bsq => "BSQ",
        }
    }
}

impl fmt::Display for InterleaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
