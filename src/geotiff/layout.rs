use crate::raster::{InterleaveFormat, PagerError, Result};

/// How a TIFF image is chunked on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockShape {
    /// Full-width strips of `rows_per_strip` rows.
    Strips { rows_per_strip: u32 },
    /// Rectangular tiles; tiles in the last row and column may be partial.
    Tiles { width: u32, height: u32 },
}

/// The blocks needed to cover a run of rows, and the rows they yield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockSpan {
    pub blocks: Vec<u32>,
    pub first_row: u32,
    pub rows: u32,
}

/// Chunk arithmetic for one image.
///
/// Pixel-interleaved (chunky) images map to BIP with every band in each
/// chunk. Planar images map to BSQ with one band per chunk and the chunks
/// of each band stored after the previous band's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockLayout {
    pub shape: BlockShape,
    pub rows: u32,
    pub columns: u32,
    pub bands: u32,
    pub interleave: InterleaveFormat,
    pub bytes_per_element: u32,
}

impl BlockLayout {
    fn block_width(&self) -> u32 {
        match self.shape {
            BlockShape::Strips { .. } => self.columns,
            BlockShape::Tiles { width, .. } => width,
        }
    }

    fn block_height(&self) -> u32 {
        match self.shape {
            BlockShape::Strips { rows_per_strip } => rows_per_strip,
            BlockShape::Tiles { height, .. } => height,
        }
    }

    pub fn blocks_across(&self) -> u32 {
        self.columns.div_ceil(self.block_width().max(1))
    }

    pub fn blocks_down(&self) -> u32 {
        self.rows.div_ceil(self.block_height().max(1))
    }

    /// Samples stored per pixel within one chunk.
    fn samples(&self) -> u32 {
        match self.interleave {
            InterleaveFormat::Bsq => 1,
            InterleaveFormat::Bip | InterleaveFormat::Bil => self.bands,
        }
    }

    pub fn pixel_bytes(&self) -> usize {
        self.samples() as usize * self.bytes_per_element as usize
    }

    pub fn line_bytes(&self) -> usize {
        self.columns as usize * self.pixel_bytes()
    }

    /// Blocks covering rows `row..row + rows` of `band`. `band` only matters
    /// for planar images.
    pub fn span(&self, row: u32, rows: u32, band: u32) -> Result<BlockSpan> {
        if row >= self.rows {
            return Err(PagerError::out_of_range("row", row, self.rows));
        }
        if band >= self.bands {
            return Err(PagerError::out_of_range("band", band, self.bands));
        }
        let height = self.block_height().max(1);
        let across = self.blocks_across();
        let last = (row as u64 + rows.max(1) as u64 - 1).min(self.rows as u64 - 1) as u32;
        let (first_down, last_down) = (row / height, last / height);
        let plane = match self.interleave {
            InterleaveFormat::Bsq => band * across * self.blocks_down(),
            InterleaveFormat::Bip | InterleaveFormat::Bil => 0,
        };

        let blocks = (first_down..=last_down)
            .flat_map(|down| (0..across).map(move |a| plane + down * across + a))
            .collect();
        let first_row = first_down * height;
        let end = ((last_down as u64 + 1) * height as u64).min(self.rows as u64) as u32;
        Ok(BlockSpan {
            blocks,
            first_row,
            rows: end - first_row,
        })
    }

    /// Copies the `index`-th chunk of `span` into its place in `dest`.
    ///
    /// `dest` holds `span.rows` full-width lines. `data_width` is the width
    /// of the chunk's valid pixels; chunks may come back either padded to the
    /// full block width or cropped to it.
    pub fn place(
        &self,
        dest: &mut [u8],
        span: &BlockSpan,
        index: usize,
        chunk: &[u8],
        data_width: u32,
    ) -> Result<()> {
        let across = self.blocks_across().max(1) as usize;
        let (down, column_block) = (index / across, index % across);
        let pixel = self.pixel_bytes();
        let block_width = self.block_width() as usize;
        let block_height = self.block_height() as usize;

        let stride = if chunk.len() >= block_width * block_height * pixel {
            block_width
        } else {
            data_width as usize
        };
        let first_column = column_block * block_width;
        let width = block_width.min((self.columns as usize).saturating_sub(first_column));
        if stride < width || stride == 0 {
            return Err(PagerError::InvalidRequest(format!(
                "block {} holds {} columns, {} needed",
                span.blocks.get(index).copied().unwrap_or_default(),
                stride,
                width
            )));
        }

        let line = self.line_bytes();
        let chunk_line = stride * pixel;
        for (r, source) in chunk.chunks(chunk_line).take(block_height).enumerate() {
            let row = down * block_height + r;
            if row >= span.rows as usize {
                break;
            }
            if source.len() < width * pixel {
                return Err(PagerError::InvalidRequest(format!(
                    "block {} ended mid-row",
                    span.blocks.get(index).copied().unwrap_or_default()
                )));
            }
            let at = row * line + first_column * pixel;
            dest[at..at + width * pixel].copy_from_slice(&source[..width * pixel]);
        }
        Ok(())
    }

    /// Byte offset of (row, column, band) within a unit starting at `first_row`.
    pub fn offset(&self, first_row: u32, row: u32, column: u32, band: u32) -> usize {
        let within = (row - first_row) as usize * self.line_bytes();
        let band = match self.interleave {
            InterleaveFormat::Bsq => 0,
            InterleaveFormat::Bip | InterleaveFormat::Bil => band as usize,
        };
        within + column as usize * self.pixel_bytes() + band * self.bytes_per_element as usize
    }
}
