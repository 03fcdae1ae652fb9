use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use super::block_cache::{TiffBlockCache, TiffBlockUnit};
use super::layout::{BlockLayout, BlockShape, BlockSpan};
use super::page::GeoTiffPage;
use crate::config::PagerConfig;
use crate::pager::LeaseCounter;
use crate::raster::{
    DataRequest, DimensionDescriptor, InterleaveFormat, PagerError, RasterDataDescriptor,
    RasterPage, RasterPager, Result,
};

struct DecoderState {
    decoder: Decoder<BufReader<File>>,
    cache: TiffBlockCache,
}

/// Serves pages from the strips or tiles of a TIFF image.
///
/// Chunky images are served as BIP, planar images as BSQ one band at a time.
/// Single-band images may be described either way.
///
/// Requests are rounded out to whole block rows; the assembled rows are kept
/// in a small [`TiffBlockCache`] so neighbouring requests reuse them. All
/// decoding happens under one lock.
pub struct GeoTiffPager {
    path: PathBuf,
    descriptor: RasterDataDescriptor,
    layout: BlockLayout,
    state: Mutex<DecoderState>,
    leases: LeaseCounter,
}

impl GeoTiffPager {
    /// Opens `path` and checks that the image matches `descriptor`.
    pub fn open(
        path: impl AsRef<Path>,
        descriptor: RasterDataDescriptor,
        config: PagerConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let d = &descriptor;
        if d.is_empty() {
            return Err(PagerError::InvalidRequest("cube has no elements".to_string()));
        }

        let mut decoder = Decoder::new(BufReader::new(File::open(&path)?))?;
        let (width, height) = decoder.dimensions()?;
        if (width, height) != (d.columns, d.rows) {
            return Err(PagerError::InvalidRequest(format!(
                "{} is {}x{}, expected {}x{}",
                path.display(),
                width,
                height,
                d.columns,
                d.rows
            )));
        }

        let samples = tag_u32(&mut decoder, Tag::SamplesPerPixel)?.unwrap_or(1);
        let native = match tag_u32(&mut decoder, Tag::PlanarConfiguration)?.unwrap_or(1) {
            2 => InterleaveFormat::Bsq,
            _ => InterleaveFormat::Bip,
        };
        if d.interleave != native && !(samples == 1 && d.interleave != InterleaveFormat::Bil) {
            return Err(PagerError::UnsupportedInterleave {
                requested: d.interleave,
                native,
            });
        }
        if samples != d.bands {
            return Err(PagerError::InvalidRequest(format!(
                "image has {} samples per pixel, expected {} bands",
                samples, d.bands
            )));
        }
        let bits = tag_u32(&mut decoder, Tag::BitsPerSample)?.unwrap_or(1);
        if bits != d.bytes_per_element * 8 {
            return Err(PagerError::InvalidRequest(format!(
                "image has {} bits per sample, expected {} bytes",
                bits, d.bytes_per_element
            )));
        }

        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        let shape = if decoder.find_tag(Tag::TileWidth)?.is_some() {
            BlockShape::Tiles {
                width: chunk_width,
                height: chunk_height,
            }
        } else {
            BlockShape::Strips {
                rows_per_strip: chunk_height,
            }
        };
        let layout = BlockLayout {
            shape,
            rows: d.rows,
            columns: d.columns,
            bands: d.bands,
            interleave: d.interleave,
            bytes_per_element: d.bytes_per_element,
        };

        tracing::debug!(
            path = %path.display(),
            ?shape,
            interleave = %d.interleave,
            rows = d.rows,
            columns = d.columns,
            bands = d.bands,
            "opened tiff"
        );

        Ok(Self {
            path,
            layout,
            state: Mutex::new(DecoderState {
                decoder,
                cache: TiffBlockCache::new(config.geotiff_cache_blocks),
            }),
            leases: LeaseCounter::new(),
            descriptor,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn descriptor(&self) -> &RasterDataDescriptor {
        &self.descriptor
    }

    pub fn block_shape(&self) -> BlockShape {
        self.layout.shape
    }

    /// Block units currently held by the cache.
    pub fn cached_units(&self) -> usize {
        self.state.lock().cache.len()
    }

    /// Whether a unit assembled from exactly `blocks` is cached.
    pub fn is_cached(&self, blocks: &[u32]) -> bool {
        self.state.lock().cache.contains(blocks)
    }

    pub fn outstanding_pages(&self) -> usize {
        self.leases.outstanding()
    }

    fn read_span(&self, decoder: &mut Decoder<BufReader<File>>, span: &BlockSpan) -> Result<TiffBlockUnit> {
        let mut buf = BytesMut::zeroed(span.rows as usize * self.layout.line_bytes());
        for (index, &block) in span.blocks.iter().enumerate() {
            let chunk = decoder.read_chunk(block).map_err(|e| {
                tracing::warn!(path = %self.path.display(), block, "tiff block read failed: {}", e);
                e
            })?;
            let (data_width, _) = decoder.chunk_data_dimensions(block);
            let bytes = sample_bytes(chunk)?;
            self.layout.place(&mut buf, span, index, &bytes, data_width)?;
        }

        tracing::debug!(
            blocks = ?span.blocks,
            first_row = span.first_row,
            rows = span.rows,
            "assembled tiff blocks"
        );
        Ok(TiffBlockUnit::new(
            span.blocks.clone(),
            buf.freeze(),
            span.first_row,
            span.rows,
        ))
    }
}

impl RasterPager for GeoTiffPager {
    fn get_page(
        &self,
        request: &DataRequest,
        start_row: DimensionDescriptor,
        start_column: DimensionDescriptor,
        start_band: DimensionDescriptor,
    ) -> Result<Box<dyn RasterPage>> {
        let d = &self.descriptor;
        if request.writable {
            return Err(PagerError::ReadOnly);
        }
        if request.interleave != d.interleave {
            return Err(PagerError::UnsupportedInterleave {
                requested: request.interleave,
                native: d.interleave,
            });
        }
        crate::pager::check_start(d, start_row, start_column, start_band)?;

        let (row, column, band) = (
            start_row.active_number,
            start_column.active_number,
            start_band.active_number,
        );
        if d.interleave == InterleaveFormat::Bsq && request.concurrent_bands_in(band, d.bands) > 1 {
            return Err(PagerError::InvalidRequest(
                "BSQ pages cover a single band".to_string(),
            ));
        }

        let wanted = request.concurrent_rows.clamp(1, d.rows - row);
        let span = self.layout.span(row, wanted, band)?;
        let unit = {
            let mut state = self.state.lock();
            match state.cache.get(&span.blocks) {
                Some(unit) => unit,
                None => {
                    let unit = Arc::new(self.read_span(&mut state.decoder, &span)?);
                    state.cache.insert(Arc::clone(&unit));
                    unit
                }
            }
        };

        let offset = self.layout.offset(unit.first_row(), row, column, band);
        let rows = unit.first_row() + unit.rows() - row;
        Ok(Box::new(self.leases.lease(GeoTiffPage::new(unit, offset, rows))))
    }
}

fn tag_u32<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<u32>> {
    match decoder.find_tag(tag)? {
        Some(value) => Ok(value.into_u32_vec()?.first().copied()),
        None => Ok(None),
    }
}

/// Flattens decoded samples into native-endian bytes.
fn sample_bytes(result: DecodingResult) -> Result<Vec<u8>> {
    let bytes = match result {
        DecodingResult::U8(v) => v,
        DecodingResult::I8(v) => v.into_iter().map(|x| x as u8).collect(),
        DecodingResult::U16(v) => v.into_iter().flat_map(u16::to_ne_bytes).collect(),
        DecodingResult::I16(v) => v.into_iter().flat_map(i16::to_ne_bytes).collect(),
        DecodingResult::U32(v) => v.into_iter().flat_map(u32::to_ne_bytes).collect(),
        DecodingResult::I32(v) => v.into_iter().flat_map(i32::to_ne_bytes).collect(),
        DecodingResult::U64(v) => v.into_iter().flat_map(u64::to_ne_bytes).collect(),
        DecodingResult::I64(v) => v.into_iter().flat_map(i64::to_ne_bytes).collect(),
        DecodingResult::F32(v) => v.into_iter().flat_map(f32::to_ne_bytes).collect(),
        DecodingResult::F64(v) => v.into_iter().flat_map(f64::to_ne_bytes).collect(),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(PagerError::InvalidRequest(
                "unsupported tiff sample format".to_string(),
            ))
        }
    };
    Ok(bytes)
}
