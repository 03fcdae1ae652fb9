use super::layout::{BlockLayout, BlockSpan};
use super::*;
use crate::config::PagerConfig;
use crate::raster::{
    DataAccessor, DataRequest, DimensionDescriptor, InterleaveFormat, PagerError,
    RasterDataDescriptor, RasterPager,
};
use bytes::Bytes;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tiff::encoder::{colortype, TiffEncoder};

fn dim(n: u32) -> DimensionDescriptor {
    DimensionDescriptor::new(n)
}

fn rgb(row: u32, column: u32, band: u32) -> u8 {
    (row * 30 + column * 3 + band) as u8
}

/// A 5 x 7 RGB image in strips of two rows.
fn write_rgb() -> NamedTempFile {
    let (width, height) = (5, 7);
    let data: Vec<u8> = (0..height)
        .flat_map(|r| (0..width).flat_map(move |c| (0..3).map(move |b| rgb(r, c, b))))
        .collect();

    let mut file = NamedTempFile::new().unwrap();
    {
        let mut encoder = TiffEncoder::new(file.as_file_mut()).unwrap();
        let mut image = encoder.new_image::<colortype::RGB8>(width, height).unwrap();
        image.rows_per_strip(2).unwrap();
        image.write_data(&data).unwrap();
    }
    file
}

fn rgb_descriptor() -> RasterDataDescriptor {
    RasterDataDescriptor::new(7, 5, 3, InterleaveFormat::Bip, 1)
}

fn rgb_row(row: u32) -> Vec<u8> {
    (0..5)
        .flat_map(|c| (0..3).map(move |b| rgb(row, c, b)))
        .collect()
}

fn unit(blocks: &[u32]) -> Arc<TiffBlockUnit> {
    Arc::new(TiffBlockUnit::new(blocks.to_vec(), Bytes::new(), 0, 0))
}

#[test]
fn test_block_cache_matches_exact_block_list() {
    let mut cache = TiffBlockCache::new(4);
    cache.insert(unit(&[1, 2]));

    assert!(cache.get(&[1, 2]).is_some());
    assert!(cache.get(&[1]).is_none());
    assert!(cache.get(&[1, 2, 3]).is_none());
}

#[test]
fn test_block_cache_evicts_only_unreferenced_units() {
    let mut cache = TiffBlockCache::new(2);
    cache.insert(unit(&[0]));
    cache.insert(unit(&[1]));
    let held = cache.get(&[0]).unwrap();
    assert_eq!(cache.references(&[0]), Some(1));

    cache.insert(unit(&[2]));
    assert!(cache.contains(&[0]));
    assert!(!cache.contains(&[1]));

    let also_held = cache.get(&[2]).unwrap();
    cache.insert(unit(&[3]));
    assert_eq!(cache.len(), 3);

    drop(held);
    drop(also_held);
    cache.insert(unit(&[4]));
    assert_eq!(cache.len(), 2);
    assert!(cache.contains(&[3]));
    assert!(cache.contains(&[4]));
}

#[test]
fn test_strip_span_rounds_out_to_whole_strips() {
    let layout = BlockLayout {
        shape: BlockShape::Strips { rows_per_strip: 2 },
        rows: 7,
        columns: 5,
        bands: 3,
        interleave: InterleaveFormat::Bip,
        bytes_per_element: 1,
    };

    let span = layout.span(3, 3, 0).unwrap();
    assert_eq!(span.blocks, vec![1, 2]);
    assert_eq!(span.first_row, 2);
    assert_eq!(span.rows, 4);

    let last = layout.span(6, 10, 0).unwrap();
    assert_eq!(last.blocks, vec![3]);
    assert_eq!(last.rows, 1);

    assert_eq!(layout.offset(2, 3, 1, 2), 15 + 3 + 2);
}

#[test]
fn test_tile_span_covers_every_tile_across() {
    let mut layout = BlockLayout {
        shape: BlockShape::Tiles { width: 4, height: 4 },
        rows: 10,
        columns: 10,
        bands: 2,
        interleave: InterleaveFormat::Bip,
        bytes_per_element: 1,
    };
    assert_eq!(layout.blocks_across(), 3);
    assert_eq!(layout.blocks_down(), 3);

    let span = layout.span(5, 4, 1).unwrap();
    assert_eq!(span.blocks, vec![3, 4, 5, 6, 7, 8]);
    assert_eq!(span.first_row, 4);
    assert_eq!(span.rows, 6);

    // planar images keep each band's tiles together
    layout.interleave = InterleaveFormat::Bsq;
    let span = layout.span(0, 1, 1).unwrap();
    assert_eq!(span.blocks, vec![9, 10, 11]);
    assert_eq!(layout.offset(0, 2, 3, 1), 2 * 10 + 3);

    assert!(matches!(
        layout.span(10, 1, 0),
        Err(PagerError::OutOfRange { what: "row", .. })
    ));
}

fn tile_value(row: u32, column: u32, band: u32) -> u8 {
    (row * 20 + column * 2 + band) as u8
}

/// Builds the tile at (`down`, `across`), either padded to 4 x 4 or cropped to the image.
fn tile(layout: &BlockLayout, down: u32, across: u32, cropped: bool) -> (Vec<u8>, u32) {
    let width = if cropped { 4.min(layout.columns - across * 4) } else { 4 };
    let height = if cropped { 4.min(layout.rows - down * 4) } else { 4 };
    let mut data = Vec::new();
    for r in 0..height {
        for c in 0..width {
            let (row, column) = (down * 4 + r, across * 4 + c);
            for b in 0..layout.bands {
                let inside = row < layout.rows && column < layout.columns;
                data.push(if inside { tile_value(row, column, b) } else { 0 });
            }
        }
    }
    (data, 4.min(layout.columns - across * 4))
}

#[test]
fn test_tiles_assemble_into_rows() {
    let layout = BlockLayout {
        shape: BlockShape::Tiles { width: 4, height: 4 },
        rows: 10,
        columns: 10,
        bands: 2,
        interleave: InterleaveFormat::Bip,
        bytes_per_element: 1,
    };
    let expected: Vec<u8> = (0..10)
        .flat_map(|r| (0..10).flat_map(move |c| (0..2).map(move |b| tile_value(r, c, b))))
        .collect();

    for cropped in [false, true] {
        let span: BlockSpan = layout.span(0, 10, 0).unwrap();
        let mut dest = vec![0u8; span.rows as usize * layout.line_bytes()];
        for (index, &block) in span.blocks.iter().enumerate() {
            let (data, data_width) = tile(&layout, block / 3, block % 3, cropped);
            layout.place(&mut dest, &span, index, &data, data_width).unwrap();
        }
        assert_eq!(dest, expected, "cropped: {}", cropped);
    }
}

#[test]
fn test_geotiff_strips_page() {
    let file = write_rgb();
    let pager = GeoTiffPager::open(file.path(), rgb_descriptor(), PagerConfig::default()).unwrap();
    assert_eq!(pager.block_shape(), BlockShape::Strips { rows_per_strip: 2 });

    let request = DataRequest::new(InterleaveFormat::Bip).with_concurrent_rows(3);
    let page = pager.get_page(&request, dim(3), dim(0), dim(0)).unwrap();
    assert_eq!(page.num_rows(), 3);
    assert_eq!(&page.raw_data()[..15], &rgb_row(3)[..]);
    assert_eq!(pager.outstanding_pages(), 1);

    // rows 2..6 come from the same two strips
    let request = DataRequest::new(InterleaveFormat::Bip).with_concurrent_rows(4);
    let again = pager.get_page(&request, dim(2), dim(2), dim(1)).unwrap();
    assert_eq!(again.raw_data()[0], rgb(2, 2, 1));
    assert_eq!(pager.cached_units(), 1);

    pager.release_page(page);
    drop(again);
    assert_eq!(pager.outstanding_pages(), 0);
}

#[test]
fn test_geotiff_accessor_reads_whole_image() {
    let file = write_rgb();
    let pager = GeoTiffPager::open(file.path(), rgb_descriptor(), PagerConfig::default()).unwrap();
    let request = DataRequest::new(InterleaveFormat::Bip).with_concurrent_rows(2);
    let mut accessor = DataAccessor::new(Arc::new(pager), rgb_descriptor(), request);

    for row in 0..7 {
        assert!(accessor.is_valid());
        assert_eq!(accessor.row().unwrap(), &rgb_row(row)[..]);
        accessor.next_row();
    }
    assert!(!accessor.is_valid());
    assert!(accessor.error().is_none());
}

#[test]
fn test_geotiff_cache_keeps_units_in_use() {
    let file = write_rgb();
    let config = PagerConfig::default().with_geotiff_cache_blocks(2);
    let pager = GeoTiffPager::open(file.path(), rgb_descriptor(), config).unwrap();
    let request = DataRequest::new(InterleaveFormat::Bip);

    for row in [0, 2, 4] {
        drop(pager.get_page(&request, dim(row), dim(0), dim(0)).unwrap());
    }
    assert_eq!(pager.cached_units(), 2);

    let held: Vec<_> = [0, 2, 6]
        .into_iter()
        .map(|row| pager.get_page(&request, dim(row), dim(0), dim(0)).unwrap())
        .collect();
    assert_eq!(pager.cached_units(), 3);

    drop(held);
    drop(pager.get_page(&request, dim(4), dim(0), dim(0)).unwrap());
    assert_eq!(pager.cached_units(), 2);
}

#[test]
fn test_geotiff_single_band_as_bsq() {
    let (width, height) = (3u32, 4u32);
    let data: Vec<u16> = (0..height)
        .flat_map(|r| (0..width).map(move |c| (r * 100 + c) as u16))
        .collect();
    let mut file = NamedTempFile::new().unwrap();
    TiffEncoder::new(file.as_file_mut())
        .unwrap()
        .write_image::<colortype::Gray16>(width, height, &data)
        .unwrap();

    let descriptor = RasterDataDescriptor::new(4, 3, 1, InterleaveFormat::Bsq, 2);
    let pager = GeoTiffPager::open(file.path(), descriptor, PagerConfig::default()).unwrap();
    let request = DataRequest::new(InterleaveFormat::Bsq).with_concurrent_rows(2);
    let page = pager.get_page(&request, dim(2), dim(1), dim(0)).unwrap();

    let first = u16::from_ne_bytes([page.raw_data()[0], page.raw_data()[1]]);
    assert_eq!(first, 201);
    assert_eq!(page.num_rows(), 2);
}

#[test]
fn test_geotiff_rejects_mismatched_descriptors() {
    let file = write_rgb();
    let open = |d: RasterDataDescriptor| GeoTiffPager::open(file.path(), d, PagerConfig::default());

    assert!(matches!(
        open(RasterDataDescriptor::new(8, 5, 3, InterleaveFormat::Bip, 1)),
        Err(PagerError::InvalidRequest(_))
    ));
    assert!(matches!(
        open(rgb_descriptor().with_interleave(InterleaveFormat::Bsq)),
        Err(PagerError::UnsupportedInterleave { .. })
    ));
    assert!(matches!(
        open(rgb_descriptor().with_interleave(InterleaveFormat::Bil)),
        Err(PagerError::UnsupportedInterleave { .. })
    ));
    assert!(matches!(
        open(RasterDataDescriptor::new(7, 5, 3, InterleaveFormat::Bip, 2)),
        Err(PagerError::InvalidRequest(_))
    ));
}

#[test]
fn test_geotiff_rejects_bad_requests() {
    let file = write_rgb();
    let pager = GeoTiffPager::open(file.path(), rgb_descriptor(), PagerConfig::default()).unwrap();

    let writable = DataRequest::new(InterleaveFormat::Bip).with_writable(true);
    assert!(matches!(
        pager.get_page(&writable, dim(0), dim(0), dim(0)),
        Err(PagerError::ReadOnly)
    ));

    let bsq = DataRequest::new(InterleaveFormat::Bsq);
    assert!(matches!(
        pager.get_page(&bsq, dim(0), dim(0), dim(0)),
        Err(PagerError::UnsupportedInterleave { .. })
    ));

    let bip = DataRequest::new(InterleaveFormat::Bip);
    assert!(matches!(
        pager.get_page(&bip, dim(7), dim(0), dim(0)),
        Err(PagerError::OutOfRange { what: "row", .. })
    ));
    assert_eq!(pager.cached_units(), 0);
}

fn sample(row: u32, column: u32, band: u32) -> u8 {
    (row * 16 + column * 2 + band) as u8
}

/// Writes an uncompressed 8-bit little-endian TIFF from pre-cut blocks.
///
/// The encoder only writes chunky strips, so tiled and planar images are
/// laid out by hand.
fn write_blocks(
    width: u32,
    height: u32,
    samples: u16,
    planar: bool,
    shape: BlockShape,
    blocks: &[Vec<u8>],
) -> NamedTempFile {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;

    let mut entries: Vec<(u16, u16, Vec<u32>)> = vec![
        (256, LONG, vec![width]),
        (257, LONG, vec![height]),
        (258, SHORT, vec![8; samples as usize]),
        (259, SHORT, vec![1]),
        (262, SHORT, vec![1]),
        (277, SHORT, vec![samples as u32]),
        (284, SHORT, vec![if planar { 2 } else { 1 }]),
    ];
    let (offsets_tag, counts_tag) = match shape {
        BlockShape::Strips { rows_per_strip } => {
            entries.push((278, LONG, vec![rows_per_strip]));
            (273u16, 279u16)
        }
        BlockShape::Tiles { width, height } => {
            entries.push((322, LONG, vec![width]));
            entries.push((323, LONG, vec![height]));
            (324, 325)
        }
    };
    entries.push((offsets_tag, LONG, vec![0; blocks.len()]));
    entries.push((counts_tag, LONG, blocks.iter().map(|b| b.len() as u32).collect()));
    entries.sort_by_key(|entry| entry.0);

    let value_bytes = |ty: u16, count: usize| count * if ty == SHORT { 2 } else { 4 };
    let ifd_len = 2 + 12 * entries.len() + 4;
    let extra_len: usize = entries
        .iter()
        .map(|(_, ty, values)| value_bytes(*ty, values.len()))
        .filter(|&len| len > 4)
        .sum();
    let mut at = (8 + ifd_len + extra_len) as u32;
    for (tag, _, values) in entries.iter_mut() {
        if *tag == offsets_tag {
            for (offset, block) in values.iter_mut().zip(blocks) {
                *offset = at;
                at += block.len() as u32;
            }
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    let extra_start = 8 + ifd_len;
    let mut extra = Vec::new();
    for (tag, ty, values) in &entries {
        let mut bytes = Vec::new();
        for &value in values {
            if *ty == SHORT {
                bytes.extend_from_slice(&(value as u16).to_le_bytes());
            } else {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&ty.to_le_bytes());
        out.extend_from_slice(&(values.len() as u32).to_le_bytes());
        if bytes.len() <= 4 {
            bytes.resize(4, 0);
            out.extend_from_slice(&bytes);
        } else {
            out.extend_from_slice(&((extra_start + extra.len()) as u32).to_le_bytes());
            extra.extend_from_slice(&bytes);
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&extra);
    for block in blocks {
        out.extend_from_slice(block);
    }

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&out).unwrap();
    file.flush().unwrap();
    file
}

/// Full-size tiles in file order. Planar images store every tile of band 0
/// first; chunky tiles carry all bands per pixel. Pixels past the image are 0.
fn cut_tiles(rows: u32, columns: u32, bands: u32, planar: bool, size: u32) -> Vec<Vec<u8>> {
    let (down, across) = (rows.div_ceil(size), columns.div_ceil(size));
    let planes = if planar { bands } else { 1 };
    let mut tiles = Vec::new();
    for plane in 0..planes {
        for d in 0..down {
            for a in 0..across {
                let mut tile = Vec::new();
                for r in d * size..(d + 1) * size {
                    for c in a * size..(a + 1) * size {
                        let inside = r < rows && c < columns;
                        let pixel_bands = if planar { plane..plane + 1 } else { 0..bands };
                        for b in pixel_bands {
                            tile.push(if inside { sample(r, c, b) } else { 0 });
                        }
                    }
                }
                tiles.push(tile);
            }
        }
    }
    tiles
}

fn band_row(row: u32, columns: u32, band: u32) -> Vec<u8> {
    (0..columns).map(|c| sample(row, c, band)).collect()
}

#[test]
fn test_geotiff_planar_strips_serve_one_band_per_page() {
    // 5 rows x 4 columns x 2 bands in strips of two rows, band 0 first
    let strips: Vec<Vec<u8>> = (0..2)
        .flat_map(|b| {
            (0..3u32).map(move |s| {
                (s * 2..(s * 2 + 2).min(5))
                    .flat_map(|r| band_row(r, 4, b))
                    .collect()
            })
        })
        .collect();
    let file = write_blocks(4, 5, 2, true, BlockShape::Strips { rows_per_strip: 2 }, &strips);
    let descriptor = RasterDataDescriptor::new(5, 4, 2, InterleaveFormat::Bsq, 1);
    let pager = GeoTiffPager::open(file.path(), descriptor.clone(), PagerConfig::default()).unwrap();

    let request = DataRequest::new(InterleaveFormat::Bsq).with_concurrent_rows(2);
    let page = pager.get_page(&request, dim(1), dim(0), dim(1)).unwrap();
    assert_eq!(&page.raw_data()[..4], &band_row(1, 4, 1)[..]);
    assert_eq!(page.num_rows(), 3);
    // band 1 strips follow the three strips of band 0
    assert!(pager.is_cached(&[3, 4]));

    let band0 = pager.get_page(&request, dim(1), dim(2), dim(0)).unwrap();
    assert_eq!(band0.raw_data()[0], sample(1, 2, 0));
    assert!(pager.is_cached(&[0, 1]));
    drop(page);
    drop(band0);

    let mut accessor = DataAccessor::starting_at(
        Arc::new(pager),
        descriptor,
        request,
        dim(0),
        dim(0),
        dim(1),
    );
    for row in 0..5 {
        assert_eq!(accessor.row().unwrap(), &band_row(row, 4, 1)[..]);
        accessor.next_row();
    }
    assert!(!accessor.is_valid());
    assert!(accessor.error().is_none());
}

#[test]
fn test_geotiff_tiles_assemble_rows() {
    // 6 rows x 5 columns x 3 bands in 4 x 4 tiles; right and bottom tiles are partial
    let tiles = cut_tiles(6, 5, 3, false, 4);
    let file = write_blocks(5, 6, 3, false, BlockShape::Tiles { width: 4, height: 4 }, &tiles);
    let descriptor = RasterDataDescriptor::new(6, 5, 3, InterleaveFormat::Bip, 1);
    let pager = GeoTiffPager::open(file.path(), descriptor.clone(), PagerConfig::default()).unwrap();
    assert_eq!(pager.block_shape(), BlockShape::Tiles { width: 4, height: 4 });

    let request = DataRequest::new(InterleaveFormat::Bip);
    let page = pager.get_page(&request, dim(4), dim(4), dim(2)).unwrap();
    assert_eq!(page.raw_data()[0], sample(4, 4, 2));
    assert_eq!(page.num_rows(), 2);
    assert!(pager.is_cached(&[2, 3]));
    drop(page);

    let request = DataRequest::new(InterleaveFormat::Bip).with_concurrent_rows(3);
    let mut accessor = DataAccessor::new(Arc::new(pager), descriptor, request);
    for row in 0..6 {
        let expected: Vec<u8> = (0..5)
            .flat_map(|c| (0..3).map(move |b| sample(row, c, b)))
            .collect();
        assert_eq!(accessor.row().unwrap(), &expected[..], "row {}", row);
        accessor.next_row();
    }
    assert!(!accessor.is_valid());
}

#[test]
fn test_geotiff_planar_tiles_keyed_per_band() {
    // 8 x 8 x 2 in 4 x 4 tiles, four tiles per band
    let tiles = cut_tiles(8, 8, 2, true, 4);
    let file = write_blocks(8, 8, 2, true, BlockShape::Tiles { width: 4, height: 4 }, &tiles);
    let descriptor = RasterDataDescriptor::new(8, 8, 2, InterleaveFormat::Bsq, 1);
    let pager = GeoTiffPager::open(file.path(), descriptor.clone(), PagerConfig::default()).unwrap();

    let request = DataRequest::new(InterleaveFormat::Bsq).with_concurrent_rows(2);
    let page = pager.get_page(&request, dim(5), dim(6), dim(1)).unwrap();
    assert_eq!(page.raw_data()[0], sample(5, 6, 1));
    assert_eq!(page.num_rows(), 3);
    assert!(pager.is_cached(&[6, 7]));

    let band0 = pager.get_page(&request, dim(0), dim(0), dim(0)).unwrap();
    assert_eq!(&band0.raw_data()[..8], &band_row(0, 8, 0)[..]);
    assert!(pager.is_cached(&[0, 1]));
    assert_eq!(pager.cached_units(), 2);
    drop(page);
    drop(band0);

    let mut accessor = DataAccessor::starting_at(
        Arc::new(pager),
        descriptor,
        request,
        dim(0),
        dim(3),
        dim(1),
    );
    for row in 0..8 {
        assert_eq!(accessor.row().unwrap(), &band_row(row, 8, 1)[3..]);
        accessor.next_row();
    }
    assert!(!accessor.is_valid());
}
