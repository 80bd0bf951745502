use super::ExportError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage, RgbaImage};
use once_cell::sync::Lazy;
use std::io::Cursor;
use std::sync::Arc;
use usvg::fontdb;

static FONT_DB: Lazy<Arc<fontdb::Database>> = Lazy::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

/// Rasterizes a canvas document at its native pixel size.
pub(super) fn rasterize(svg: &str, width: u32, height: u32) -> Result<RgbaImage, ExportError> {
    let opt = usvg::Options {
        fontdb: Arc::clone(&FONT_DB),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| ExportError::Svg(err.to_string()))?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or(ExportError::Canvas { width, height })?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::default(),
        &mut pixmap.as_mut(),
    );
    // The canvas background is opaque, so premultiplied and straight
    // alpha agree on every pixel.
    RgbaImage::from_raw(width, height, pixmap.take()).ok_or(ExportError::Canvas { width, height })
}

pub(super) fn encode_png(pixels: RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|err| ExportError::Encode(err.to_string()))?;
    Ok(bytes)
}

pub(super) fn encode_jpeg(pixels: RgbaImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let rgb = to_rgb(pixels);
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|err| ExportError::Encode(err.to_string()))?;
    Ok(bytes)
}

pub(super) fn to_rgb(pixels: RgbaImage) -> RgbImage {
    DynamicImage::ImageRgba8(pixels).to_rgb8()
}
