use super::{ExportError, PageOrientation};
use super::raster::to_rgb;
use image::RgbaImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Pt, Px,
};

const TITLE: &str = "Family tree";
// One image pixel per point.
const PAGE_DPI: f32 = 72.0;

/// One page sized to the canvas in points, the snapshot placed full-bleed.
pub(super) fn single_page(
    pixels: RgbaImage,
    orientation: PageOrientation,
) -> Result<Vec<u8>, ExportError> {
    let (width, height) = pixels.dimensions();
    let (page_w, page_h) = page_size(width, height, orientation);
    let (doc, page, layer) = PdfDocument::new(
        TITLE,
        Mm::from(Pt(page_w)),
        Mm::from(Pt(page_h)),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let rgb = to_rgb(pixels);
    let image = Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    });
    image.add_to_layer(
        layer,
        ImageTransform {
            dpi: Some(PAGE_DPI),
            ..Default::default()
        },
    );

    doc.save_to_bytes()
        .map_err(|err| ExportError::Document(err.to_string()))
}

fn page_size(width: u32, height: u32, orientation: PageOrientation) -> (f32, f32) {
    let long = width.max(height) as f32;
    let short = width.min(height) as f32;
    match orientation {
        PageOrientation::Landscape => (long, short),
        PageOrientation::Portrait => (short, long),
    }
}
