//! Snapshot export of a rendered family tree.
//!
//! The canvas is sized from the card bounding box (plus padding, never
//! below the configured floor) and the drawing is scaled to fit it, with
//! the scale clamped to `[min_scale, max_scale]`. An empty tree exports
//! nothing.

#[cfg(feature = "pdf")]
mod pdf;
#[cfg(feature = "png")]
mod raster;

use crate::config::ExportConfig;
use crate::layout::{FamilyLayout, Rect};
use crate::render::Surface;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_IMAGE_NAME: &str = "family-tree.jpg";
pub const DEFAULT_DOCUMENT_NAME: &str = "family-tree.pdf";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to parse surface: {0}")]
    Svg(String),
    #[error("failed to allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
    #[error("failed to encode image: {0}")]
    Encode(String),
    #[error("failed to build document: {0}")]
    Document(String),
    #[error("{0} export not enabled (compile with the '{0}' feature)")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Png => "family-tree.png",
            Self::Jpeg => DEFAULT_IMAGE_NAME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageOrientation {
    Landscape,
    Portrait,
}

impl PageOrientation {
    pub fn for_canvas(width: u32, height: u32) -> Self {
        if width >= height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// Canvas-space transform: `canvas = layout * scale + (tx, ty)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub tx: f32,
    pub ty: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportPlan {
    pub bounds: Rect,
    pub width: u32,
    pub height: u32,
    pub transform: ViewTransform,
}

impl ExportPlan {
    pub fn orientation(&self) -> PageOrientation {
        PageOrientation::for_canvas(self.width, self.height)
    }
}

/// Canvas size and fit transform for `layout`; `None` when there is
/// nothing to draw.
pub fn plan_export(layout: &FamilyLayout, config: &ExportConfig) -> Option<ExportPlan> {
    let bounds = layout.bounds()?;
    let padding = config.padding.max(0.0);
    let width = canvas_extent(bounds.width, padding, config.min_width);
    let height = canvas_extent(bounds.height, padding, config.min_height);
    let transform = fit_transform(&bounds, width as f32, height as f32, config);
    Some(ExportPlan {
        bounds,
        width,
        height,
        transform,
    })
}

fn canvas_extent(extent: f32, padding: f32, floor: u32) -> u32 {
    let needed = (extent + padding * 2.0).ceil();
    let needed = if needed.is_finite() && needed > 0.0 {
        needed as u32
    } else {
        0
    };
    needed.max(floor).max(1)
}

/// Largest uniform scale that fits `bounds` (grown by `fit_padding`) into
/// the canvas, clamped to the configured range, centred on the canvas.
pub fn fit_transform(bounds: &Rect, width: f32, height: f32, config: &ExportConfig) -> ViewTransform {
    let grow = 1.0 + config.fit_padding.max(0.0);
    let x_zoom = width / (bounds.width * grow);
    let y_zoom = height / (bounds.height * grow);
    let zoom = x_zoom.min(y_zoom);
    let min_scale = config.min_scale.min(config.max_scale);
    let scale = if zoom.is_nan() {
        config.max_scale
    } else {
        zoom.max(min_scale).min(config.max_scale)
    };
    let (cx, cy) = bounds.center();
    ViewTransform {
        tx: width / 2.0 - cx * scale,
        ty: height / 2.0 - cy * scale,
        scale,
    }
}

/// The surface re-framed onto the export canvas.
pub fn canvas_svg(surface: &Surface, plan: &ExportPlan, background: &str) -> String {
    let w = plan.width;
    let h = plan.height;
    let t = plan.transform;
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\"><rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"{background}\"/><g transform=\"translate({:.3} {:.3}) scale({:.5})\">{}</g></svg>",
        t.tx,
        t.ty,
        t.scale,
        surface.content()
    )
}

/// Raw image snapshot at canvas size. `Ok(None)` when there are no nodes
/// or no surface to draw from.
pub fn export_image(
    surface: Option<&Surface>,
    layout: &FamilyLayout,
    format: ImageFormat,
    config: &ExportConfig,
) -> Result<Option<Vec<u8>>, ExportError> {
    let (Some(surface), Some(plan)) = (surface, plan_export(layout, config)) else {
        tracing::debug!("nothing to export");
        return Ok(None);
    };
    let bytes = encode_image(surface, &plan, format, config)?;
    tracing::info!(
        width = plan.width,
        height = plan.height,
        scale = plan.transform.scale,
        format = format.extension(),
        bytes = bytes.len(),
        "image exported"
    );
    Ok(Some(bytes))
}

/// The snapshot placed full-bleed on a single page of the canvas size.
pub fn export_document(
    surface: Option<&Surface>,
    layout: &FamilyLayout,
    config: &ExportConfig,
) -> Result<Option<Vec<u8>>, ExportError> {
    let (Some(surface), Some(plan)) = (surface, plan_export(layout, config)) else {
        tracing::debug!("nothing to export");
        return Ok(None);
    };
    let bytes = build_document(surface, &plan, config)?;
    tracing::info!(
        width = plan.width,
        height = plan.height,
        orientation = ?plan.orientation(),
        bytes = bytes.len(),
        "document exported"
    );
    Ok(Some(bytes))
}

#[cfg(feature = "png")]
fn encode_image(
    surface: &Surface,
    plan: &ExportPlan,
    format: ImageFormat,
    config: &ExportConfig,
) -> Result<Vec<u8>, ExportError> {
    let svg = canvas_svg(surface, plan, &config.export_background());
    let pixels = raster::rasterize(&svg, plan.width, plan.height)?;
    match format {
        ImageFormat::Png => raster::encode_png(pixels),
        ImageFormat::Jpeg => raster::encode_jpeg(pixels, config.jpeg_quality),
    }
}

#[cfg(not(feature = "png"))]
fn encode_image(
    _surface: &Surface,
    _plan: &ExportPlan,
    _format: ImageFormat,
    _config: &ExportConfig,
) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::Unsupported("png"))
}

#[cfg(feature = "pdf")]
fn build_document(
    surface: &Surface,
    plan: &ExportPlan,
    config: &ExportConfig,
) -> Result<Vec<u8>, ExportError> {
    let svg = canvas_svg(surface, plan, &config.export_background());
    let pixels = raster::rasterize(&svg, plan.width, plan.height)?;
    pdf::single_page(pixels, plan.orientation())
}

#[cfg(not(feature = "pdf"))]
fn build_document(
    _surface: &Surface,
    _plan: &ExportPlan,
    _config: &ExportConfig,
) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::Unsupported("pdf"))
}

impl ExportConfig {
    fn export_background(&self) -> String {
        crate::render::escape_xml(&self.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{Person, RelationKind, Relationship};
    use crate::layout::compute_layout;
    use crate::render::render_surface;
    use crate::theme::Theme;
    use std::collections::HashMap;

    fn chain_layout(children: usize) -> FamilyLayout {
        let root = Person::new("R", "Root", "Person");
        let rels: Vec<Relationship> = (0..children)
            .map(|i| Relationship::new(&i.to_string(), "R", &format!("C{i:03}"), RelationKind::Child))
            .collect();
        compute_layout(Some(&root), &rels, &HashMap::new(), &LayoutConfig::default())
    }

    #[test]
    fn single_node_uses_floor_canvas() {
        let layout = chain_layout(0);
        let plan = plan_export(&layout, &ExportConfig::default()).unwrap();
        assert_eq!((plan.width, plan.height), (800, 600));
        assert_eq!(plan.transform.scale, 2.0);
        // Centred: the card middle lands on the canvas middle.
        let (cx, cy) = plan.bounds.center();
        assert!((cx * plan.transform.scale + plan.transform.tx - 400.0).abs() < 1e-3);
        assert!((cy * plan.transform.scale + plan.transform.ty - 300.0).abs() < 1e-3);
        assert_eq!(plan.orientation(), PageOrientation::Landscape);
    }

    #[test]
    fn wide_tree_grows_canvas() {
        let layout = chain_layout(40);
        let config = ExportConfig::default();
        let plan = plan_export(&layout, &config).unwrap();
        let bounds = layout.bounds().unwrap();
        assert_eq!(plan.width, (bounds.width + 160.0).ceil() as u32);
        assert_eq!(plan.height, 600);
        assert!(plan.transform.scale < 1.0);
        assert!(plan.transform.scale >= config.min_scale);
    }

    #[test]
    fn scale_stays_in_range() {
        let mut config = ExportConfig::default();
        config.fit_padding = 3.0;
        for children in [0, 1, 5, 30, 120] {
            let plan = plan_export(&chain_layout(children), &config).unwrap();
            assert!(plan.transform.scale >= config.min_scale);
            assert!(plan.transform.scale <= config.max_scale);
        }
        let plan = plan_export(&chain_layout(30), &config).unwrap();
        assert_eq!(plan.transform.scale, config.min_scale);
    }

    #[test]
    fn empty_layout_exports_nothing() {
        let layout = FamilyLayout::default();
        let surface = render_surface(&layout, &Theme::light());
        assert!(plan_export(&layout, &ExportConfig::default()).is_none());
        let out = export_image(Some(&surface), &layout, ImageFormat::Png, &ExportConfig::default());
        assert!(matches!(out, Ok(None)));
        let doc = export_document(Some(&surface), &layout, &ExportConfig::default());
        assert!(matches!(doc, Ok(None)));
    }

    #[test]
    fn missing_surface_exports_nothing() {
        let layout = chain_layout(2);
        let out = export_image(None, &layout, ImageFormat::Jpeg, &ExportConfig::default());
        assert!(matches!(out, Ok(None)));
    }

    #[test]
    fn orientation_follows_aspect() {
        assert_eq!(PageOrientation::for_canvas(800, 800), PageOrientation::Landscape);
        assert_eq!(PageOrientation::for_canvas(800, 1200), PageOrientation::Portrait);
    }

    #[test]
    fn canvas_svg_wraps_surface() {
        let layout = chain_layout(1);
        let surface = render_surface(&layout, &Theme::light());
        let plan = plan_export(&layout, &ExportConfig::default()).unwrap();
        let svg = canvas_svg(&surface, &plan, "#ffffff");
        assert!(svg.contains("width=\"800\""));
        assert!(svg.contains("scale("));
        assert!(svg.contains(surface.content()));
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_export_has_canvas_size() {
        let layout = chain_layout(3);
        let surface = render_surface(&layout, &Theme::light());
        let config = ExportConfig::default();
        let bytes = export_image(Some(&surface), &layout, ImageFormat::Png, &config)
            .unwrap()
            .unwrap();
        let plan = plan_export(&layout, &config).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (plan.width, plan.height));
    }

    #[cfg(feature = "png")]
    #[test]
    fn jpeg_export_is_jpeg() {
        let layout = chain_layout(1);
        let surface = render_surface(&layout, &Theme::light());
        let bytes = export_image(Some(&surface), &layout, ImageFormat::Jpeg, &ExportConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[cfg(feature = "pdf")]
    fn generations_layout(depth: usize) -> FamilyLayout {
        let root = Person::new("G0", "Root", "Person");
        let rels: Vec<Relationship> = (0..depth)
            .map(|i| Relationship::new(&i.to_string(), &format!("G{i}"), &format!("G{}", i + 1), RelationKind::Child))
            .collect();
        compute_layout(Some(&root), &rels, &HashMap::new(), &LayoutConfig::default())
    }

    #[cfg(feature = "pdf")]
    fn media_box(pdf: &[u8]) -> Vec<f32> {
        let text = String::from_utf8_lossy(pdf);
        let start = text.find("/MediaBox").expect("page has a MediaBox");
        let rest = &text[start..];
        let open = rest.find('[').unwrap();
        let close = rest.find(']').unwrap();
        rest[open + 1..close]
            .split_whitespace()
            .map(|n| n.parse::<f32>().unwrap())
            .collect()
    }

    #[cfg(feature = "pdf")]
    fn assert_page_matches(layout: &FamilyLayout, orientation: PageOrientation) {
        let config = ExportConfig::default();
        let plan = plan_export(layout, &config).unwrap();
        assert_eq!(plan.orientation(), orientation);
        let surface = render_surface(layout, &Theme::light());
        let bytes = export_document(Some(&surface), layout, &config).unwrap().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let mb = media_box(&bytes);
        assert_eq!(mb.len(), 4);
        assert!((mb[2] - mb[0] - plan.width as f32).abs() < 0.5, "{mb:?}");
        assert!((mb[3] - mb[1] - plan.height as f32).abs() < 0.5, "{mb:?}");
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_page_matches_wide_canvas() {
        assert_page_matches(&chain_layout(2), PageOrientation::Landscape);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_page_matches_tall_canvas() {
        let layout = generations_layout(8);
        let plan = plan_export(&layout, &ExportConfig::default()).unwrap();
        assert_eq!((plan.width, plan.height), (800, 2196));
        assert_page_matches(&layout, PageOrientation::Portrait);
    }
}
