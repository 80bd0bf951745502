use crate::ir::Person;
use crate::layout::{FamilyLayout, PlacedNode, Rect};
use crate::text_metrics::truncate_to_width;
use crate::theme::Theme;
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

const CARD_RADIUS: f32 = 16.0;
const CARD_PAD: f32 = 12.0;
const AVATAR_SIZE: f32 = 48.0;
const HANDLE_RADIUS: f32 = 6.0;
const BUTTON_HEIGHT: f32 = 30.0;
const NO_PHOTO: &str = "No photo";
const UNKNOWN_TAG: &str = "Unknown ethnicity";
const DETAILS: &str = "Details";

/// The drawn diagram in layout coordinates. Export re-frames `content`
/// onto a canvas; [`Surface::to_svg`] frames it around its own bounds.
#[derive(Debug, Clone)]
pub struct Surface {
    pub bounds: Option<Rect>,
    pub background: String,
    content: String,
}

impl Surface {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Standalone SVG with `padding` around the cards.
    pub fn to_svg(&self, padding: f32) -> String {
        let frame = match self.bounds {
            Some(b) => Rect {
                x: b.x - padding,
                y: b.y - padding,
                width: b.width + padding * 2.0,
                height: b.height + padding * 2.0,
            },
            None => Rect {
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 200.0,
            },
        };
        let width = frame.width.max(200.0);
        let height = frame.height.max(200.0);
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"{:.2} {:.2} {width:.2} {height:.2}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\"/>{}</svg>",
            frame.x, frame.y, frame.x, frame.y, self.background, self.content
        )
    }
}

pub fn render_surface(layout: &FamilyLayout, theme: &Theme) -> Surface {
    let mut svg = String::new();
    let positions: HashMap<&str, &PlacedNode> = layout
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect();

    // Edges first so cards sit on top of them.
    for edge in &layout.edges {
        let (Some(parent), Some(child)) = (
            positions.get(edge.parent_id.as_str()),
            positions.get(edge.child_id.as_str()),
        ) else {
            continue;
        };
        let points = smooth_step(layout, parent, child);
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>",
            points_to_path(&points),
            theme.line_color
        ));
    }

    for (idx, node) in layout.nodes.iter().enumerate() {
        svg.push_str(&person_card_svg(idx, node, layout, theme));
    }

    Surface {
        bounds: layout.bounds(),
        background: theme.background.clone(),
        content: svg,
    }
}

pub fn render_svg(layout: &FamilyLayout, theme: &Theme, padding: f32) -> String {
    render_surface(layout, theme).to_svg(padding)
}

/// Parent bottom handle -> down to the midline -> across -> child top handle.
fn smooth_step(layout: &FamilyLayout, parent: &PlacedNode, child: &PlacedNode) -> Vec<(f32, f32)> {
    let sx = parent.x + layout.node_width / 2.0;
    let sy = parent.y + layout.node_height;
    let tx = child.x + layout.node_width / 2.0;
    let ty = child.y;
    let mid_y = (sy + ty) / 2.0;
    if (sx - tx).abs() < f32::EPSILON {
        return vec![(sx, sy), (tx, ty)];
    }
    vec![(sx, sy), (sx, mid_y), (tx, mid_y), (tx, ty)]
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

fn person_card_svg(idx: usize, node: &PlacedNode, layout: &FamilyLayout, theme: &Theme) -> String {
    let x = node.x;
    let y = node.y;
    let w = layout.node_width;
    let h = layout.node_height;
    let family = escape_xml(&theme.font_family);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<g data-id=\"{}\"><rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"{CARD_RADIUS}\" ry=\"{CARD_RADIUS}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
        escape_xml(&node.id),
        theme.card_fill,
        theme.card_border
    ));

    let avatar_cx = x + CARD_PAD + AVATAR_SIZE / 2.0;
    let avatar_cy = y + CARD_PAD + AVATAR_SIZE / 2.0;
    let avatar_r = AVATAR_SIZE / 2.0;
    svg.push_str(&format!(
        "<circle cx=\"{avatar_cx:.2}\" cy=\"{avatar_cy:.2}\" r=\"{avatar_r:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
        theme.avatar_fill, theme.card_border
    ));
    match node.person.as_ref().and_then(|p| p.avatar_url.as_deref()) {
        Some(url) if !url.trim().is_empty() => {
            svg.push_str(&format!(
                "<clipPath id=\"avatar-{idx}\"><circle cx=\"{avatar_cx:.2}\" cy=\"{avatar_cy:.2}\" r=\"{avatar_r:.2}\"/></clipPath><image x=\"{:.2}\" y=\"{:.2}\" width=\"{AVATAR_SIZE}\" height=\"{AVATAR_SIZE}\" preserveAspectRatio=\"xMidYMid slice\" clip-path=\"url(#avatar-{idx})\" xlink:href=\"{}\"/>",
                x + CARD_PAD,
                y + CARD_PAD,
                escape_xml(url.trim())
            ));
        }
        _ => {
            svg.push_str(&format!(
                "<text x=\"{avatar_cx:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{family}\" font-size=\"9\" fill=\"{}\">{NO_PHOTO}</text>",
                avatar_cy + 3.0,
                theme.muted_text_color
            ));
        }
    }

    let text_x = x + CARD_PAD * 2.0 + AVATAR_SIZE;
    let text_width = (w - (text_x - x) - CARD_PAD).max(0.0);
    let name = card_name(node);
    let tag = node
        .person
        .as_ref()
        .and_then(|p| p.ethnicity.as_deref())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .unwrap_or(UNKNOWN_TAG);
    let tag_size = (theme.font_size - 2.0).max(1.0);
    svg.push_str(&format!(
        "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{family}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
        y + CARD_PAD + 18.0,
        theme.font_size,
        theme.text_color,
        escape_xml(&truncate_to_width(&name, text_width, theme.font_size, &theme.font_family))
    ));
    svg.push_str(&format!(
        "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{family}\" font-size=\"{tag_size}\" fill=\"{}\">{}</text>",
        y + CARD_PAD + 38.0,
        theme.muted_text_color,
        escape_xml(&truncate_to_width(tag, text_width, tag_size, &theme.font_family))
    ));

    let button_y = y + h - CARD_PAD - BUTTON_HEIGHT;
    if button_y > y + CARD_PAD + AVATAR_SIZE {
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{button_y:.2}\" width=\"{:.2}\" height=\"{BUTTON_HEIGHT}\" rx=\"12\" ry=\"12\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/><text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{family}\" font-size=\"12\" fill=\"{}\">{DETAILS}</text>",
            x + CARD_PAD,
            (w - CARD_PAD * 2.0).max(0.0),
            theme.card_fill,
            theme.card_border,
            x + w / 2.0,
            button_y + BUTTON_HEIGHT / 2.0 + 4.0,
            theme.text_color
        ));
    }

    for handle_y in [y, y + h] {
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{handle_y:.2}\" r=\"{HANDLE_RADIUS}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>",
            x + w / 2.0,
            theme.handle_color,
            theme.card_fill
        ));
    }

    svg.push_str("</g>");
    svg
}

fn card_name(node: &PlacedNode) -> String {
    node.person
        .as_ref()
        .map(Person::display_name)
        .unwrap_or_else(|| node.id.clone())
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
