#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod export;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod session;
pub mod store;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, ExportConfig, LayoutConfig};
pub use ir::{GraphSnapshot, Person, RelationKind, Relationship};
pub use layout::{FamilyLayout, compute_layout, layout_snapshot};
pub use render::{Surface, render_surface, render_svg};
pub use theme::{Theme, ThemeMode};

/// Theme and layout knobs for one-shot rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub padding: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: Theme::light(),
            layout: LayoutConfig::default(),
            padding: ExportConfig::default().padding,
        }
    }
}

impl RenderOptions {
    pub fn for_mode(mode: ThemeMode, prefers_dark: bool) -> Self {
        Self {
            theme: Theme::for_mode(mode, prefers_dark),
            ..Self::default()
        }
    }
}

/// Parses a snapshot payload and renders it as a standalone SVG.
pub fn render_with_options(snapshot: &str, options: RenderOptions) -> anyhow::Result<String> {
    let source = store::SnapshotFile::parse(snapshot)?;
    let layout = layout_snapshot(source.snapshot(), &options.layout);
    Ok(render_svg(&layout, &options.theme, options.padding))
}
