use crate::theme::{Theme, ThemeMode};
use anyhow::bail;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#[0-9a-fA-F]{3}|#[0-9a-fA-F]{6}|#[0-9a-fA-F]{8}|rgba?\([0-9.,\s%]+\)|[a-zA-Z]+)$")
        .expect("color pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal distance between neighbours on one level.
    pub node_spacing: f32,
    /// Vertical distance between generations.
    pub rank_spacing: f32,
    pub node_width: f32,
    pub node_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 280.0,
            rank_spacing: 240.0,
            node_width: 210.0,
            node_height: 116.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub padding: f32,
    pub min_width: u32,
    pub min_height: u32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Extra room around the bounding box when fitting it to the canvas.
    pub fit_padding: f32,
    pub background: String,
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            padding: 80.0,
            min_width: 800,
            min_height: 600,
            min_scale: 0.5,
            max_scale: 2.0,
            fit_padding: 0.1,
            background: "#ffffff".to_string(),
            jpeg_quality: 92,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Mode named by the config file; light when absent.
    pub theme_mode: ThemeMode,
    /// `theme_mode` resolved without a dark preference, overrides applied.
    pub theme: Theme,
    pub theme_variables: ThemeVariables,
    pub layout: LayoutConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::default(),
            theme: Theme::light(),
            theme_variables: ThemeVariables::default(),
            layout: LayoutConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Palette for `base` with the file's `themeVariables` laid over it.
    pub fn overlay_theme(&self, base: Theme) -> Theme {
        self.theme_variables.apply(base)
    }
}

/// Per-field palette overrides; colors are validated when loaded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeVariables {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub background: Option<String>,
    pub card_fill: Option<String>,
    pub card_border: Option<String>,
    pub text_color: Option<String>,
    pub muted_text_color: Option<String>,
    pub line_color: Option<String>,
    pub handle_color: Option<String>,
    pub avatar_fill: Option<String>,
}

impl ThemeVariables {
    pub fn apply(&self, mut theme: Theme) -> Theme {
        if let Some(v) = &self.font_family {
            theme.font_family = v.clone();
        }
        if let Some(v) = self.font_size {
            theme.font_size = v;
        }
        let colors = [
            (&self.background, &mut theme.background),
            (&self.card_fill, &mut theme.card_fill),
            (&self.card_border, &mut theme.card_border),
            (&self.text_color, &mut theme.text_color),
            (&self.muted_text_color, &mut theme.muted_text_color),
            (&self.line_color, &mut theme.line_color),
            (&self.handle_color, &mut theme.handle_color),
            (&self.avatar_fill, &mut theme.avatar_fill),
        ];
        for (value, slot) in colors {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        theme
    }

    fn validated(mut self) -> anyhow::Result<Self> {
        for slot in [
            &mut self.background,
            &mut self.card_fill,
            &mut self.card_border,
            &mut self.text_color,
            &mut self.muted_text_color,
            &mut self.line_color,
            &mut self.handle_color,
            &mut self.avatar_fill,
        ] {
            if let Some(v) = slot.take() {
                *slot = Some(checked_color(v)?);
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportConfigFile {
    padding: Option<f32>,
    min_width: Option<u32>,
    min_height: Option<u32>,
    min_scale: Option<f32>,
    max_scale: Option<f32>,
    fit_padding: Option<f32>,
    background: Option<String>,
    jpeg_quality: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    export: Option<ExportConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        match ThemeMode::from_token(theme_name) {
            Some(mode) => config.theme_mode = mode,
            None => bail!("unknown theme '{theme_name}'"),
        }
    }
    if let Some(vars) = parsed.theme_variables {
        config.theme_variables = vars.validated()?;
    }
    config.theme = config.overlay_theme(Theme::for_mode(config.theme_mode, false));

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            config.layout.rank_spacing = v;
        }
        if let Some(v) = layout.node_width {
            config.layout.node_width = v;
        }
        if let Some(v) = layout.node_height {
            config.layout.node_height = v;
        }
        if config.layout.node_width <= 0.0 || config.layout.node_height <= 0.0 {
            bail!("node size must be positive");
        }
    }

    if let Some(export) = parsed.export {
        if let Some(v) = export.padding {
            config.export.padding = v.max(0.0);
        }
        if let Some(v) = export.min_width {
            config.export.min_width = v;
        }
        if let Some(v) = export.min_height {
            config.export.min_height = v;
        }
        if let Some(v) = export.min_scale {
            config.export.min_scale = v;
        }
        if let Some(v) = export.max_scale {
            config.export.max_scale = v;
        }
        if let Some(v) = export.fit_padding {
            config.export.fit_padding = v.max(0.0);
        }
        if let Some(v) = export.background {
            config.export.background = checked_color(v)?;
        }
        if let Some(v) = export.jpeg_quality {
            config.export.jpeg_quality = v.clamp(1, 100);
        }
        if config.export.min_scale <= 0.0 || config.export.min_scale > config.export.max_scale {
            bail!(
                "invalid scale range [{}, {}]",
                config.export.min_scale,
                config.export.max_scale
            );
        }
    }

    Ok(config)
}

fn checked_color(value: String) -> anyhow::Result<String> {
    let trimmed = value.trim();
    if COLOR_RE.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        bail!("invalid color '{value}'")
    }
}
