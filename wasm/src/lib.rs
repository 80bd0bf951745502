use family_tree_renderer::{RenderOptions, ThemeMode, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyRenderOptions {
    theme: Option<String>,
    prefers_dark: Option<bool>,
    font_family: Option<String>,
    font_size: Option<f32>,
    padding: Option<f32>,
}

fn build_render_options(options: FamilyRenderOptions) -> Result<RenderOptions, String> {
    let mode = match options.theme.as_deref() {
        Some(token) => ThemeMode::from_token(token).ok_or_else(|| format!("unknown theme '{token}'"))?,
        None => ThemeMode::default(),
    };
    let mut render_options = RenderOptions::for_mode(mode, options.prefers_dark.unwrap_or(false));

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(padding) = options.padding {
        render_options.padding = padding.max(0.0);
    }

    Ok(render_options)
}

#[wasm_bindgen]
pub fn render_family_svg(snapshot_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<FamilyRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        FamilyRenderOptions::default()
    };

    let render_options = build_render_options(options).map_err(|error| JsValue::from_str(&error))?;
    render_with_options(snapshot_json, render_options)
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
