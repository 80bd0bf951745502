use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    /// Follow the viewer's preference, resolved by the caller.
    System,
}

impl ThemeMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "light" | "default" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn is_dark(self, prefers_dark: bool) -> bool {
        match self {
            Self::Light => false,
            Self::Dark => true,
            Self::System => prefers_dark,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub card_fill: String,
    pub card_border: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub line_color: String,
    pub handle_color: String,
    pub avatar_fill: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            background: "#FFFFFF".to_string(),
            card_fill: "#FFFFFF".to_string(),
            card_border: "#E5E7EB".to_string(),
            text_color: "#111827".to_string(),
            muted_text_color: "#4B5563".to_string(),
            line_color: "#B1B1B7".to_string(),
            handle_color: "#9CA3AF".to_string(),
            avatar_fill: "#F9FAFB".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            background: "#0F172A".to_string(),
            card_fill: "#1E293B".to_string(),
            card_border: "#334155".to_string(),
            text_color: "#F1F5F9".to_string(),
            muted_text_color: "#CBD5E1".to_string(),
            line_color: "#64748B".to_string(),
            handle_color: "#94A3B8".to_string(),
            avatar_fill: "#0F172A".to_string(),
        }
    }

    pub fn for_mode(mode: ThemeMode, prefers_dark: bool) -> Self {
        if mode.is_dark(prefers_dark) {
            Self::dark()
        } else {
            Self::light()
        }
    }
}
