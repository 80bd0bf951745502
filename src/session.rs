use crate::theme::{Theme, ThemeMode};

/// The signed-in user and their display preferences. Created at sign-in
/// and consumed at sign-out; every store call takes it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
    theme_mode: ThemeMode,
}

impl Session {
    pub fn sign_in(user_id: impl Into<String>, theme_mode: ThemeMode) -> Self {
        let user_id = user_id.into();
        tracing::debug!(user = %user_id, ?theme_mode, "session started");
        Self {
            user_id,
            theme_mode,
        }
    }

    pub fn sign_out(self) {
        tracing::debug!(user = %self.user_id, "session ended");
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme_mode
    }

    /// Preset palette for the session's mode; `prefers_dark` only matters
    /// for [`ThemeMode::System`].
    pub fn theme(&self, prefers_dark: bool) -> Theme {
        Theme::for_mode(self.theme_mode, prefers_dark)
    }
}
