use std::{collections::HashMap, sync::Arc};

use eframe::epaint::Color32;
use serde::{Deserialize, Serialize};

use crate::state::WireState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireColors {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub none: Option<Color32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub r#false: Option<Color32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub r#true: Option<Color32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<Color32>,
}

impl WireColors {
    pub const NONE: Color32 = Color32::from_rgb(0, 0, 200);
    pub const FALSE: Color32 = Color32::from_rgb(0, 127, 0);
    pub const TRUE: Color32 = Color32::from_rgb(0, 255, 0);
    pub const ERROR: Color32 = Color32::from_rgb(200, 0, 0);

    pub fn is_empty(&self) -> bool {
        self.none.is_none() && self.r#true.is_none() && self.r#false.is_none() && self.error.is_none()
    }

    pub fn or(&self, other: WireColors) -> WireColors {
        WireColors {
            none: self.none.or(other.none),
            r#false: self.r#false.or(other.r#false),
            r#true: self.r#true.or(other.r#true),
            error: self.error.or(other.error),
        }
    }

    pub fn colour(&self, state: WireState) -> Color32 {
        match state {
            WireState::None => self.none.unwrap_or(Self::NONE),
            WireState::True => self.r#true.unwrap_or(Self::TRUE),
            WireState::False => self.r#false.unwrap_or(Self::FALSE),
            WireState::Error => self.error.unwrap_or(Self::ERROR),
        }
    }
}

/// Palette entry: per-state colours plus a draw priority.
///
/// Wires of a higher priority theme are drawn above wires of a lower one
/// within the same depth layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTheme {
    pub name: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub colors: WireColors,
}

impl WireTheme {
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn new(name: impl Into<String>, priority: u32, colors: WireColors) -> Self {
        Self {
            name: name.into(),
            priority,
            colors,
        }
    }

    pub fn colour(&self, state: WireState) -> Color32 {
        self.colors.colour(state)
    }
}

impl Default for WireTheme {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, 0, WireColors::default())
    }
}

#[derive(Debug, Clone)]
pub struct ThemePalette {
    default: Arc<WireTheme>,
    themes: HashMap<String, Arc<WireTheme>>,
}

impl ThemePalette {
    pub fn new() -> Self {
        let default = Arc::new(WireTheme::default());
        let mut themes = HashMap::new();
        themes.insert(default.name.clone(), default.clone());
        Self { default, themes }
    }

    /// Parses a RON list of themes. A theme named `default` replaces the
    /// built-in fallback.
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        let themes: Vec<WireTheme> = ron::from_str(text)?;
        let mut palette = Self::new();
        for theme in themes {
            palette.insert(theme);
        }
        Ok(palette)
    }

    pub fn insert(&mut self, theme: WireTheme) -> Arc<WireTheme> {
        let theme = Arc::new(theme);
        if theme.name == WireTheme::DEFAULT_NAME {
            self.default = theme.clone();
        }
        self.themes.insert(theme.name.clone(), theme.clone());
        theme
    }

    pub fn get(&self, name: &str) -> Option<Arc<WireTheme>> {
        self.themes.get(name).cloned()
    }

    /// Like [`ThemePalette::get`], falling back to the default theme.
    pub fn get_or_default(&self, name: &str) -> Arc<WireTheme> {
        self.get(name).unwrap_or_else(|| self.default.clone())
    }

    pub fn default_theme(&self) -> Arc<WireTheme> {
        self.default.clone()
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self::new()
    }
}
