//! Renderer options and the per-pass render configuration.

use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mermaid log levels (`logLevel` site config). `Silent` disables engine logging entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    #[default]
    Silent,
}

impl LogLevel {
    /// Numeric value Mermaid expects. Anything above `fatal` silences logging.
    pub fn as_mermaid_value(self) -> u8 {
        match self {
            Self::Trace => 0,
            Self::Debug => 1,
            Self::Info => 2,
            Self::Warn => 3,
            Self::Error => 4,
            Self::Fatal => 5,
            Self::Silent => 99,
        }
    }
}

/// Page-facing knobs of the renderer: which classes and attributes it reads and writes.
///
/// Every field has a default, so a JSON config only needs the keys it changes:
///
/// ```
/// let options = merrow::RendererOptions::from_json_str(r#"{ "maxTextSize": 5000 }"#)?;
/// assert_eq!(options.max_text_size, 5000);
/// assert_eq!(options.placeholder_class, "jp-Mermaid");
/// # Ok::<(), merrow::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RendererOptions {
    /// Marks a diagram region.
    pub placeholder_class: String,
    /// Marks the element holding raw diagram source inside a placeholder.
    pub source_class: String,
    /// Present on a placeholder whenever no render attempt is in flight for it.
    pub rendered_class: String,
    /// Marks the diagnostic panel.
    pub warning_class: String,
    /// Root attribute carrying the theme signal.
    pub theme_attribute: String,
    /// Custom property on the page body carrying the base font family.
    pub font_family_property: String,
    /// Prefix of render identifiers.
    pub id_prefix: String,
    /// Sources longer than this (in characters) fail to render.
    pub max_text_size: usize,
    pub log_level: LogLevel,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            placeholder_class: "jp-Mermaid".to_string(),
            source_class: "mermaid".to_string(),
            rendered_class: "jp-RenderedMermaid".to_string(),
            warning_class: "jp-mod-warning".to_string(),
            theme_attribute: "data-theme".to_string(),
            font_family_property: "--pst-font-family-base".to_string(),
            id_prefix: "jp-mermaid-".to_string(),
            max_text_size: 100_000,
            log_level: LogLevel::Silent,
        }
    }
}

impl RendererOptions {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Captures the render configuration for one pass.
    pub fn render_config(&self, theme: Theme, font_family: String) -> RenderConfig {
        RenderConfig {
            theme,
            font_family,
            max_text_size: self.max_text_size,
            log_level: self.log_level,
        }
    }
}

/// Engine configuration shared by every attempt of one pass.
///
/// Passed explicitly into each engine call; nothing about it is global.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderConfig {
    pub theme: Theme,
    /// CSS font stack; empty means "engine default".
    pub font_family: String,
    pub max_text_size: usize,
    pub log_level: LogLevel,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RendererOptions::default().render_config(Theme::Default, String::new())
    }
}

impl RenderConfig {
    /// Mermaid site config (`mermaid.initialize` shape) equivalent to this configuration.
    pub fn to_site_config(&self) -> Value {
        let mut cfg = json!({
            "theme": self.theme.as_str(),
            "maxTextSize": self.max_text_size,
            "logLevel": self.log_level.as_mermaid_value(),
            "startOnLoad": false,
        });
        if !self.font_family.is_empty() {
            cfg["fontFamily"] = Value::String(self.font_family.clone());
        }
        cfg
    }
}
