use serde::{Deserialize, Serialize};

/// Mermaid theme selected from the page's theme signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
}

impl Theme {
    /// Maps the root theme attribute to a Mermaid theme.
    ///
    /// Only the exact value `dark` selects [`Theme::Dark`]; any other value, including a missing
    /// attribute, falls back to [`Theme::Default`].
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Default,
        }
    }

    /// Mermaid's `theme` config value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
