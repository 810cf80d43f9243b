//! Theme configuration
//!
//! Site-wide options consumed by renderers (company name, social links,
//! placeholder texts, media size) and by the editor (history depth). Every
//! field has a default, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub theme: ThemeOptions,
    pub render: RenderConfig,
    pub editor: EditorConfig,
}

impl ThemeConfig {
    /// Parse a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ThemeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loading theme configuration");
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.editor.history_limit == 0 {
            return Err(ConfigError::Invalid("editor.history_limit must be at least 1".into()));
        }
        if self.render.media_size.is_empty() {
            return Err(ConfigError::Invalid("render.media_size must not be empty".into()));
        }
        Ok(())
    }
}

/// Site options shown by theme-level blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeOptions {
    pub company_name: String,
    /// Extra line under the copyright notice
    pub footer_text: String,
    pub social_links: Vec<SocialLink>,
}

impl Default for ThemeOptions {
    fn default() -> Self {
        Self {
            company_name: "StarApple".into(),
            footer_text: String::new(),
            social_links: Vec::new(),
        }
    }
}

/// Social network link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    /// Network name ("linkedin")
    pub network: String,
    pub url: String,
    /// Icon image URL; the network name is shown when absent
    #[serde(default)]
    pub icon: Option<String>,
}

/// Renderer options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Media size variant requested from the media store
    pub media_size: String,
    /// Shown while remote items load
    pub loading_text: String,
    /// Shown when a remote query returns nothing
    pub no_items_text: String,
    /// Shown when a remote query fails
    pub fetch_failed_text: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            media_size: "large".into(),
            loading_text: "Loading process steps...".into(),
            no_items_text: "No process step posts found.".into(),
            fetch_failed_text: "Process steps could not be loaded.".into(),
        }
    }
}

/// Editor options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of snapshots kept for undo
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { history_limit: 100 }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// Malformed JSON
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed but unusable values
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
