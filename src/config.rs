//! chapterpack configuration management.

use crate::extract::DEFAULT_CONTENT_SELECTOR;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_MARGIN: &str = "20mm";
const DEFAULT_FONT_SIZE: u32 = 10;
const DEFAULT_JOBS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackConfig {
    /// Path to the rendering engine binary. None means the `WKHTMLTOPDF`
    /// environment variable, then `wkhtmltopdf` on PATH.
    #[serde(default)]
    pub engine_path: Option<PathBuf>,

    /// CSS selector locating the chapter content container.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    /// Page margin on all four sides (engine length string, e.g. "20mm").
    #[serde(default = "default_margin")]
    pub margin: String,

    /// Header font size in points.
    #[serde(default = "default_font_size")]
    pub header_font_size: u32,

    /// Footer font size in points.
    #[serde(default = "default_font_size")]
    pub footer_font_size: u32,

    /// Concurrent render jobs.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_content_selector() -> String {
    DEFAULT_CONTENT_SELECTOR.to_string()
}

fn default_margin() -> String {
    DEFAULT_MARGIN.to_string()
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_jobs() -> usize {
    DEFAULT_JOBS
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            content_selector: default_content_selector(),
            margin: default_margin(),
            header_font_size: default_font_size(),
            footer_font_size: default_font_size(),
            jobs: default_jobs(),
        }
    }
}

impl PackConfig {
    /// Get the config file path: ~/.config/cli-programs/chapterpack.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(home
            .join(".config")
            .join("cli-programs")
            .join("chapterpack.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: PackConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Base page decoration for a document titled `title`.
    pub fn base_render_config(&self, title: &str) -> crate::render::RenderConfig {
        crate::render::RenderConfig {
            margin_top: self.margin.clone(),
            margin_right: self.margin.clone(),
            margin_bottom: self.margin.clone(),
            margin_left: self.margin.clone(),
            header_left: title.to_string(),
            header_font_size: self.header_font_size,
            footer_font_size: self.footer_font_size,
            ..Default::default()
        }
    }
}
