//! Rendering engine trait and page-decoration configuration.

pub mod wkhtmltopdf;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by a rendering engine invocation.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to launch rendering engine `{engine}`: {source}")]
    Spawn {
        engine: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rendering engine exited with {status}: {stderr}")]
    Engine { status: String, stderr: String },

    #[error("rendering engine produced no output at {}", path.display())]
    EmptyOutput { path: PathBuf },

    #[error("I/O error during rendering: {0}")]
    Io(#[from] std::io::Error),
}

/// TOC-specific decoration, applied only when TOC generation is enabled.
#[derive(Debug, Clone)]
pub struct TocOptions {
    /// Caption above the generated outline.
    pub header_text: String,
    /// Indentation per outline level.
    pub level_indentation: String,
    /// Text scale factor per level.
    pub text_size_shrink: f32,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            header_text: "Table of Contents".to_string(),
            level_indentation: "2em".to_string(),
            text_size_shrink: 0.9,
        }
    }
}

/// Page decoration for one rendered document.
///
/// Margins are millimetre strings passed straight to the engine. Empty
/// header/footer fields are omitted from the invocation.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub margin_top: String,
    pub margin_right: String,
    pub margin_bottom: String,
    pub margin_left: String,
    /// Document title shown on the left of every page header.
    pub header_left: String,
    /// Per-document header text, e.g. `Chapter 3: Awakening`.
    pub header_right: String,
    /// Footer token; `[page]` expands to the page number.
    pub footer_center: String,
    pub header_font_size: u32,
    pub footer_font_size: u32,
    /// Draw a rule under the header.
    pub header_line: bool,
    /// TOC decoration, present only when a TOC is being generated.
    pub toc: Option<TocOptions>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            margin_top: "20mm".to_string(),
            margin_right: "20mm".to_string(),
            margin_bottom: "20mm".to_string(),
            margin_left: "20mm".to_string(),
            header_left: String::new(),
            header_right: String::new(),
            footer_center: "[page]".to_string(),
            header_font_size: 10,
            footer_font_size: 10,
            header_line: true,
            toc: None,
        }
    }
}

impl RenderConfig {
    /// Decoration for chapter pages of a document titled `title`.
    pub fn document(title: &str) -> Self {
        Self {
            header_left: title.to_string(),
            ..Self::default()
        }
    }

    /// Borderless decoration for a cover page.
    pub fn cover() -> Self {
        Self {
            margin_top: "0".to_string(),
            margin_right: "0".to_string(),
            margin_bottom: "0".to_string(),
            margin_left: "0".to_string(),
            footer_center: String::new(),
            header_line: false,
            ..Self::default()
        }
    }

    /// Set the per-document header text.
    pub fn with_header_right(mut self, text: impl Into<String>) -> Self {
        self.header_right = text.into();
        self
    }

    /// Attach TOC decoration.
    pub fn with_toc(mut self, toc: TocOptions) -> Self {
        self.toc = Some(toc);
        self
    }

    /// Header text for a chapter page.
    pub fn chapter_header(ordinal: u32, title: &str) -> String {
        format!("Chapter {}: {}", ordinal, title)
    }
}

/// A rendering engine turns one standalone HTML document into one PDF.
///
/// Modeled as a capability so tests can substitute a fake backend for the
/// external binary.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Render `html` to a PDF at `output`.
    async fn render(&self, html: &str, output: &Path, config: &RenderConfig)
    -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.margin_top, "20mm");
        assert_eq!(config.footer_center, "[page]");
        assert!(config.header_line);
        assert!(config.toc.is_none());
    }

    #[test]
    fn test_document_config() {
        let config = RenderConfig::document("My Novel");
        assert_eq!(config.header_left, "My Novel");
        assert!(config.header_right.is_empty());
    }

    #[test]
    fn test_cover_config() {
        let config = RenderConfig::cover();
        assert_eq!(config.margin_top, "0");
        assert!(config.footer_center.is_empty());
        assert!(!config.header_line);
    }

    #[test]
    fn test_chapter_header() {
        assert_eq!(RenderConfig::chapter_header(3, "Awakening"), "Chapter 3: Awakening");
    }

    #[test]
    fn test_builder() {
        let config = RenderConfig::document("T")
            .with_header_right("Table of Contents")
            .with_toc(TocOptions::default());
        assert_eq!(config.header_right, "Table of Contents");
        assert_eq!(config.toc.unwrap().level_indentation, "2em");
    }
}
