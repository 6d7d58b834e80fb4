//! wkhtmltopdf engine adapter.

use super::{RenderConfig, RenderEngine, RenderError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Environment variable overriding the engine binary location.
pub const ENGINE_ENV_VAR: &str = "WKHTMLTOPDF";

/// Renders documents by invoking the wkhtmltopdf binary.
pub struct WkhtmltopdfEngine {
    binary: PathBuf,
}

impl WkhtmltopdfEngine {
    /// Create an engine adapter.
    ///
    /// Binary resolution: explicit path, then the `WKHTMLTOPDF` environment
    /// variable, then `wkhtmltopdf` on `PATH`.
    pub fn new(binary: Option<PathBuf>) -> Self {
        let binary = binary
            .or_else(|| std::env::var_os(ENGINE_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("wkhtmltopdf"));
        Self { binary }
    }

    /// Path of the binary this adapter will invoke.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Check whether the engine binary can be invoked.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Translate a [`RenderConfig`] into engine flags.
    fn build_args(config: &RenderConfig) -> Vec<String> {
        let mut args = vec![
            "--encoding".to_string(),
            "UTF-8".to_string(),
            "--quiet".to_string(),
            "--disable-javascript".to_string(),
            "--enable-local-file-access".to_string(),
            "--load-error-handling".to_string(),
            "ignore".to_string(),
            "--margin-top".to_string(),
            config.margin_top.clone(),
            "--margin-right".to_string(),
            config.margin_right.clone(),
            "--margin-bottom".to_string(),
            config.margin_bottom.clone(),
            "--margin-left".to_string(),
            config.margin_left.clone(),
        ];

        if !config.header_left.is_empty() {
            args.push("--header-left".to_string());
            args.push(config.header_left.clone());
        }
        if !config.header_right.is_empty() {
            args.push("--header-right".to_string());
            args.push(config.header_right.clone());
        }
        if !config.header_left.is_empty() || !config.header_right.is_empty() {
            args.push("--header-font-size".to_string());
            args.push(config.header_font_size.to_string());
            if config.header_line {
                args.push("--header-line".to_string());
            }
        }
        if !config.footer_center.is_empty() {
            args.push("--footer-center".to_string());
            args.push(config.footer_center.clone());
            args.push("--footer-font-size".to_string());
            args.push(config.footer_font_size.to_string());
        }

        if let Some(ref toc) = config.toc {
            args.push("--toc-header-text".to_string());
            args.push(toc.header_text.clone());
            args.push("--toc-level-indentation".to_string());
            args.push(toc.level_indentation.clone());
            args.push("--toc-text-size-shrink".to_string());
            args.push(toc.text_size_shrink.to_string());
        }

        args
    }
}

#[async_trait]
impl RenderEngine for WkhtmltopdfEngine {
    async fn render(
        &self,
        html: &str,
        output: &Path,
        config: &RenderConfig,
    ) -> Result<(), RenderError> {
        let mut child = Command::new(&self.binary)
            .args(Self::build_args(config))
            .arg("-") // document arrives on stdin
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                engine: self.binary.display().to_string(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(html.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            return Err(RenderError::Engine {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        // The engine can exit zero yet write nothing, e.g. when every
        // resource fails to load.
        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(RenderError::EmptyOutput {
                path: output.to_path_buf(),
            }),
        }
    }
}
