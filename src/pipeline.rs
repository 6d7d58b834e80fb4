//! Pipeline orchestration: discover, sort, render, synthesize, assemble.

use crate::chapter::ChapterSource;
use crate::config::PackConfig;
use crate::extract;
use crate::merge::{MergeBackend, PdfPart};
use crate::render::{RenderConfig, RenderEngine, TocOptions};
use crate::toc::{self, TocEntry};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One full pack run.
#[derive(Debug, Clone)]
pub struct PackRequest {
    /// Directory of chapter HTML files.
    pub input_dir: PathBuf,
    /// Destination for the final document.
    pub output: PathBuf,
    /// Document title for headers and the TOC.
    pub title: String,
    /// Optional cover page HTML file.
    pub cover: Option<PathBuf>,
    /// Whether to synthesize a table of contents.
    pub toc: bool,
    /// Concurrent render jobs.
    pub jobs: usize,
}

/// Per-chapter result of the extract-and-render phase.
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterOutcome {
    Rendered,
    /// Content container absent; chapter excluded, run continues.
    Skipped,
    /// Engine failure; chapter excluded, run continues.
    Failed(String),
}

/// Progress report emitted once per completed chapter.
#[derive(Debug, Clone)]
pub struct ChapterProgress {
    pub completed: usize,
    pub total: usize,
    pub name: String,
    pub outcome: ChapterOutcome,
}

/// Final counts for a run.
#[derive(Debug, Default, Clone)]
pub struct PackSummary {
    pub total: usize,
    pub rendered: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Drives discovery through finalization with injected render and merge
/// backends.
pub struct Pipeline {
    engine: Arc<dyn RenderEngine>,
    merger: Box<dyn MergeBackend>,
    config: PackConfig,
}

impl Pipeline {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        merger: Box<dyn MergeBackend>,
        config: PackConfig,
    ) -> Self {
        Self { engine, merger, config }
    }

    /// Run the full pipeline, invoking `on_progress` as chapters complete.
    ///
    /// Succeeds when at least one chapter renders; skipped and failed
    /// chapters are excluded from the output and counted in the summary.
    pub async fn run<F>(&self, req: &PackRequest, mut on_progress: F) -> Result<PackSummary>
    where
        F: FnMut(ChapterProgress),
    {
        extract::validate_selector(&self.config.content_selector)
            .map_err(|e| anyhow::anyhow!(e))?;

        // Discover
        let files = discover_sources(&req.input_dir).with_context(|| {
            format!("failed to read input directory {}", req.input_dir.display())
        })?;
        if files.is_empty() {
            bail!(
                "no chapter sources (*.html) found in {}",
                req.input_dir.display()
            );
        }

        // IdentifyAndSort
        let mut chapters = Vec::with_capacity(files.len());
        for (index, path) in files.iter().enumerate() {
            let source = ChapterSource::from_file(path, index)
                .with_context(|| format!("failed to read {}", path.display()))?;
            chapters.push(source);
        }
        // Stable sort: equal ordinals keep discovery order.
        chapters.sort_by_key(|c| c.ordinal);

        // Shared artifact directory, created once before concurrent work.
        let temp = tempfile::Builder::new()
            .prefix("chapterpack-")
            .tempdir()
            .context("failed to create temporary artifact directory")?;

        // ExtractAndRender: order-independent, bounded concurrency. Artifact
        // names combine ordinal and discovery index so tied ordinals never
        // collide.
        let total = chapters.len();
        let artifacts: Vec<PathBuf> = chapters
            .iter()
            .map(|c| {
                temp.path()
                    .join(format!("chapter_{:05}_{:04}.pdf", c.ordinal, c.index))
            })
            .collect();

        let semaphore = Arc::new(Semaphore::new(req.jobs.max(1)));
        let mut tasks = JoinSet::new();
        for (position, chapter) in chapters.iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let selector = self.config.content_selector.clone();
            let html = chapter.html.clone();
            let artifact = artifacts[position].clone();
            let config = self
                .config
                .base_render_config(&req.title)
                .with_header_right(RenderConfig::chapter_header(chapter.ordinal, &chapter.title));

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let Some(document) = extract::extract_content(&html, &selector) else {
                    return (position, ChapterOutcome::Skipped);
                };
                match engine.render(&document, &artifact, &config).await {
                    Ok(()) => (position, ChapterOutcome::Rendered),
                    Err(e) => (position, ChapterOutcome::Failed(e.to_string())),
                }
            });
        }

        let mut outcomes: Vec<Option<ChapterOutcome>> = vec![None; total];
        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            let (position, outcome) = joined.context("render task panicked")?;
            completed += 1;
            on_progress(ChapterProgress {
                completed,
                total,
                name: chapters[position]
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                outcome: outcome.clone(),
            });
            outcomes[position] = Some(outcome);
        }

        let mut summary = PackSummary { total, ..Default::default() };
        // Positions into `chapters`, already in ordinal order.
        let mut rendered: Vec<usize> = Vec::new();
        for (position, outcome) in outcomes.iter().enumerate() {
            match outcome.as_ref().expect("every chapter task reports an outcome") {
                ChapterOutcome::Rendered => {
                    summary.rendered += 1;
                    rendered.push(position);
                }
                ChapterOutcome::Skipped => summary.skipped += 1,
                ChapterOutcome::Failed(_) => summary.failed += 1,
            }
        }

        if rendered.is_empty() {
            bail!(
                "no chapters could be rendered from {}",
                req.input_dir.display()
            );
        }

        // SynthesizeToc, over successfully rendered chapters only.
        let toc_artifact = temp.path().join("toc.pdf");
        if req.toc {
            let entries: Vec<TocEntry> = rendered
                .iter()
                .map(|&p| TocEntry {
                    ordinal: chapters[p].ordinal,
                    title: chapters[p].title.clone(),
                })
                .collect();
            let toc_html = toc::build_toc(&req.title, &entries);
            let config = self
                .config
                .base_render_config(&req.title)
                .with_header_right("Table of Contents")
                .with_toc(TocOptions::default());
            self.engine
                .render(&toc_html, &toc_artifact, &config)
                .await
                .context("failed to render table of contents")?;
        }

        // Cover, borderless, rendered from the raw file without extraction.
        let cover_artifact = temp.path().join("cover.pdf");
        if let Some(cover_path) = &req.cover {
            let cover_html = std::fs::read_to_string(cover_path)
                .with_context(|| format!("failed to read cover page {}", cover_path.display()))?;
            self.engine
                .render(&cover_html, &cover_artifact, &RenderConfig::cover())
                .await
                .context("failed to render cover page")?;
        }

        // Assemble: the plan order is fixed here, never by listing or
        // completion order.
        let mut parts: Vec<PdfPart> = Vec::new();
        if req.cover.is_some() {
            parts.push(PdfPart::file(&cover_artifact));
        }
        if req.toc {
            parts.push(PdfPart::file(&toc_artifact));
        }
        for &position in &rendered {
            parts.push(PdfPart::file(&artifacts[position]));
        }

        let merged = match self.merger.merge(&parts) {
            Ok(bytes) => bytes,
            Err(e) => {
                // Keep the artifacts so the failing part can be inspected.
                let kept = temp.keep();
                return Err(anyhow::Error::new(e).context(format!(
                    "merge failed; temporary artifacts retained in {}",
                    kept.display()
                )));
            }
        };

        // Finalize: the destination is only replaced on full success.
        write_atomic(&req.output, &merged)
            .with_context(|| format!("failed to write {}", req.output.display()))?;

        cleanup_artifacts(temp.path());
        Ok(summary)
    }
}

/// List chapter sources: regular files with a `.html` extension, any case.
///
/// Directory enumeration order is platform-dependent, so discovery order is
/// fixed by sorting on the path; equal ordinals later tie-break on it.
pub fn discover_sources(input_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_html = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("html"))
            .unwrap_or(false);
        if is_html {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Remove per-run artifacts. Idempotent: a missing directory or an already
/// deleted file is not an error.
pub fn cleanup_artifacts(dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let _ = std::fs::remove_file(entry.path());
    }
}

/// Write `bytes` next to `output` and rename into place, so a partial write
/// never replaces an existing document.
fn write_atomic(output: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let staging = output.with_extension("pdf.tmp");
    std::fs::write(&staging, bytes)?;
    std::fs::rename(&staging, output)
}
