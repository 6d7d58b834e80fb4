//! chapterpack - Pack scraped chapter HTML into a single paginated PDF

mod chapter;
mod config;
mod extract;
mod merge;
mod pipeline;
mod render;
mod toc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::PackConfig;
use indicatif::{ProgressBar, ProgressStyle};
use merge::LopdfMerger;
use pipeline::{ChapterOutcome, PackRequest, Pipeline};
use render::wkhtmltopdf::WkhtmltopdfEngine;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "chapterpack")]
#[command(about = "Pack a folder of scraped chapter HTML into a single PDF", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a directory of chapter HTML files into one PDF
    Pack(PackArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
struct PackArgs {
    /// Input folder with chapter HTML files
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF file
    #[arg(short, long)]
    output: PathBuf,

    /// Document title for headers and the table of contents
    #[arg(short, long, default_value = "Novel")]
    title: String,

    /// Cover page HTML file
    #[arg(short, long)]
    cover: Option<PathBuf>,

    /// Disable the table of contents
    #[arg(long)]
    no_toc: bool,

    /// Concurrent render jobs (default from config)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Rendering engine binary (overrides config and WKHTMLTOPDF)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the rendering engine binary path
    SetEngine {
        /// Path to the wkhtmltopdf binary
        path: PathBuf,
    },
    /// Set the CSS selector for the chapter content container
    SetSelector {
        /// CSS selector, e.g. "div.content-area"
        selector: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Pack(pack_args) => run_pack(pack_args).await,
        Commands::Config { action } => handle_config_command(&action),
    }
}

async fn run_pack(args: PackArgs) -> Result<()> {
    if !args.input.is_dir() {
        anyhow::bail!("input directory not found: {}", args.input.display());
    }

    let config = PackConfig::load().context("Failed to load configuration")?;

    let engine_path = args.engine.clone().or_else(|| config.engine_path.clone());
    let engine = WkhtmltopdfEngine::new(engine_path);
    if !engine.is_available().await {
        anyhow::bail!(
            "rendering engine not found at `{}`.\n\n\
             Install wkhtmltopdf and either put it on PATH, set the\n\
             WKHTMLTOPDF environment variable, or run:\n\
             \x20 chapterpack config set-engine <path>",
            engine.binary().display()
        );
    }

    if args.debug {
        eprintln!("Input: {}", args.input.display());
        eprintln!("Output: {}", args.output.display());
        eprintln!("Engine: {}", engine.binary().display());
        eprintln!("Selector: {}", config.content_selector);
    }

    let request = PackRequest {
        input_dir: args.input.clone(),
        output: args.output.clone(),
        title: args.title.clone(),
        cover: args.cover.clone(),
        toc: !args.no_toc,
        jobs: args.jobs.unwrap_or(config.jobs),
    };

    let pipeline = Pipeline::new(Arc::new(engine), Box::new(LopdfMerger), config);

    eprintln!("Packing chapters from {}", request.input_dir.display());

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let result = pipeline
        .run(&request, |progress| {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.completed as u64);
            match &progress.outcome {
                ChapterOutcome::Rendered => pb.set_message(progress.name.clone()),
                ChapterOutcome::Skipped => pb.println(format!(
                    "Skipping {} - no content container found",
                    progress.name
                )),
                ChapterOutcome::Failed(error) => {
                    pb.println(format!("Failed to render {}: {}", progress.name, error))
                }
            }
        })
        .await;

    pb.finish_and_clear();
    let summary = result?;

    eprintln!(
        "Rendered {} of {} chapters ({} skipped, {} failed)",
        summary.rendered, summary.total, summary.skipped, summary.failed
    );

    let metadata = std::fs::metadata(&request.output)?;
    let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
    eprintln!("Output: {} ({:.1} MB)", request.output.display(), size_mb);

    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PackConfig::load()?;
            println!("Configuration file: {:?}", PackConfig::config_path()?);
            println!();
            if let Some(engine) = &config.engine_path {
                println!("engine_path = \"{}\"", engine.display());
            } else {
                println!("engine_path = (WKHTMLTOPDF env or PATH)");
            }
            println!("content_selector = \"{}\"", config.content_selector);
            println!("margin = \"{}\"", config.margin);
            println!("header_font_size = {}", config.header_font_size);
            println!("footer_font_size = {}", config.footer_font_size);
            println!("jobs = {}", config.jobs);
        }
        ConfigAction::SetEngine { path } => {
            let mut config = PackConfig::load()?;
            config.engine_path = Some(path.clone());
            config.save()?;
            println!("Rendering engine set to: {}", path.display());
        }
        ConfigAction::SetSelector { selector } => {
            extract::validate_selector(selector).map_err(|e| anyhow::anyhow!(e))?;
            let mut config = PackConfig::load()?;
            config.content_selector = selector.clone();
            config.save()?;
            println!("Content selector set to: {}", selector);
        }
    }
    Ok(())
}
