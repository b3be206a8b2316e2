// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use git_heat::cli::Args;
use git_heat::config::Settings;
use git_heat::heatmap::clamp_line;
use git_heat::renderer::{render_png, render_terminal, BinStyles, TerminalOptions};
use git_heat::{assign_bins, CountAggregator, DocumentKey, ErrorSink, GitProvider, Heatmap};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Unexpected failures go straight to the user
struct StderrSink;

impl ErrorSink for StderrSink {
    fn report(&self, message: &str) {
        eprintln!("{message}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let settings = args.apply(settings);
    if settings.is_disabled() && args.png.is_none() && !args.blame {
        tracing::info!("Color and text are both off; nothing to render");
        return Ok(());
    }

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        println!("{} is empty.", args.file.display());
        return Ok(());
    }

    let start_time = Instant::now();
    let progress = ProgressBar::new(0)
        .with_style(ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")?);
    let aggregator = CountAggregator::new()
        .with_query_timeout(settings.query_timeout())
        .with_progress(progress);
    let heatmap = Heatmap::new(Arc::new(GitProvider::default()))
        .with_aggregator(aggregator)
        .with_sink(Arc::new(StderrSink));

    let doc = DocumentKey::new(args.file.canonicalize()?.display().to_string());
    let Some(counts) = heatmap.refresh(&doc, &args.file, lines.len()).await else {
        anyhow::bail!("No git history available for {}", args.file.display());
    };
    tracing::info!("Counted {} lines in {:.2?}", counts.len(), start_time.elapsed());

    let assignment = assign_bins(&counts, &settings.scale_config());
    let styles = BinStyles::default();
    let selected_line = args.line.map(|line| clamp_line(line, counts.len()));

    let mut stdout = std::io::stdout().lock();
    render_terminal(
        &mut stdout,
        &lines,
        &counts,
        &assignment,
        &styles,
        TerminalOptions {
            color: settings.enable_color,
            selected_line: selected_line.filter(|_| settings.enable_text),
        },
    )?;

    if args.blame {
        let line = selected_line.unwrap_or(1);
        if let Some(ctx) = heatmap.repo_context(&args.file, lines.len()).await? {
            let meta = heatmap.blame(&ctx, line).await;
            if !meta.is_empty() {
                writeln!(stdout, "Line {line}: {} ({}) {}", meta.author, meta.date, meta.summary)?;
            }
        }
    }

    if let Some(png) = &args.png {
        render_png(png, &assignment, &styles, args.width, args.row_height)
            .with_context(|| format!("Failed to write {}", png.display()))?;
        writeln!(stdout, "Heat strip saved to {}", png.display())?;
    }

    Ok(())
}
