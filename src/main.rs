use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use outline_quick_open::cli::{CliArgs, OutputFormat};
use outline_quick_open::config::QuickOpenConfig;
use outline_quick_open::filtered_list::RenderedRow;
use outline_quick_open::navigation::RecordingRevealer;
use outline_quick_open::outline::{display_path, OutlineItem, OutlineWorker};
use outline_quick_open::provider::{OutlineQuickOpen, QuickOpenContext};
use outline_quick_open::session::QuickOpenSession;
use outline_quick_open::workspace::{FileId, OpenFiles};

/// How long to wait for all files when no per-file timeout is configured
const UNBOUNDED_WAIT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct JsonRow<'a> {
    #[serde(flatten)]
    item: &'a OutlineItem,
    score: f64,
    highlights: Vec<(usize, usize)>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    query: &'a str,
    rows: Vec<JsonRow<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_text: Option<&'static str>,
    failed_files: usize,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let run = args.into_config().map_err(anyhow::Error::msg)?;

    outline_quick_open::tracing::init();

    let mut config = match &run.config_path {
        Some(path) => QuickOpenConfig::load_from(path),
        None => QuickOpenConfig::load(),
    };
    if let Some(timeout_ms) = run.timeout_ms {
        config.file_timeout_ms = timeout_ms;
    }
    if let Some(limit) = run.limit {
        config.max_results = limit;
    }
    if run.save_config {
        config
            .save()
            .map_err(anyhow::Error::msg)
            .context("Failed to save config")?;
    }

    let files = Arc::new(OpenFiles::new());
    let ids: Vec<FileId> = run
        .files
        .iter()
        .map(|path| {
            // Absolute paths get proper file:// URLs
            let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            files.open_path(&path)
        })
        .collect();
    let focused = *ids
        .get(run.focus_index)
        .context("Focused file is not open")?;
    files.focus(focused);

    let revealer = Arc::new(RecordingRevealer::new());
    let provider = OutlineQuickOpen::new(QuickOpenContext::for_open_files(
        Arc::clone(&files),
        revealer.clone(),
    ))
    .with_exclude_filter(config.name_filter())
    .with_file_timeout(config.file_timeout());

    let mut session = QuickOpenSession::new(provider, OutlineWorker::spawn(config.chunk_size));
    session.activate();

    let per_file = config.file_timeout().unwrap_or(UNBOUNDED_WAIT);
    let wait = per_file.saturating_mul(u32::try_from(ids.len() + 1).unwrap_or(u32::MAX));
    if !session.run_until_idle(wait) {
        eprintln!("Warning: outline collection did not finish, results are partial");
    }
    for file in session.provider().failed_files() {
        tracing::warn!("No outline for file {}", file);
    }

    session.set_query(&run.query);

    if let Some(row) = run.selection {
        return print_selection(&session, &revealer, row);
    }

    let rows = session.rows(config.max_results);
    match run.output {
        OutputFormat::Text => print_text(&session, &rows),
        OutputFormat::Json => print_json(&session, &rows)?,
    }
    Ok(())
}

fn print_selection(
    session: &QuickOpenSession<OutlineWorker>,
    revealer: &RecordingRevealer,
    row: usize,
) -> Result<()> {
    session.select(Some(row));
    let Some(location) = revealer.last() else {
        bail!("No row {} to select", row + 1);
    };
    println!(
        "{}:{}:{}",
        display_path(&location.url),
        location.line + 1,
        location.column + 1
    );
    Ok(())
}

fn print_text(session: &QuickOpenSession<OutlineWorker>, rows: &[RenderedRow]) {
    if let Some(text) = session.empty_text() {
        println!("{}", text);
        return;
    }
    for row in rows {
        let kind = session
            .provider()
            .item(row.index)
            .map(|item| item.kind.label())
            .unwrap_or_default();
        println!("{:>6}  {}  {}", kind, row.title.marked(), row.subtitle.text);
    }
}

fn print_json(session: &QuickOpenSession<OutlineWorker>, rows: &[RenderedRow]) -> Result<()> {
    let rows = rows
        .iter()
        .filter_map(|row| {
            let item = session.provider().item(row.index)?;
            Some(JsonRow {
                item,
                score: row.score,
                highlights: row
                    .title
                    .highlights
                    .iter()
                    .map(|range| (range.start, range.end))
                    .collect(),
            })
        })
        .collect();

    let output = JsonOutput {
        query: session.list().query(),
        rows,
        empty_text: session.empty_text(),
        failed_files: session.provider().failed_files().len(),
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize results")?;
    println!("{}", json);
    Ok(())
}
