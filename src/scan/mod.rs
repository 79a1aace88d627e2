//! The scan pipeline: enumerate folders, probe them in parallel, and render
//! the table either live (redrawn after every result) or once at the end.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::config::IgnoreList;
use crate::git::{ProbeOptions, Prober, ScanError, SystemGit};
use crate::shell_exec::trace_instant;
use crate::styling::{HINT, INFO_SYMBOL, println};

pub mod collect;
pub mod discover;
pub mod layout;
mod model;
pub mod progressive;
pub mod progressive_table;
pub mod render;

pub use collect::{DrainOutcome, run_all};
pub use discover::build_scan_list;
pub use layout::ColumnLayout;
pub use model::{Entry, RepoInfo, RepoStatus, ResultSlots};
pub use progressive::{RenderMode, TerminalInfo};
pub use progressive_table::LiveTable;
pub use render::render_lines;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned table, redrawn live on a terminal
    #[default]
    Table,
    /// JSON array printed once all folders are probed
    Json,
}

/// Everything one scan needs, already resolved from config and flags.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Canonical, deduplicated roots
    pub roots: Vec<PathBuf>,
    pub include_hidden: bool,
    pub ignore: IgnoreList,
    pub max_workers: usize,
    pub probe: ProbeOptions,
    /// Show the remote and sync columns
    pub extended: bool,
    pub format: OutputFormat,
    /// Redraw live when stdout allows it
    pub live: bool,
}

/// Run a full scan and print the result to stdout.
///
/// `should_stop` is polled between results; when it fires the scan returns
/// `ScanError::Interrupted` without printing anything further.
pub fn run(options: ScanOptions, should_stop: impl FnMut() -> bool) -> anyhow::Result<()> {
    let entries = build_scan_list(&options.roots, options.include_hidden, &options.ignore)?;
    trace_instant("Scan list built");
    log::info!(
        "Scanning {} folders with {} workers",
        entries.len(),
        options.max_workers
    );

    if entries.is_empty() {
        match options.format {
            OutputFormat::Table => println!("No subfolders found."),
            OutputFormat::Json => println!("[]"),
        }
        return Ok(());
    }

    let terminal = TerminalInfo::detect();
    let live_allowed = options.live && options.format == OutputFormat::Table;
    let mode = RenderMode::detect(live_allowed, &terminal, entries.len());
    log::debug!("Render mode: {mode:?}");

    let entries: Arc<[Entry]> = entries.into();
    let slots = Arc::new(ResultSlots::new(entries.len()));
    let prober = Prober::new(SystemGit, options.probe);
    let probe = move |entry: &Entry| prober.probe(&entry.path);

    let outcome = match mode {
        RenderMode::Live => {
            let layout =
                ColumnLayout::new(&entries, options.extended).with_max_width(terminal.width);
            let mut table = LiveTable::new(std::io::stdout());
            run_live(
                &mut table,
                &layout,
                terminal.color,
                Arc::clone(&entries),
                Arc::clone(&slots),
                options.max_workers,
                probe,
                should_stop,
            )?
        }
        RenderMode::Static => run_all(
            Arc::clone(&entries),
            options.max_workers,
            Arc::clone(&slots),
            probe,
            |_, _| Ok(()),
            should_stop,
        )?,
    };

    if outcome == DrainOutcome::Interrupted {
        return Err(ScanError::Interrupted.into());
    }

    match options.format {
        OutputFormat::Json => print_json(&entries, &slots)?,
        OutputFormat::Table => {
            if mode == RenderMode::Static {
                let layout = ColumnLayout::new(&entries, options.extended).fit_branches(&slots);
                for line in render_lines(&layout, &entries, &slots, terminal.color) {
                    println!("{line}");
                }
            }
            let summary = ScanSummary::from_slots(&slots);
            println!("{INFO_SYMBOL} {HINT}{summary}{HINT:#}");
        }
    }
    Ok(())
}

/// Probe every entry while redrawing `table` after each result.
///
/// The first frame shows every row pending. Once all results are in, the
/// branch column is widened to the longest branch name and the block is
/// drawn one last time; every frame has one line per entry.
#[allow(clippy::too_many_arguments)]
pub fn run_live<W, P, S>(
    table: &mut LiveTable<W>,
    layout: &ColumnLayout,
    color: bool,
    entries: Arc<[Entry]>,
    slots: Arc<ResultSlots>,
    max_workers: usize,
    probe: P,
    should_stop: S,
) -> anyhow::Result<DrainOutcome>
where
    W: Write,
    P: Fn(&Entry) -> RepoStatus + Send + Sync + 'static,
    S: FnMut() -> bool,
{
    table
        .draw(&render_lines(layout, &entries, &slots, color))
        .context("failed to draw the table")?;

    let frame_entries = Arc::clone(&entries);
    let outcome = run_all(
        entries,
        max_workers,
        Arc::clone(&slots),
        probe,
        |_, slots| {
            table
                .draw(&render_lines(layout, &frame_entries, slots, color))
                .context("failed to draw the table")
        },
        should_stop,
    )?;

    if outcome == DrainOutcome::Complete {
        let settled = layout.clone().fit_branches(&slots);
        if settled != *layout {
            table
                .draw(&render_lines(&settled, &frame_entries, &slots, color))
                .context("failed to draw the table")?;
        }
    }
    Ok(outcome)
}

#[derive(Serialize)]
struct JsonRow<'a> {
    name: &'a str,
    path: &'a Path,
    status: Option<&'a RepoStatus>,
}

fn print_json(entries: &[Entry], slots: &ResultSlots) -> anyhow::Result<()> {
    let rows: Vec<JsonRow<'_>> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| JsonRow {
            name: &entry.display_name,
            path: &entry.path,
            status: slots.get(idx),
        })
        .collect();
    let json = serde_json::to_string_pretty(&rows).context("failed to serialize results")?;
    println!("{json}");
    Ok(())
}

/// Totals for the footer line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub folders: usize,
    pub repositories: usize,
    pub dirty: usize,
    pub ahead: usize,
    pub behind: usize,
}

impl ScanSummary {
    pub fn from_slots(slots: &ResultSlots) -> Self {
        let mut summary = Self {
            folders: slots.len(),
            ..Self::default()
        };
        for info in slots.iter().flatten().filter_map(RepoStatus::repo) {
            summary.repositories += 1;
            if info.is_clean == Some(false) {
                summary.dirty += 1;
            }
            if info.ahead_count.is_some_and(|n| n > 0) {
                summary.ahead += 1;
            }
            if info.behind_count.is_some_and(|n| n > 0) {
                summary.behind += 1;
            }
        }
        summary
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

impl std::fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec![
            plural(self.folders, "folder", "folders"),
            plural(self.repositories, "repository", "repositories"),
        ];
        for (count, label) in [
            (self.dirty, "dirty"),
            (self.ahead, "ahead"),
            (self.behind, "behind"),
        ] {
            if count > 0 {
                parts.push(format!("{count} {label}"));
            }
        }
        write!(f, "{}", parts.join(", "))
    }
}
