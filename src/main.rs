use std::process;

use anyhow::Context;
use clap::Parser;
use repo_check::cli::Cli;
use repo_check::config::{self, ConfigPaths, IgnoreList, ScanConfig};
use repo_check::git::{self, ProbeOptions, ScanError};
use repo_check::path::{format_path_for_display, resolve_roots};
use repo_check::scan::{self, ScanOptions};
use repo_check::styling::{eprintln, error_message, println, warning_message};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    if let Err(err) = run(cli) {
        if matches!(err.downcast_ref::<ScanError>(), Some(ScanError::Interrupted)) {
            println!();
            println!("{err}");
        } else {
            eprintln!("{}", error_message(format!("{err:#}")));
        }
        process::exit(git::exit_code(&err).unwrap_or(1));
    }
}

fn init_logging(level: log::LevelFilter) {
    // RUST_LOG, when set, takes precedence over -v
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_paths = ConfigPaths::discover();
    let config = load_config(config_paths.as_ref());

    git::ensure_git_available()?;

    let raw_paths = if cli.paths.is_empty() {
        &config.paths
    } else {
        &cli.paths
    };
    let roots = resolve_roots(raw_paths)?;
    let ignore = load_ignore(config_paths.as_ref());

    let exclude_hidden = cli.exclude_hidden().unwrap_or(config.exclude_hidden);
    let max_workers = cli
        .max_workers
        .map(|n| n as usize)
        .unwrap_or(config.max_workers);

    let options = ScanOptions {
        roots,
        include_hidden: !exclude_hidden,
        ignore,
        max_workers,
        probe: ProbeOptions {
            fetch: !cli.no_fetch,
            ..ProbeOptions::from_env()
        },
        extended: !cli.compact,
        format: cli.format,
        // Log lines on the same terminal would break positional redraw
        live: !cli.no_progressive && log::max_level() <= log::LevelFilter::Warn,
    };

    scan::run(options, interrupt_requested()?)
}

fn load_config(paths: Option<&ConfigPaths>) -> ScanConfig {
    let defaults = ScanConfig::defaults();
    let Some(paths) = paths else {
        log::warn!("Cannot determine the config directory; using defaults");
        return defaults;
    };

    match config::load_or_init(paths, &defaults) {
        Ok((config, None)) => config,
        Ok((config, Some(write_err))) => {
            eprintln!(
                "{}",
                warning_message(format!(
                    "Could not save {}: {write_err:#}",
                    format_path_for_display(&paths.config_file)
                ))
            );
            config
        }
        Err(err) => {
            eprintln!(
                "{}",
                warning_message(format!("{err:#}; using default settings"))
            );
            defaults
        }
    }
}

fn load_ignore(paths: Option<&ConfigPaths>) -> IgnoreList {
    let Some(paths) = paths else {
        return IgnoreList::default();
    };
    IgnoreList::load(&paths.ignore_file).unwrap_or_else(|err| {
        eprintln!(
            "{}",
            warning_message(format!("{err:#}; ignoring nothing"))
        );
        IgnoreList::default()
    })
}

/// Poll-style interrupt check for the drain loop.
///
/// Registering the handler replaces the default SIGINT/SIGTERM action, so the
/// scan decides when to stop and never exits mid-frame.
#[cfg(unix)]
fn interrupt_requested() -> anyhow::Result<impl FnMut() -> bool> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    Ok(move || signals.pending().next().is_some())
}

#[cfg(not(unix))]
fn interrupt_requested() -> anyhow::Result<impl FnMut() -> bool> {
    Ok(|| false)
}
