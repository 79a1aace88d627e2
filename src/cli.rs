use clap::Parser;

use crate::scan::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "repo-check",
    version,
    about = "Report branch, cleanliness, and upstream status for every repository under your folders",
    long_about = None,
    after_help = color_print::cstr!(
        "Defaults come from <bold>~/.config/repo-check/config</>; folders listed in \
         <bold>~/.config/repo-check/ignore</> are skipped."
    )
)]
pub struct Cli {
    /// Folder whose subfolders are scanned (repeatable; replaces configured paths)
    #[arg(long = "path", value_name = "DIR")]
    pub paths: Vec<String>,

    /// Skip folders whose names start with '.'
    #[arg(long, overrides_with = "no_exclude_hidden")]
    pub exclude_hidden: bool,

    /// Include folders whose names start with '.'
    #[arg(long, overrides_with = "exclude_hidden")]
    pub no_exclude_hidden: bool,

    /// Maximum number of folders probed at once
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_workers: Option<u32>,

    /// Do not fetch the upstream remote before counting ahead/behind
    #[arg(long)]
    pub no_fetch: bool,

    /// Hide the remote and sync columns
    #[arg(long)]
    pub compact: bool,

    /// Print the table once after every folder is probed
    #[arg(long)]
    pub no_progressive: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// `--exclude-hidden` / `--no-exclude-hidden`, whichever came last.
    pub fn exclude_hidden(&self) -> Option<bool> {
        if self.exclude_hidden {
            Some(true)
        } else if self.no_exclude_hidden {
            Some(false)
        } else {
            None
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}
