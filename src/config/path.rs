//! Config path management.
//!
//! Determines where the config and ignore files live across platforms, with
//! an environment override used by tests and CI.

use std::path::{Path, PathBuf};

use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};

/// Environment variable pointing at a directory that replaces the platform
/// config directory.
pub const CONFIG_DIR_ENV: &str = "REPO_CHECK_CONFIG_DIR";

const APP_DIR: &str = "repo-check";
const LEGACY_APP_DIR: &str = "my_repos_check";

/// Locations of the files read at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub ignore_file: PathBuf,
    /// Config file from the tool's previous name, migrated on first run.
    pub legacy_config_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Paths inside an explicit directory, without legacy migration.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_file: dir.join("config"),
            ignore_file: dir.join("ignore"),
            legacy_config_file: None,
        }
    }

    /// Discover the config location.
    ///
    /// Priority:
    /// 1. `REPO_CHECK_CONFIG_DIR` environment variable
    /// 2. Platform config directory
    pub fn discover() -> Option<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(Self::in_dir(Path::new(&dir)));
        }

        // choose_base_strategy uses:
        // - XDG on Linux and macOS (respects XDG_CONFIG_HOME, falls back to ~/.config)
        // - Windows conventions on Windows (%APPDATA%)
        let strategy = choose_base_strategy().ok()?;
        let base = strategy.config_dir();
        Some(Self {
            legacy_config_file: Some(base.join(LEGACY_APP_DIR).join("config")),
            ..Self::in_dir(&base.join(APP_DIR))
        })
    }
}
