// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for rgpick
//!
//! Loads configuration from .rgpickrc.toml in current directory or ~/.config/rgpick/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TOOL: &str = "rg";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
const LOCAL_CONFIG_FILE: &str = ".rgpickrc.toml";
const HISTORY_FILE_NAME: &str = "history.json";

/// Configuration loaded from .rgpickrc.toml or ~/.config/rgpick/config.toml
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Search tool executable (bare name resolved through PATH, or a path)
    pub tool_path: Option<String>,
    /// Directories/paths handed to the tool, in order
    pub roots: Option<Vec<String>>,
    /// Quiet period before a typed pattern is searched
    pub debounce_ms: Option<u64>,
    /// Where the search history is persisted
    pub history_path: Option<PathBuf>,
    /// Maximum number of remembered terms (unbounded when unset)
    pub history_limit: Option<usize>,
}

/// Values passed on the command line; any `Some` wins over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub tool_path: Option<String>,
    pub roots: Vec<String>,
    pub debounce_ms: Option<u64>,
    pub history_path: Option<PathBuf>,
}

/// Fully resolved settings used by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tool_path: String,
    pub roots: Vec<String>,
    pub debounce: Duration,
    pub history_path: PathBuf,
    pub history_limit: Option<usize>,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .rgpickrc.toml in current directory
    /// 2. ~/.config/rgpick/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(Path::new(LOCAL_CONFIG_FILE)) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("rgpick").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge CLI overrides with config (CLI wins) and fill in defaults
    pub fn resolve(&self, overrides: &Overrides) -> Settings {
        let tool_path = overrides
            .tool_path
            .clone()
            .or_else(|| self.tool_path.clone())
            .filter(|tool| !tool.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOOL.to_string());

        let roots = if !overrides.roots.is_empty() {
            overrides.roots.clone()
        } else {
            self.roots
                .clone()
                .filter(|roots| !roots.is_empty())
                .unwrap_or_else(|| vec![".".to_string()])
        };

        let debounce_ms = overrides
            .debounce_ms
            .or(self.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        let history_path = overrides
            .history_path
            .clone()
            .or_else(|| self.history_path.clone())
            .unwrap_or_else(default_history_path);

        Settings {
            tool_path,
            roots,
            debounce: Duration::from_millis(debounce_ms),
            history_path,
            history_limit: self.history_limit.filter(|limit| *limit > 0),
        }
    }
}

/// `<data_dir>/rgpick/history.json`, or `.rgpick/history.json` when the
/// platform has no data directory.
pub fn default_history_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("rgpick"))
        .unwrap_or_else(|| PathBuf::from(".rgpick"))
        .join(HISTORY_FILE_NAME)
}
