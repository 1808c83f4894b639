// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types with helpful suggestions
//!
//! Provides user-friendly error messages with actionable suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running the external search tool
#[derive(Debug, Error)]
pub enum SearchError {
    /// The configured tool could not be resolved to an executable
    #[error(
        "Search tool '{tool}' not found: {source}\n\n\
         Suggestion: install ripgrep (https://github.com/BurntSushi/ripgrep)\n\
         or point `tool_path` in .rgpickrc.toml at the executable.\n\
         Example: rgpick --tool /usr/local/bin/rg interactive"
    )]
    ToolNotFound {
        tool: String,
        #[source]
        source: which::Error,
    },

    /// The tool was resolved but the process could not be started
    #[error("Failed to start search tool '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran and reported a real error
    #[error("Search tool exited with {}: {stderr}", exit_label(.code))]
    Failed { code: Option<i32>, stderr: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Errors raised by the history store
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to read history file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write history file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_message_mentions_exit_status() {
        let err = SearchError::Failed {
            code: Some(2),
            stderr: "regex parse error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Search tool exited with status 2: regex parse error"
        );
    }

    #[test]
    fn failed_message_handles_signal_termination() {
        let err = SearchError::Failed {
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("a signal"));
    }
}
