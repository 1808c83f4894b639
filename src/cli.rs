// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use rgpick::config::Overrides;

/// rgpick - Interactive ripgrep front-end
///
/// Debounces typed patterns into ripgrep runs, shows one ordered result list
/// per run, and remembers past search terms.
#[derive(Parser, Debug)]
#[command(name = "rgpick")]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "Quickstart:\n  rgpick i\n  rgpick --root src --root tests s \"fn main\"\n  rgpick history --limit 5"
)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Search tool executable (default: rg)
    #[arg(long = "tool", global = true, value_name = "PATH")]
    pub tool: Option<String>,

    /// Directory or file to search (repeatable, default: .)
    #[arg(long = "root", global = true, value_name = "DIR")]
    pub roots: Vec<String>,

    /// History file location
    #[arg(long = "history-file", global = true, value_name = "FILE")]
    pub history_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let debounce_ms = match &self.command {
            Commands::Interactive { debounce_ms, .. } => *debounce_ms,
            _ => None,
        };
        Overrides {
            tool_path: self.tool.clone(),
            roots: self.roots.clone(),
            debounce_ms,
            history_path: self.history_file.clone(),
        }
    }
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read patterns from stdin and search as you type
    #[command(
        visible_aliases = ["i"],
        after_help = "Each input line is submitted as a search.\n\
                      With --live, each line is an edit of the input field and is debounced.\n\
                      An empty line clears results, `:history` lists past terms, `:q` quits."
    )]
    Interactive {
        /// Treat each line as an edit (debounced) instead of a submit
        #[arg(long)]
        live: bool,

        /// Debounce interval in milliseconds (default: 300)
        #[arg(short = 'd', long = "debounce-ms")]
        debounce_ms: Option<u64>,
    },

    /// Run one search and print the matching lines
    #[command(visible_aliases = ["s"])]
    Search {
        /// Pattern handed to the search tool
        pattern: String,

        /// Do not record the pattern in history
        #[arg(long)]
        no_history: bool,
    },

    /// Show or clear the search history
    #[command(visible_aliases = ["h"])]
    History {
        /// Show at most N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Forget all stored terms
        #[arg(long, conflicts_with = "limit")]
        clear: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn interactive_alias_and_flags_parse() {
        let cli = Cli::try_parse_from(["rgpick", "i", "--live", "-d", "50"])
            .expect("parse interactive alias");

        match cli.command {
            Commands::Interactive { live, debounce_ms } => {
                assert!(live);
                assert_eq!(debounce_ms, Some(50));
            }
            other => panic!("expected interactive command, got {other:?}"),
        }
    }

    #[test]
    fn global_roots_accumulate_in_order() {
        let cli = Cli::try_parse_from([
            "rgpick", "--root", "src", "--root", "tests", "--tool", "/opt/rg", "s", "needle",
        ])
        .expect("parse search with roots");

        let overrides = cli.overrides();
        assert_eq!(overrides.roots, vec!["src".to_string(), "tests".to_string()]);
        assert_eq!(overrides.tool_path.as_deref(), Some("/opt/rg"));
        assert_eq!(overrides.debounce_ms, None);
        match cli.command {
            Commands::Search {
                pattern,
                no_history,
            } => {
                assert_eq!(pattern, "needle");
                assert!(!no_history);
            }
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn debounce_override_comes_from_interactive_only() {
        let cli = Cli::try_parse_from(["rgpick", "interactive", "--debounce-ms", "0"])
            .expect("parse interactive");
        assert_eq!(cli.overrides().debounce_ms, Some(0));
    }

    #[test]
    fn history_clear_conflicts_with_limit() {
        let err = Cli::try_parse_from(["rgpick", "history", "--clear", "-n", "3"])
            .expect_err("clear and limit conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn json_format_is_global() {
        let cli = Cli::try_parse_from(["rgpick", "history", "--format", "json"])
            .expect("parse history");
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }
}
