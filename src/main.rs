// SPDX-License-Identifier: MIT OR Apache-2.0

//! rgpick - Interactive ripgrep front-end
//!
//! Turns typed patterns into debounced ripgrep runs and keeps a
//! most-recent-first history of search terms across sessions.

mod cli;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, OutputFormat};
use colored::Colorize;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use rgpick::config::{Config, Settings};
use rgpick::controller::{Controller, ControllerOptions};
use rgpick::executor::{self, RipgrepBackend, SearchOutcome};
use rgpick::history::HistoryStore;
use rgpick::output::{print_json, SearchReport};
use rgpick::presenter::{Presenter, TerminalPresenter};
use rgpick::session::{self, InputMode};

const LOG_ENV: &str = "RGPICK_LOG";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let format = cli.format.unwrap_or_default();
    let settings = Config::load().resolve(&cli.overrides());
    tracing::debug!(?settings, "resolved settings");

    match cli.command {
        Commands::Interactive { live, .. } => {
            let mode = if live {
                InputMode::Live
            } else {
                InputMode::Submit
            };
            run_interactive(&settings, mode)?;
        }
        Commands::Search {
            pattern,
            no_history,
        } => {
            let code = run_search(&settings, &pattern, !no_history, format)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::History { limit, clear } => {
            run_history(&settings, limit, clear, format)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "rgpick", &mut io::stdout());
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn open_history(settings: &Settings) -> Arc<HistoryStore> {
    let history = Arc::new(HistoryStore::new(
        &settings.history_path,
        settings.history_limit,
    ));
    if let Err(err) = history.load() {
        tracing::warn!("Failed to load search history: {}", err);
    }
    history
}

fn run_interactive(settings: &Settings, mode: InputMode) -> Result<()> {
    let history = open_history(settings);
    let backend = Arc::new(RipgrepBackend::new(settings.tool_path.clone()));

    let mut presenter = TerminalPresenter::new();
    presenter.show_status("Ready.");
    let controller = Controller::new(
        backend,
        Arc::clone(&history),
        presenter,
        ControllerOptions::from(settings),
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let session = runtime.block_on(session::run(
        tokio::io::BufReader::new(tokio::io::stdin()),
        &mut io::stdout(),
        controller,
        mode,
    ));
    // stdin may still be parked in a blocking read after `:q` or an error.
    runtime.shutdown_timeout(Duration::from_millis(100));

    if let Err(err) = history.save() {
        tracing::warn!("Error saving history on close: {}", err);
    }
    session.context("interactive session failed")?;
    Ok(())
}

/// Returns the process exit code: 0 matches, 1 nothing matched, 2 tool failure.
fn run_search(
    settings: &Settings,
    pattern: &str,
    record: bool,
    format: OutputFormat,
) -> Result<i32> {
    let pattern = pattern.trim();
    let outcome = executor::run(&settings.tool_path, pattern, &settings.roots);

    if record && !pattern.is_empty() {
        let history = open_history(settings);
        history.add_term(pattern);
        if let Err(err) = history.save() {
            tracing::warn!("Error saving search history: {}", err);
        }
    }

    match format {
        OutputFormat::Json => {
            print_json(&SearchReport::new(pattern, &settings.roots, &outcome))?;
        }
        OutputFormat::Text => match &outcome {
            SearchOutcome::Matches(lines) => {
                for line in lines {
                    println!("{}", line);
                }
            }
            SearchOutcome::NoMatches => {}
            SearchOutcome::ExecutionFailed(failure) => {
                eprintln!("{} {}", "✗".red(), failure.reason);
            }
        },
    }

    Ok(match outcome {
        SearchOutcome::Matches(lines) if !lines.is_empty() => 0,
        SearchOutcome::Matches(_) | SearchOutcome::NoMatches => 1,
        SearchOutcome::ExecutionFailed(_) => 2,
    })
}

fn run_history(
    settings: &Settings,
    limit: Option<usize>,
    clear: bool,
    format: OutputFormat,
) -> Result<()> {
    let history = open_history(settings);

    if clear {
        history.clear();
        history
            .save()
            .with_context(|| format!("failed to clear {}", history.path().display()))?;
        if format == OutputFormat::Text {
            println!("{} Search history cleared", "✓".green());
        }
        return Ok(());
    }

    let mut entries = history.snapshot();
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Text => session::write_history(&mut io::stdout(), &entries)?,
    }
    Ok(())
}
