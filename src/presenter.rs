// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presentation boundary consumed by the controller.

use colored::Colorize;
use std::io::Write;

/// Receives display updates from the controller's event loop.
pub trait Presenter: Send + 'static {
    /// Replace the whole result list.
    fn show_results(&mut self, lines: &[String]);

    fn show_status(&mut self, text: &str);

    /// Surface an error outside the result list (desktop notification,
    /// stderr banner, ...).
    fn notify_error(&mut self, title: &str, reason: &str);
}

/// Line-oriented presenter that prints to stdout/stderr.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    /// Print a separator before each result list.
    pub separators: bool,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self { separators: true }
    }
}

impl Presenter for TerminalPresenter {
    fn show_results(&mut self, lines: &[String]) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if self.separators {
            let _ = writeln!(out, "{}", "──".dimmed());
        }
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
        let _ = out.flush();
    }

    fn show_status(&mut self, text: &str) {
        println!("{} {}", "»".cyan(), text.bold());
    }

    fn notify_error(&mut self, title: &str, reason: &str) {
        eprintln!("{} {}: {}", "✗".red(), title.red().bold(), reason);
    }
}
