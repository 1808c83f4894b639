// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON payloads for non-interactive commands.

use serde::Serialize;

use crate::executor::SearchOutcome;

/// Result of a one-shot `rgpick search`.
#[derive(Debug, Serialize)]
pub struct SearchReport<'a> {
    pub pattern: &'a str,
    pub roots: &'a [String],
    /// `matches`, `no_matches` or `error`
    pub status: &'static str,
    pub matches: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> SearchReport<'a> {
    pub fn new(pattern: &'a str, roots: &'a [String], outcome: &'a SearchOutcome) -> Self {
        let (status, matches, error) = match outcome {
            SearchOutcome::Matches(lines) if !lines.is_empty() => {
                ("matches", lines.as_slice(), None)
            }
            SearchOutcome::Matches(_) | SearchOutcome::NoMatches => ("no_matches", &[][..], None),
            SearchOutcome::ExecutionFailed(failure) => {
                ("error", &[][..], Some(failure.reason.as_str()))
            }
        };
        Self {
            pattern,
            roots,
            status,
            matches,
            error,
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
