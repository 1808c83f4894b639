// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search executor - runs the external line-matching tool and classifies its outcome.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::OnceLock;

use crate::errors::SearchError;

/// Exit code the search tool reserves for "ran fine, matched nothing".
pub const NO_MATCH_EXIT_CODE: i32 = 1;

/// One search launch, numbered by the controller for staleness checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub pattern: String,
    pub roots: Vec<String>,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The tool could not be resolved to an executable
    ToolNotFound,
    /// The tool started (or failed to start) and reported an error
    Execution,
}

/// Human-readable diagnostic carried by [`SearchOutcome::ExecutionFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl From<SearchError> for SearchFailure {
    fn from(err: SearchError) -> Self {
        let kind = match err {
            SearchError::ToolNotFound { .. } => FailureKind::ToolNotFound,
            SearchError::Spawn { .. } | SearchError::Failed { .. } => FailureKind::Execution,
        };
        Self {
            kind,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Matched lines in the order the tool printed them
    Matches(Vec<String>),
    NoMatches,
    ExecutionFailed(SearchFailure),
}

/// Something that can turn a [`SearchRequest`] into a [`SearchOutcome`].
///
/// Implementations may block for as long as the search takes; the controller
/// always calls them from a blocking worker thread.
pub trait SearchBackend: Send + Sync + 'static {
    fn run(&self, request: &SearchRequest) -> SearchOutcome;
}

/// Shells out to ripgrep (or anything honoring its command-line contract).
#[derive(Debug)]
pub struct RipgrepBackend {
    tool: String,
    resolved: OnceLock<Result<PathBuf, String>>,
}

impl RipgrepBackend {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            resolved: OnceLock::new(),
        }
    }

    /// Resolve the tool once; the answer (good or bad) sticks for the
    /// lifetime of this backend.
    pub fn resolve(&self) -> Result<PathBuf, SearchFailure> {
        let resolved = self.resolved.get_or_init(|| {
            which::which(&self.tool).map_err(|source| {
                let err = SearchError::ToolNotFound {
                    tool: self.tool.clone(),
                    source,
                };
                tracing::warn!("{}", err);
                err.to_string()
            })
        });
        match resolved {
            Ok(path) => Ok(path.clone()),
            Err(reason) => Err(SearchFailure {
                kind: FailureKind::ToolNotFound,
                reason: reason.clone(),
            }),
        }
    }
}

impl SearchBackend for RipgrepBackend {
    fn run(&self, request: &SearchRequest) -> SearchOutcome {
        if request.pattern.is_empty() {
            return SearchOutcome::Matches(Vec::new());
        }
        let exe = match self.resolve() {
            Ok(exe) => exe,
            Err(failure) => return SearchOutcome::ExecutionFailed(failure),
        };
        match run_tool(&exe, &request.pattern, &request.roots) {
            Ok(output) => classify_output(&output),
            Err(source) => SearchOutcome::ExecutionFailed(
                SearchError::Spawn {
                    tool: self.tool.clone(),
                    source,
                }
                .into(),
            ),
        }
    }
}

/// Run the tool directly without going through a [`SearchBackend`].
pub fn run(tool_path: &str, pattern: &str, roots: &[String]) -> SearchOutcome {
    RipgrepBackend::new(tool_path).run(&SearchRequest {
        pattern: pattern.to_string(),
        roots: roots.to_vec(),
        sequence: 0,
    })
}

/// Arguments for one invocation: no color, line numbers, no file headings,
/// then the pattern and the roots in order.
pub fn tool_args(pattern: &str, roots: &[String]) -> Vec<String> {
    let mut args = vec![
        "--color".to_string(),
        "never".to_string(),
        "--line-number".to_string(),
        "--no-heading".to_string(),
    ];
    // Patterns starting with '-' must not be taken for flags.
    if pattern.starts_with('-') {
        args.push("--regexp".to_string());
    }
    args.push(pattern.to_string());
    args.extend(roots.iter().cloned());
    args
}

fn run_tool(exe: &Path, pattern: &str, roots: &[String]) -> std::io::Result<Output> {
    tracing::debug!(tool = %exe.display(), pattern, ?roots, "running search tool");
    Command::new(exe)
        .args(tool_args(pattern, roots))
        .stdin(Stdio::null())
        .output()
}

/// Map an exit status and captured streams to an outcome.
pub fn classify_output(output: &Output) -> SearchOutcome {
    classify(output.status.code(), &output.stdout, &output.stderr)
}

pub fn classify(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> SearchOutcome {
    match code {
        Some(0) => SearchOutcome::Matches(split_lines(stdout)),
        Some(NO_MATCH_EXIT_CODE) => SearchOutcome::NoMatches,
        code => {
            let stderr = String::from_utf8_lossy(stderr).trim().to_string();
            SearchOutcome::ExecutionFailed(SearchError::Failed { code, stderr }.into())
        }
    }
}

/// Split captured stdout on newlines; the empty tail after a final newline
/// is not a line.
pub fn split_lines(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| line.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_follow_tool_contract() {
        let roots = vec!["src".to_string(), "docs".to_string()];
        assert_eq!(
            tool_args("needle", &roots),
            vec![
                "--color",
                "never",
                "--line-number",
                "--no-heading",
                "needle",
                "src",
                "docs"
            ]
        );
    }

    #[test]
    fn dash_prefixed_pattern_is_passed_as_regexp() {
        let args = tool_args("-v", &[".".to_string()]);
        assert_eq!(&args[4..], ["--regexp", "-v", "."]);
    }

    #[test]
    fn exit_zero_yields_matches_in_tool_order() {
        let outcome = classify(Some(0), b"b.rs:3:zzz\na.rs:1:aaa\n", b"");
        assert_eq!(
            outcome,
            SearchOutcome::Matches(vec!["b.rs:3:zzz".to_string(), "a.rs:1:aaa".to_string()])
        );
    }

    #[test]
    fn no_match_exit_code_is_not_an_error() {
        assert_eq!(classify(Some(1), b"", b""), SearchOutcome::NoMatches);
    }

    #[test]
    fn other_exit_codes_fail_with_stderr() {
        let outcome = classify(Some(2), b"", b"regex parse error\n");
        let SearchOutcome::ExecutionFailed(failure) = outcome else {
            panic!("expected an execution failure");
        };
        assert_eq!(failure.kind, FailureKind::Execution);
        assert!(failure.reason.contains("status 2"));
        assert!(failure.reason.contains("regex parse error"));
    }

    #[test]
    fn signal_termination_is_a_failure() {
        assert!(matches!(
            classify(None, b"partial\n", b""),
            SearchOutcome::ExecutionFailed(_)
        ));
    }

    #[test]
    fn split_drops_only_trailing_empty_line() {
        assert_eq!(split_lines(b"a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(split_lines(b"a\r\nb"), vec!["a", "b"]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn empty_pattern_short_circuits_without_resolving_tool() {
        let backend = RipgrepBackend::new("definitely-not-a-real-tool-rgpick");
        let outcome = backend.run(&SearchRequest {
            pattern: String::new(),
            roots: vec![".".to_string()],
            sequence: 1,
        });
        assert_eq!(outcome, SearchOutcome::Matches(Vec::new()));
        assert!(backend.resolved.get().is_none());
    }

    #[test]
    fn missing_tool_is_reported_as_tool_not_found() {
        let outcome = run("definitely-not-a-real-tool-rgpick", "x", &[".".to_string()]);
        let SearchOutcome::ExecutionFailed(failure) = outcome else {
            panic!("expected an execution failure");
        };
        assert_eq!(failure.kind, FailureKind::ToolNotFound);
        assert!(failure.reason.contains("definitely-not-a-real-tool-rgpick"));
    }
}
