// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-driven interactive session feeding a [`Controller`].

use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::controller::Controller;
use crate::executor::SearchBackend;
use crate::history::HistoryStore;
use crate::presenter::Presenter;

/// How plain input lines reach the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Every line is an explicit submit
    #[default]
    Submit,
    /// Every line is an edit of the input field (debounced)
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Edit(String),
    Submit(String),
    ShowHistory,
    Quit,
}

pub fn parse_line(line: &str, mode: InputMode) -> SessionCommand {
    match line.trim() {
        ":q" | ":quit" => SessionCommand::Quit,
        ":history" | ":h" => SessionCommand::ShowHistory,
        _ => match mode {
            InputMode::Submit => SessionCommand::Submit(line.to_string()),
            InputMode::Live => SessionCommand::Edit(line.to_string()),
        },
    }
}

pub fn write_history<W: Write>(out: &mut W, entries: &[String]) -> io::Result<()> {
    if entries.is_empty() {
        writeln!(out, "(no search history)")?;
    }
    for (idx, term) in entries.iter().enumerate() {
        writeln!(out, "{:>3}  {}", idx + 1, term)?;
    }
    out.flush()
}

/// Feed `input` to the controller until EOF or `:q`, then wait for in-flight
/// searches and history saves to settle. Returns the presenter.
pub async fn run<R, W, B, P>(
    input: R,
    out: &mut W,
    controller: Controller<B, P>,
    mode: InputMode,
) -> io::Result<P>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    B: SearchBackend,
    P: Presenter,
{
    let handle = controller.handle();
    let history: Arc<HistoryStore> = Arc::clone(controller.history());
    let driver = tokio::spawn(controller.run());

    let read: io::Result<()> = async {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match parse_line(&line, mode) {
                SessionCommand::Quit => break,
                SessionCommand::ShowHistory => write_history(out, &history.snapshot())?,
                SessionCommand::Edit(text) => {
                    handle.text_changed(text);
                }
                SessionCommand::Submit(text) => {
                    handle.submitted(text);
                }
            }
        }
        Ok(())
    }
    .await;

    // The controller is stopped even when reading input failed.
    handle.shutdown();
    let presenter = driver.await.map_err(io::Error::other)?;
    read.map(|()| presenter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerOptions;
    use crate::executor::{SearchOutcome, SearchRequest};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct EchoBackend {
        calls: Mutex<Vec<String>>,
    }

    impl SearchBackend for EchoBackend {
        fn run(&self, request: &SearchRequest) -> SearchOutcome {
            self.calls.lock().unwrap().push(request.pattern.clone());
            SearchOutcome::Matches(vec![format!("notes.txt:7:{}", request.pattern)])
        }
    }

    #[derive(Debug, Default)]
    struct LastResults(Vec<String>);

    impl Presenter for LastResults {
        fn show_results(&mut self, lines: &[String]) {
            self.0 = lines.to_vec();
        }
        fn show_status(&mut self, _text: &str) {}
        fn notify_error(&mut self, _title: &str, _reason: &str) {}
    }

    fn controller(
        dir: &TempDir,
        backend: Arc<EchoBackend>,
        debounce: Duration,
    ) -> Controller<EchoBackend, LastResults> {
        let history = Arc::new(HistoryStore::new(dir.path().join("history.json"), None));
        history.add_term("older");
        Controller::new(
            backend,
            history,
            LastResults::default(),
            ControllerOptions {
                roots: vec![".".to_string()],
                debounce,
            },
        )
    }

    #[test]
    fn parse_line_recognizes_commands() {
        assert_eq!(parse_line(" :q ", InputMode::Live), SessionCommand::Quit);
        assert_eq!(parse_line(":quit", InputMode::Submit), SessionCommand::Quit);
        assert_eq!(
            parse_line(":history", InputMode::Submit),
            SessionCommand::ShowHistory
        );
        assert_eq!(
            parse_line("fn main", InputMode::Submit),
            SessionCommand::Submit("fn main".to_string())
        );
        assert_eq!(
            parse_line("", InputMode::Live),
            SessionCommand::Edit(String::new())
        );
    }

    #[tokio::test]
    async fn quit_stops_reading_and_settles_in_flight_searches() {
        let dir = TempDir::new().expect("tempdir");
        let backend = Arc::new(EchoBackend::default());
        let controller = controller(&dir, Arc::clone(&backend), Duration::from_millis(300));
        let mut out = Vec::new();

        let presenter = run(
            &b"needle\n:history\n:q\nnever\n"[..],
            &mut out,
            controller,
            InputMode::Submit,
        )
        .await
        .expect("session");

        assert_eq!(*backend.calls.lock().unwrap(), vec!["needle"]);
        assert_eq!(presenter.0, vec!["notes.txt:7:needle"]);
        let printed = String::from_utf8(out).expect("utf8");
        assert!(printed.contains("older"));
    }

    #[tokio::test(start_paused = true)]
    async fn live_mode_debounces_lines() {
        let dir = TempDir::new().expect("tempdir");
        let backend = Arc::new(EchoBackend::default());
        let controller = controller(&dir, Arc::clone(&backend), Duration::from_millis(300));
        let mut out = Vec::new();

        // EOF shuts the controller down before the debounce elapses, so the
        // pending edit is dropped rather than searched.
        let presenter = run(&b"n\nne\nnee\n"[..], &mut out, controller, InputMode::Live)
            .await
            .expect("session");

        assert!(backend.calls.lock().unwrap().is_empty());
        assert!(presenter.0.is_empty());
    }

    #[tokio::test]
    async fn read_error_still_settles_controller() {
        let dir = TempDir::new().expect("tempdir");
        let backend = Arc::new(EchoBackend::default());
        let controller = controller(&dir, Arc::clone(&backend), Duration::from_millis(300));
        let history_path = controller.history().path().to_path_buf();
        let mut out = Vec::new();

        let err = run(
            &b"needle\n\xff\xfe\nafter\n"[..],
            &mut out,
            controller,
            InputMode::Submit,
        )
        .await
        .expect_err("invalid utf-8 line");

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(*backend.calls.lock().unwrap(), vec!["needle"]);
        let saved = HistoryStore::new(history_path, None);
        saved.load().expect("load");
        assert_eq!(saved.snapshot(), vec!["needle", "older"]);
    }

    #[test]
    fn write_history_numbers_entries() {
        let dir = TempDir::new().expect("tempdir");
        let history = HistoryStore::new(dir.path().join("h.json"), None);
        let mut out = Vec::new();
        write_history(&mut out, &history.snapshot()).expect("write empty");
        history.add_term("b");
        history.add_term("a");
        write_history(&mut out, &history.snapshot()).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "(no search history)\n  1  a\n  2  b\n"
        );
    }
}
