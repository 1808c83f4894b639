// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounce/cancellation controller.
//!
//! A single event loop owns all search state. Input edits (re)arm a debounce
//! timer, submits launch immediately, and every search runs on a blocking
//! worker that reports back through the same event channel. Each launch gets
//! a sequence number; a completion is applied only when its sequence is newer
//! than the last applied one, so a slow early search can never overwrite the
//! results of a faster later one. Superseded tool processes are left to
//! finish and their output is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::executor::{FailureKind, SearchBackend, SearchFailure, SearchOutcome, SearchRequest};
use crate::history::HistoryStore;
use crate::presenter::Presenter;

pub const NO_MATCHES_PLACEHOLDER: &str = "No matches found.";
pub const ERROR_PLACEHOLDER: &str = "Error running search...";
pub const READY_STATUS: &str = "Ready. Enter a search pattern.";
const ERROR_TITLE: &str = "Search Error";

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub roots: Vec<String>,
    pub debounce: Duration,
}

impl From<&Settings> for ControllerOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            roots: settings.roots.clone(),
            debounce: settings.debounce,
        }
    }
}

#[derive(Debug)]
enum Event {
    TextChanged(String),
    Submitted(String),
    Shutdown,
    TimerFired {
        token: u64,
    },
    SearchCompleted {
        sequence: u64,
        pattern: String,
        outcome: SearchOutcome,
    },
    HistorySaved,
}

/// Cloneable input side of a running [`Controller`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: UnboundedSender<Event>,
}

impl ControllerHandle {
    /// The input field now reads `text`. Returns false once the controller is gone.
    pub fn text_changed(&self, text: impl Into<String>) -> bool {
        self.tx.send(Event::TextChanged(text.into())).is_ok()
    }

    /// Search `text` now, skipping the debounce delay.
    pub fn submitted(&self, text: impl Into<String>) -> bool {
        self.tx.send(Event::Submitted(text.into())).is_ok()
    }

    /// Stop accepting input; the loop exits once in-flight work has settled.
    pub fn shutdown(&self) -> bool {
        self.tx.send(Event::Shutdown).is_ok()
    }
}

#[derive(Debug)]
struct ArmedTimer {
    token: u64,
    task: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct DebounceState {
    pending_text: String,
    timer: Option<ArmedTimer>,
    next_timer_token: u64,
    last_launched_sequence: u64,
    last_applied_sequence: u64,
}

pub struct Controller<B: SearchBackend, P: Presenter> {
    backend: Arc<B>,
    history: Arc<HistoryStore>,
    presenter: P,
    options: ControllerOptions,
    state: DebounceState,
    tool_missing_reported: bool,
    in_flight: usize,
    shutting_down: bool,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
}

impl<B: SearchBackend, P: Presenter> Controller<B, P> {
    pub fn new(
        backend: Arc<B>,
        history: Arc<HistoryStore>,
        presenter: P,
        options: ControllerOptions,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            history,
            presenter,
            options,
            state: DebounceState::default(),
            tool_missing_reported: false,
            in_flight: 0,
            shutting_down: false,
            events_tx,
            events_rx,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.events_tx.clone(),
        }
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Process events until shutdown was requested and nothing is in flight.
    /// Hands the presenter back to the caller.
    pub async fn run(mut self) -> P {
        while self.step().await {}
        self.presenter
    }

    /// Wait for and process one event. Returns false when the loop is done.
    pub async fn step(&mut self) -> bool {
        if self.finished() {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.dispatch(event);
                !self.finished()
            }
            None => false,
        }
    }

    fn finished(&self) -> bool {
        self.shutting_down && self.in_flight == 0
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::TextChanged(text) if !self.shutting_down => self.on_text_changed(text),
            Event::Submitted(text) if !self.shutting_down => self.on_submitted(text),
            Event::TextChanged(_) | Event::Submitted(_) => {
                tracing::debug!("input after shutdown ignored");
            }
            Event::Shutdown => {
                self.cancel_timer();
                self.shutting_down = true;
            }
            Event::TimerFired { token } => self.on_timer_fired(token),
            Event::SearchCompleted {
                sequence,
                pattern,
                outcome,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_search_completed(sequence, &pattern, outcome);
            }
            Event::HistorySaved => {
                self.in_flight = self.in_flight.saturating_sub(1);
            }
        }
    }

    fn on_text_changed(&mut self, text: String) {
        self.state.pending_text = text;
        if self.state.pending_text.trim().is_empty() {
            self.cancel_timer();
            self.clear_results();
            return;
        }
        self.arm_timer();
    }

    fn on_submitted(&mut self, text: String) {
        self.cancel_timer();
        self.state.pending_text = text.clone();
        self.launch_search(&text);
    }

    fn on_timer_fired(&mut self, token: u64) {
        let armed = self.state.timer.as_ref().map(|timer| timer.token);
        if armed != Some(token) {
            tracing::trace!(token, "cancelled debounce timer ignored");
            return;
        }
        self.state.timer = None;
        let text = self.state.pending_text.clone();
        self.launch_search(&text);
    }

    fn arm_timer(&mut self) {
        self.cancel_timer();
        self.state.next_timer_token += 1;
        let token = self.state.next_timer_token;
        let delay = self.options.debounce;
        let tx = self.events_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Event::TimerFired { token });
        });
        self.state.timer = Some(ArmedTimer { token, task });
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.state.timer.take() {
            timer.task.abort();
        }
    }

    fn clear_results(&mut self) {
        // Anything still running belongs to text that is no longer in the field.
        self.state.last_applied_sequence = self.state.last_launched_sequence;
        self.presenter.show_results(&[]);
        self.presenter.show_status(READY_STATUS);
    }

    fn launch_search(&mut self, text: &str) {
        let pattern = text.trim();
        if pattern.is_empty() {
            self.clear_results();
            return;
        }

        let sequence = self.state.last_launched_sequence + 1;
        self.state.last_launched_sequence = sequence;
        tracing::debug!(sequence, pattern, "launching search");
        self.presenter
            .show_status(&format!("Searching for '{}'...", pattern));

        self.record_history(pattern);

        let request = SearchRequest {
            pattern: pattern.to_string(),
            roots: self.options.roots.clone(),
            sequence,
        };
        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let pattern = request.pattern.clone();
            let outcome = match tokio::task::spawn_blocking(move || backend.run(&request)).await {
                Ok(outcome) => outcome,
                Err(err) => SearchOutcome::ExecutionFailed(SearchFailure {
                    kind: FailureKind::Execution,
                    reason: format!("search worker failed: {err}"),
                }),
            };
            let _ = tx.send(Event::SearchCompleted {
                sequence,
                pattern,
                outcome,
            });
        });
    }

    /// Promote the term in memory right away (keeps history in launch order)
    /// and persist on a worker; a failed save is only logged.
    fn record_history(&mut self, pattern: &str) {
        self.history.add_term(pattern);

        let history = Arc::clone(&self.history);
        let tx = self.events_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(move || history.save()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!("Error saving search history: {}", err),
                Err(err) => tracing::warn!("History save task failed: {}", err),
            }
            let _ = tx.send(Event::HistorySaved);
        });
    }

    fn on_search_completed(&mut self, sequence: u64, pattern: &str, outcome: SearchOutcome) {
        if sequence <= self.state.last_applied_sequence {
            tracing::debug!(
                sequence,
                last_applied = self.state.last_applied_sequence,
                "discarding superseded search result"
            );
            return;
        }
        self.state.last_applied_sequence = sequence;

        match outcome {
            SearchOutcome::Matches(lines) if !lines.is_empty() => {
                self.presenter.show_results(&lines);
                self.presenter.show_status(&format!(
                    "Found {} match(es) for '{}'",
                    lines.len(),
                    pattern
                ));
            }
            SearchOutcome::Matches(_) | SearchOutcome::NoMatches => {
                self.presenter
                    .show_results(&[NO_MATCHES_PLACEHOLDER.to_string()]);
                self.presenter
                    .show_status(&format!("No matches found for '{}'", pattern));
            }
            SearchOutcome::ExecutionFailed(failure) => self.apply_failure(failure),
        }
    }

    fn apply_failure(&mut self, failure: SearchFailure) {
        tracing::warn!("Error running search: {}", failure.reason);
        self.presenter.show_results(&[ERROR_PLACEHOLDER.to_string()]);
        let headline = failure.reason.lines().next().unwrap_or_default();
        self.presenter.show_status(&format!("Error: {}", headline));

        let notify = match failure.kind {
            FailureKind::ToolNotFound => !std::mem::replace(&mut self.tool_missing_reported, true),
            FailureKind::Execution => true,
        };
        if notify {
            self.presenter.notify_error(ERROR_TITLE, &failure.reason);
        }
    }

    #[cfg(test)]
    fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
        }
    }
}
