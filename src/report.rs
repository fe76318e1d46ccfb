//! Reporting surface for a run: state, status text, progress and errors.
//!
//! The core never renders anything. It hands [`RunEvent`]s to a
//! [`Reporter`], and the front-end decides whether they become a progress
//! bar, log lines or JSON.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Phases of a single run.
///
/// `Idle -> FetchingPage -> Extracting -> Downloading(i/total) -> Done`,
/// or `Idle -> FetchingPage -> Failed`. A run that finds nothing goes from
/// `Extracting` straight to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    FetchingPage,
    Extracting,
    Downloading { completed: usize, total: usize },
    Done,
    Failed,
}

/// One observation emitted while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// The run entered a new phase.
    State { state: RunState },
    /// Human-readable description of the current phase.
    Status { message: String },
    /// `completed` of `total` items have been processed.
    Progress { completed: usize, total: usize },
    /// A fatal error, a "nothing found" notice, or a per-item failure.
    Error { message: String },
}

impl RunEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Receives the events of a run.
pub trait Reporter: Send + Sync {
    fn report(&self, event: RunEvent);
}

impl<F> Reporter for F
where
    F: Fn(RunEvent) + Send + Sync,
{
    fn report(&self, event: RunEvent) {
        self(event);
    }
}

/// Forwards events over an unbounded channel, typically to a UI thread.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: UnboundedSender<RunEvent>,
}

impl ChannelReporter {
    #[must_use]
    pub fn new(sender: UnboundedSender<RunEvent>) -> Self {
        Self { sender }
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, event: RunEvent) {
        if self.sender.send(event).is_err() {
            debug!("event receiver dropped; event discarded");
        }
    }
}

/// Writes every event to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: RunEvent) {
        match event {
            RunEvent::State { state } => debug!(?state, "run state changed"),
            RunEvent::Status { message } => info!("{message}"),
            RunEvent::Progress { completed, total } => debug!(completed, total, "progress"),
            RunEvent::Error { message } => warn!("{message}"),
        }
    }
}
