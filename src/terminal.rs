//! Tracing setup and rendering of run events on the terminal.

use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use site_downloader_core::{RunEvent, RunState};

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_use_progress_bar(
    stderr_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `default_level`.
pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Turns run events into terminal output.
pub(crate) enum EventRenderer {
    /// One JSON object per event on stdout.
    Json,
    /// Progress bar on stderr; errors printed above it.
    Bar(ProgressBar),
    /// Status and error lines on stderr (errors only when quiet).
    Plain { quiet: bool },
}

impl EventRenderer {
    pub(crate) fn for_terminal(json: bool, quiet: bool) -> Self {
        if json {
            Self::Json
        } else if should_use_progress_bar(io::stderr().is_terminal(), quiet, is_dumb_terminal()) {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            Self::Bar(bar)
        } else {
            Self::Plain { quiet }
        }
    }

    pub(crate) fn render(&mut self, event: &RunEvent) -> Result<()> {
        match self {
            Self::Json => {
                let line = serde_json::to_string(event)?;
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{line}")?;
            }
            Self::Bar(bar) => match event {
                RunEvent::State {
                    state: RunState::Downloading { total, .. },
                } => bar.set_length(*total as u64),
                RunEvent::Progress { completed, .. } => bar.set_position(*completed as u64),
                RunEvent::Status { message } => bar.set_message(message.clone()),
                RunEvent::Error { message } => bar.println(format!("error: {message}")),
                RunEvent::State { .. } => {}
            },
            Self::Plain { quiet } => match event {
                RunEvent::Status { message } if !*quiet => eprintln!("{message}"),
                RunEvent::Error { message } => eprintln!("error: {message}"),
                _ => {}
            },
        }
        Ok(())
    }

    pub(crate) fn finish(&self) {
        if let Self::Bar(bar) = self {
            bar.finish_and_clear();
        }
    }
}
