//! The end-to-end run: validate, fetch the page, extract, download.
//!
//! [`run`] drives one run to completion on the calling task. [`spawn_run`]
//! does the same on a background tokio task and streams [`RunEvent`]s back,
//! so that a front-end stays responsive while a slow fetch is in flight.
//!
//! Runs share nothing. Two runs writing into the same folder are not
//! coordinated: when both write a file of the same name, the last write wins.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::download::{DownloadError, DownloadOutcome, Downloader};
use crate::extract::{Reference, SuffixSet, extract_references};
use crate::report::{ChannelReporter, Reporter, RunEvent, RunState};

/// Status text while the page is being fetched.
pub const STATUS_FETCHING: &str = "Fetching file list...";
/// Status text once every item has been processed.
pub const STATUS_COMPLETE: &str = "Download complete";
/// Error text when the page holds nothing in the selected formats.
pub const NO_MATCHES_MESSAGE: &str = "No files found for the selected formats";

/// Errors that end a run before or instead of the download loop.
#[derive(Debug, Error)]
pub enum RunError {
    /// Missing URL, missing folder, or no formats selected.
    #[error("{reason}")]
    InputInvalid {
        /// User-facing explanation.
        reason: String,
    },

    /// The destination folder does not exist or is not a directory.
    #[error("download folder {path} is unavailable: {source}")]
    DestinationUnavailable {
        /// The folder that was checked.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// The page itself could not be fetched; nothing was extracted.
    #[error("failed to fetch page {url}: {source}")]
    PageFetchFailed {
        /// The page URL.
        url: String,
        /// The fetch failure.
        #[source]
        source: DownloadError,
    },

    /// The background task panicked or was cancelled.
    #[error("run task ended abnormally: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl RunError {
    fn input_invalid(reason: impl Into<String>) -> Self {
        Self::InputInvalid {
            reason: reason.into(),
        }
    }
}

/// Everything a run needs from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Absolute URL of the page to scan.
    pub url: String,
    /// Existing folder the files are written into.
    pub folder: PathBuf,
    /// Formats to keep.
    pub suffixes: SuffixSet,
}

impl RunRequest {
    pub fn new(url: impl Into<String>, folder: impl Into<PathBuf>, suffixes: SuffixSet) -> Self {
        Self {
            url: url.into(),
            folder: folder.into(),
            suffixes,
        }
    }

    /// Checks the request without touching the network or the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InputInvalid`] for an empty or non-absolute URL,
    /// an empty folder, or an empty suffix set.
    pub fn validate(&self) -> Result<Url, RunError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(RunError::input_invalid("URL cannot be empty"));
        }
        if self.folder.as_os_str().is_empty() {
            return Err(RunError::input_invalid("Download folder cannot be empty"));
        }
        if self.suffixes.is_empty() {
            return Err(RunError::input_invalid("No file formats selected"));
        }
        Url::parse(url).map_err(|e| RunError::input_invalid(format!("Invalid URL '{url}': {e}")))
    }
}

/// What the download loop produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Extracted references, in the order they were processed.
    pub references: Vec<Reference>,
    /// One outcome per reference, same order.
    pub outcomes: Vec<DownloadOutcome>,
}

impl RunSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}

/// How a run that did not fail ended.
#[derive(Debug)]
pub enum RunReport {
    /// The page had nothing in the selected formats; nothing was downloaded.
    NoMatches,
    /// The download loop ran. Individual items may still have failed.
    Completed(RunSummary),
}

/// Runs fetch-page, extract, download-all on the current task.
///
/// Every phase change, status line, progress step and error is passed to
/// `reporter`. A fatal error is reported on the error channel before it is
/// returned.
///
/// # Errors
///
/// Returns [`RunError::InputInvalid`], [`RunError::DestinationUnavailable`]
/// or [`RunError::PageFetchFailed`]. Per-item failures are not errors; they
/// appear in the returned [`RunSummary`].
#[instrument(skip_all, fields(url = %request.url, folder = %request.folder.display()))]
pub async fn run(
    request: &RunRequest,
    downloader: &Downloader,
    reporter: &dyn Reporter,
) -> Result<RunReport, RunError> {
    reporter.report(RunEvent::State {
        state: RunState::Idle,
    });
    let result = execute(request, downloader, reporter).await;
    if let Err(error) = &result {
        warn!(error = %error, "run failed");
        reporter.report(RunEvent::error(error.to_string()));
        reporter.report(RunEvent::State {
            state: RunState::Failed,
        });
    }
    result
}

async fn execute(
    request: &RunRequest,
    downloader: &Downloader,
    reporter: &dyn Reporter,
) -> Result<RunReport, RunError> {
    let page_url = request.validate()?;
    ensure_folder(request).await?;

    reporter.report(RunEvent::State {
        state: RunState::FetchingPage,
    });
    reporter.report(RunEvent::status(STATUS_FETCHING));
    let html = downloader
        .client()
        .fetch_page(&page_url)
        .await
        .map_err(|source| RunError::PageFetchFailed {
            url: page_url.to_string(),
            source,
        })?;

    reporter.report(RunEvent::State {
        state: RunState::Extracting,
    });
    let references = extract_references(&html, &request.suffixes);
    let total = references.len();
    if total == 0 {
        info!(suffixes = %request.suffixes, "no matching references on page");
        reporter.report(RunEvent::error(NO_MATCHES_MESSAGE));
        reporter.report(RunEvent::State {
            state: RunState::Done,
        });
        return Ok(RunReport::NoMatches);
    }

    info!(total, "downloading matched references");
    reporter.report(RunEvent::State {
        state: RunState::Downloading {
            completed: 0,
            total,
        },
    });
    let outcomes = downloader
        .download_all(
            &page_url,
            &references,
            &request.folder,
            |completed, total, outcome| {
                if let DownloadOutcome::Failure { reference, error } = outcome {
                    reporter.report(RunEvent::error(format!(
                        "Failed to download {reference}: {error}"
                    )));
                }
                reporter.report(RunEvent::Progress { completed, total });
                reporter.report(RunEvent::State {
                    state: RunState::Downloading { completed, total },
                });
                reporter.report(RunEvent::status(format!(
                    "Downloading {completed}/{total} files..."
                )));
            },
        )
        .await;

    reporter.report(RunEvent::status(STATUS_COMPLETE));
    reporter.report(RunEvent::State {
        state: RunState::Done,
    });
    Ok(RunReport::Completed(RunSummary {
        references,
        outcomes,
    }))
}

/// The destination must already exist as a directory; it is never created.
async fn ensure_folder(request: &RunRequest) -> Result<(), RunError> {
    let metadata = tokio::fs::metadata(&request.folder).await.map_err(|source| {
        RunError::DestinationUnavailable {
            path: request.folder.clone(),
            source,
        }
    })?;
    if !metadata.is_dir() {
        return Err(RunError::DestinationUnavailable {
            path: request.folder.clone(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }
    debug!("destination folder present");
    Ok(())
}

/// A run executing on a background task.
#[derive(Debug)]
pub struct RunHandle {
    /// Events in emission order. Closes when the run ends.
    pub events: UnboundedReceiver<RunEvent>,
    task: JoinHandle<Result<RunReport, RunError>>,
}

impl RunHandle {
    /// Waits for the run to end and returns its result.
    ///
    /// # Errors
    ///
    /// Returns the run's own error, or [`RunError::Worker`] if the task
    /// panicked.
    pub async fn finish(self) -> Result<RunReport, RunError> {
        self.task.await?
    }
}

/// Starts a run on its own tokio task.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_run(request: RunRequest, downloader: Downloader) -> RunHandle {
    let (sender, events) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        let reporter = ChannelReporter::new(sender);
        run(&request, &downloader, &reporter).await
    });
    RunHandle { events, task }
}
