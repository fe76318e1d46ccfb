//! Site File Downloader Core Library
//!
//! Fetches a web page, picks out the anchor and image references that end
//! with one of a chosen set of file extensions, and downloads each of them
//! into a local folder, reporting progress as it goes.
//!
//! # Architecture
//!
//! - [`extract`] - Suffix sets and HTML link extraction
//! - [`download`] - HTTP client, reference resolution and the download loop
//! - [`report`] - Run events and the reporters that receive them
//! - [`workflow`] - One complete run, inline or on a background task

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod extract;
pub mod report;
#[cfg(test)]
pub(crate) mod test_support;
pub mod workflow;

// Re-export commonly used types
pub use download::{DownloadError, DownloadOutcome, DownloadTarget, Downloader, HttpClient};
pub use extract::{DEFAULT_FORMATS, Reference, ReferenceKind, SuffixSet, extract_references};
pub use report::{ChannelReporter, Reporter, RunEvent, RunState, TracingReporter};
pub use workflow::{RunError, RunHandle, RunReport, RunRequest, RunSummary, run, spawn_run};
