//! Sequential download loop over extracted references.
//!
//! One reference is fetched at a time, in input order. A failing item is
//! recorded as a [`DownloadOutcome::Failure`] and the loop moves on; nothing
//! an individual item does can abort the run.
//!
//! # Example
//!
//! ```no_run
//! use site_downloader_core::download::{Downloader, HttpClient};
//! use site_downloader_core::extract::{Reference, ReferenceKind};
//! use std::path::Path;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(HttpClient::new());
//! let base = Url::parse("https://example.com/music/")?;
//! let references = vec![Reference::new("a.mp3", ReferenceKind::Anchor)];
//! let outcomes = downloader
//!     .download_all(&base, &references, Path::new("./downloads"), |done, total, outcome| {
//!         println!("{done}/{total} {}", outcome.reference());
//!     })
//!     .await;
//! println!("{} succeeded", outcomes.iter().filter(|o| o.is_success()).count());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use url::Url;

use super::target::DownloadTarget;
use super::{DownloadError, HttpClient};
use crate::extract::Reference;

/// Result of attempting one reference.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The body was written to `path`.
    Success {
        /// The reference as found on the page.
        reference: Reference,
        /// Where the file was written.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// Resolving, fetching or writing failed.
    Failure {
        /// The reference as found on the page.
        reference: Reference,
        /// Why.
        error: DownloadError,
    },
}

impl DownloadOutcome {
    #[must_use]
    pub fn reference(&self) -> &Reference {
        match self {
            Self::Success { reference, .. } | Self::Failure { reference, .. } => reference,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Downloads references one after another with a shared [`HttpClient`].
#[derive(Debug, Clone, Default)]
pub struct Downloader {
    client: HttpClient,
}

impl Downloader {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Downloads every reference into `folder`, in order.
    ///
    /// For each reference: resolve against `base_url`, name the file after
    /// the raw reference's last segment, fetch, overwrite
    /// `folder/<name>`. `on_progress(i, total, outcome)` is called once per
    /// item, as soon as it finishes, with `i` counting from 1.
    ///
    /// An empty `references` slice returns an empty vector without any
    /// request being made.
    #[instrument(skip(self, references, on_progress), fields(base_url = %base_url, folder = %folder.display(), total = references.len()))]
    pub async fn download_all<F>(
        &self,
        base_url: &Url,
        references: &[Reference],
        folder: &Path,
        mut on_progress: F,
    ) -> Vec<DownloadOutcome>
    where
        F: FnMut(usize, usize, &DownloadOutcome),
    {
        let total = references.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, reference) in references.iter().enumerate() {
            let outcome = match self.download_one(base_url, reference, folder).await {
                Ok((path, bytes)) => {
                    debug!(reference = %reference, path = %path.display(), "item downloaded");
                    DownloadOutcome::Success {
                        reference: reference.clone(),
                        path,
                        bytes,
                    }
                }
                Err(error) => {
                    warn!(reference = %reference, error = %error, "item download failed");
                    DownloadOutcome::Failure {
                        reference: reference.clone(),
                        error,
                    }
                }
            };
            on_progress(index + 1, total, &outcome);
            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            succeeded,
            failed = total - succeeded,
            total,
            "download loop finished"
        );
        outcomes
    }

    async fn download_one(
        &self,
        base_url: &Url,
        reference: &Reference,
        folder: &Path,
    ) -> Result<(PathBuf, u64), DownloadError> {
        let target = DownloadTarget::new(base_url, reference.as_str())?;
        let path = target.destination(folder);
        let bytes = self.client.download_to_file(&target.url, &path).await?;
        Ok((path, bytes))
    }
}
