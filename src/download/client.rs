//! HTTP client wrapper for fetching pages and files.
//!
//! This module provides the `HttpClient` struct. Requests carry no custom
//! headers, cookies or credentials. Bodies are read fully into memory before
//! anything is written to disk.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;

/// HTTP client shared by the page fetch and every file download of a run.
///
/// # Example
///
/// ```no_run
/// use site_downloader_core::download::HttpClient;
/// use std::path::Path;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let url = Url::parse("https://example.com/song.mp3")?;
/// let bytes = client.download_to_file(&url, Path::new("./downloads/song.mp3")).await?;
/// println!("wrote {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with reqwest's default configuration (no timeouts).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client with explicit connect and overall request timeouts.
    ///
    /// `None` leaves the corresponding reqwest default in place.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(connect_timeout: Option<Duration>, read_timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(connect) = connect_timeout {
            builder = builder.connect_timeout(connect);
        }
        if let Some(read) = read_timeout {
            builder = builder.timeout(read);
        }
        let client = builder
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches `url` and returns the body decoded as text.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the request fails, times out, the server
    /// answers with a non-success status, or the body cannot be read.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &Url) -> Result<String, DownloadError> {
        debug!("fetching page");
        let response = self.send_request(url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| DownloadError::from_request(url.as_str(), e))?;
        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// Downloads `url` and writes the whole body to `file_path`.
    ///
    /// An existing file at `file_path` is overwritten. The parent directory
    /// is never created.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    #[instrument(skip(self), fields(url = %url, path = %file_path.display()))]
    pub async fn download_to_file(&self, url: &Url, file_path: &Path) -> Result<u64, DownloadError> {
        debug!("starting download");
        let response = self.send_request(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| DownloadError::from_request(url.as_str(), e))?;

        tokio::fs::write(file_path, &body)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        let bytes = body.len() as u64;
        debug!(path = %file_path.display(), bytes, "download complete");
        Ok(bytes)
    }

    async fn send_request(&self, url: &Url) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::from_request(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }
}
