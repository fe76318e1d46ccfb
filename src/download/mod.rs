//! Fetching the page and downloading the files it references.
//!
//! # Features
//!
//! - Page fetch returning the body as text
//! - Reference resolution against the page URL (RFC 3986)
//! - File naming from the raw reference's last path segment
//! - Strictly sequential downloads with per-item error isolation
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use site_downloader_core::download::HttpClient;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let html = client.fetch_page(&Url::parse("https://example.com/")?).await?;
//! println!("{} bytes of HTML", html.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod engine;
mod error;
mod target;

pub use client::HttpClient;
pub use engine::{DownloadOutcome, Downloader};
pub use error::DownloadError;
pub use target::{DownloadTarget, file_name_from_reference, resolve_reference};
