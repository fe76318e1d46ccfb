//! Link extraction from fetched HTML pages.
//!
//! Scans anchor `href` and image `src` attributes and keeps the values that
//! end with one of the selected suffixes.
//!
//! # Ordering
//!
//! Output is grouped, not in pure document order:
//!
//! 1. for each suffix (in set order), every matching anchor in document order
//! 2. then, for each suffix, every matching image in document order
//!
//! Nothing is deduplicated. A value found twice in the page appears twice.
//!
//! # Example
//!
//! ```
//! use site_downloader_core::extract::{SuffixSet, extract_references};
//!
//! let html = r#"<a href="a.mp3">a</a><img src="b.jpg"><a href="c.txt">c</a>"#;
//! let suffixes: SuffixSet = [".mp3", ".jpg"].into_iter().collect();
//! let found: Vec<_> = extract_references(html, &suffixes)
//!     .iter()
//!     .map(|r| r.as_str().to_string())
//!     .collect();
//! assert_eq!(found, vec!["a.mp3", "b.jpg"]);
//! ```

mod suffix;

use std::fmt;

use scraper::Html;
use serde::Serialize;
use tracing::debug;

pub use suffix::{DEFAULT_FORMATS, SuffixSet};

/// Which element an extracted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// `<a href="...">`
    Anchor,
    /// `<img src="...">`
    Image,
}

impl ReferenceKind {
    fn element_and_attribute(self) -> (&'static str, &'static str) {
        match self {
            Self::Anchor => ("a", "href"),
            Self::Image => ("img", "src"),
        }
    }
}

/// A raw attribute value taken verbatim from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    value: String,
    kind: ReferenceKind,
}

impl Reference {
    #[must_use]
    pub fn new(value: impl Into<String>, kind: ReferenceKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// The attribute value exactly as written in the page.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Extracts candidate file references from `html`.
///
/// Parsing is best effort: malformed markup never fails, unparseable
/// fragments are simply skipped. See the module docs for output order.
#[must_use]
pub fn extract_references(html: &str, suffixes: &SuffixSet) -> Vec<Reference> {
    let document = Html::parse_document(html);
    let anchors = attribute_values(&document, ReferenceKind::Anchor);
    let images = attribute_values(&document, ReferenceKind::Image);

    let mut references = Vec::new();
    for (kind, values) in [(ReferenceKind::Anchor, &anchors), (ReferenceKind::Image, &images)] {
        for suffix in suffixes.iter() {
            references.extend(
                values
                    .iter()
                    .filter(|value| value.to_lowercase().ends_with(suffix))
                    .map(|value| Reference::new(*value, kind)),
            );
        }
    }

    debug!(
        anchors = anchors.len(),
        images = images.len(),
        matched = references.len(),
        suffixes = %suffixes,
        "extracted references"
    );
    references
}

/// Collects the attribute for every element of `kind`, in document order.
fn attribute_values(document: &Html, kind: ReferenceKind) -> Vec<&str> {
    let (element_name, attribute) = kind.element_and_attribute();
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_element())
        .filter(|element| element.name() == element_name)
        .filter_map(|element| element.attr(attribute))
        .collect()
}
