//! Turning a raw page reference into a fetchable URL and a local file name.

use std::path::{Path, PathBuf};

use url::Url;

use super::DownloadError;

/// Resolved absolute URL and destination file name for one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Absolute URL to fetch.
    pub url: Url,
    /// Bare file name, taken from the raw reference.
    pub file_name: String,
}

impl DownloadTarget {
    /// Builds the target for `reference` found on the page at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::MissingFileName`] when the reference has no
    /// usable last segment, and [`DownloadError::InvalidUrl`] when it cannot
    /// be resolved against `base_url`.
    pub fn new(base_url: &Url, reference: &str) -> Result<Self, DownloadError> {
        let file_name = file_name_from_reference(reference)
            .ok_or_else(|| DownloadError::missing_file_name(reference))?;
        let url = resolve_reference(base_url, reference)?;
        Ok(Self {
            url,
            file_name: file_name.to_string(),
        })
    }

    /// Where the body is written inside `folder`.
    #[must_use]
    pub fn destination(&self, folder: &Path) -> PathBuf {
        folder.join(&self.file_name)
    }
}

/// Resolves `reference` to an absolute URL.
///
/// A reference that already names a host is returned as [`Url::parse`]
/// normalizes it: scheme and host lower-cased, unsafe characters
/// percent-encoded, dot segments removed. Anything else
/// (relative, root-relative, protocol-relative) is joined onto `base_url`
/// following RFC 3986 section 5.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidUrl`] when the join fails.
pub fn resolve_reference(base_url: &Url, reference: &str) -> Result<Url, DownloadError> {
    if let Ok(absolute) = Url::parse(reference)
        && absolute.has_host()
    {
        return Ok(absolute);
    }
    base_url
        .join(reference)
        .map_err(|_| DownloadError::invalid_url(reference))
}

/// Last segment of the raw reference, without query or fragment.
///
/// Both `/` and `\` separate segments, matching how [`Url::join`] reads
/// an http(s) reference. Returns `None` when that segment is empty, `.` or
/// `..`.
#[must_use]
pub fn file_name_from_reference(reference: &str) -> Option<&str> {
    let without_fragment = reference.split('#').next().unwrap_or_default();
    let path = without_fragment.split('?').next().unwrap_or_default();
    let name = path.rsplit(['/', '\\']).next().unwrap_or_default();
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/dir/page.html").unwrap()
    }

    #[test]
    fn test_resolve_relative_reference_against_page_directory() {
        let resolved = resolve_reference(&base(), "img/x.jpg").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/dir/img/x.jpg");
    }

    #[test]
    fn test_resolve_absolute_reference_is_unchanged() {
        let reference = "https://cdn.example.net/media/a.mp3";
        let resolved = resolve_reference(&base(), reference).unwrap();
        assert_eq!(resolved.as_str(), reference);
    }

    #[test]
    fn test_resolve_absolute_reference_is_normalized_by_parser() {
        let resolved =
            resolve_reference(&base(), "HTTPS://CDN.Example.NET/media/my song.mp3").unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://cdn.example.net/media/my%20song.mp3"
        );
    }

    #[test]
    fn test_resolve_root_relative_and_parent_references() {
        assert_eq!(
            resolve_reference(&base(), "/files/a.mp3").unwrap().as_str(),
            "https://example.com/files/a.mp3"
        );
        assert_eq!(
            resolve_reference(&base(), "../b.jpg").unwrap().as_str(),
            "https://example.com/b.jpg"
        );
    }

    #[test]
    fn test_resolve_protocol_relative_reference_takes_base_scheme() {
        let resolved = resolve_reference(&base(), "//cdn.example.net/c.jpg").unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example.net/c.jpg");
    }

    #[test]
    fn test_resolve_keeps_query_and_fragment() {
        let resolved = resolve_reference(&base(), "a.mp3?token=1#t=10").unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://example.com/dir/a.mp3?token=1#t=10"
        );
    }

    #[test]
    fn test_file_name_is_last_segment_of_raw_reference() {
        assert_eq!(file_name_from_reference("a.mp3"), Some("a.mp3"));
        assert_eq!(file_name_from_reference("/deep/nested/b.jpg"), Some("b.jpg"));
        assert_eq!(
            file_name_from_reference("https://cdn.test/x/y/c.jpg"),
            Some("c.jpg")
        );
    }

    #[test]
    fn test_file_name_strips_query_and_fragment() {
        assert_eq!(file_name_from_reference("a.mp3?dl=1"), Some("a.mp3"));
        assert_eq!(file_name_from_reference("b.jpg#top"), Some("b.jpg"));
        assert_eq!(file_name_from_reference("c.jpg?x=1#y"), Some("c.jpg"));
    }

    #[test]
    fn test_file_name_rejects_empty_and_dot_segments() {
        assert_eq!(file_name_from_reference(""), None);
        assert_eq!(file_name_from_reference("media/"), None);
        assert_eq!(file_name_from_reference("media/.."), None);
        assert_eq!(file_name_from_reference("?only=query"), None);
    }

    #[test]
    fn test_target_uses_raw_reference_name_not_resolved_url() {
        let target = DownloadTarget::new(&base(), "sub/track.mp3").unwrap();
        assert_eq!(target.url.as_str(), "https://example.com/dir/sub/track.mp3");
        assert_eq!(target.file_name, "track.mp3");
        assert_eq!(
            target.destination(Path::new("/tmp/out")),
            PathBuf::from("/tmp/out/track.mp3")
        );
    }

    #[test]
    fn test_file_name_treats_backslash_as_separator() {
        assert_eq!(file_name_from_reference("sub\\x.jpg"), Some("x.jpg"));
        assert_eq!(file_name_from_reference("..\\..\\evil.jpg"), Some("evil.jpg"));
        assert_eq!(file_name_from_reference("media\\"), None);
        assert_eq!(file_name_from_reference("media\\.."), None);
    }

    #[test]
    fn test_target_with_backslashes_stays_inside_folder() {
        let target = DownloadTarget::new(&base(), "..\\..\\evil.jpg").unwrap();
        assert_eq!(target.url.as_str(), "https://example.com/evil.jpg");
        assert_eq!(target.file_name, "evil.jpg");
        assert_eq!(
            target.destination(Path::new("/out")),
            PathBuf::from("/out/evil.jpg")
        );

        let target = DownloadTarget::new(&base(), "sub\\x.jpg").unwrap();
        assert_eq!(target.url.as_str(), "https://example.com/dir/sub/x.jpg");
        assert_eq!(target.file_name, "x.jpg");
    }

    #[test]
    fn test_target_without_file_name_fails() {
        let err = DownloadTarget::new(&base(), "folder/").unwrap_err();
        assert!(matches!(err, DownloadError::MissingFileName { .. }));
    }
}
