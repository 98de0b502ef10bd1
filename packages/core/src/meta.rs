//! Metadata records and their trust level.

use url::Url;

/// How much a metadata record's content type can be relied on.
///
/// `Speculative` values come from listing data (a parent directory's link
/// text, a file extension) and are non-binding: a read must re-probe before
/// trusting them. `Authoritative` values come from a metadata probe of the
/// resource itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Trust {
    /// No content type has been resolved at all.
    #[default]
    None,
    /// Best-effort guess supplied by a caller; non-binding.
    Speculative,
    /// Resolved by an authoritative probe of the resource.
    Authoritative,
}

/// A canonical metadata record for one resource.
///
/// Produced by the metadata probe (authoritative) or synthesized by a lazy
/// caller from listing data (speculative). Applying a record to a node is
/// always the caller's job; records themselves are inert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Display label; defaults from the URI's final path segment on the node.
    pub name: Option<String>,
    /// Resolved or guessed content type; trusted per `trust`.
    pub content_type: Option<String>,
    /// Trust level of `content_type`.
    pub trust: Trust,
    /// Last modification time, epoch milliseconds.
    pub mtime: Option<i64>,
    /// Size in bytes, when the source reported one.
    pub size: Option<u64>,
    pub readable: bool,
    /// Effective URI the resource is actually served from, when it differs
    /// from the requested one.
    pub redirect: Option<Url>,
}

impl Metadata {
    /// A speculative record carrying a guessed content type.
    pub fn speculative(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            trust: Trust::Speculative,
            readable: true,
            ..Default::default()
        }
    }

    /// An authoritative record carrying a probed content type.
    pub fn authoritative(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            trust: Trust::Authoritative,
            readable: true,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_mtime(mut self, mtime: i64) -> Self {
        self.mtime = Some(mtime);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn is_authoritative(&self) -> bool {
        self.trust == Trust::Authoritative
    }
}

/// Normalize a `Content-Type` header value: parameters stripped, lowercased.
/// Returns `None` when nothing usable remains.
pub fn normalize_content_type(raw: &str) -> Option<String> {
    let essence = raw.split(';').next().unwrap_or(raw).trim();
    if essence.is_empty() || !essence.contains('/') {
        return None;
    }
    Some(essence.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_ordering() {
        assert!(Trust::None < Trust::Speculative);
        assert!(Trust::Speculative < Trust::Authoritative);
    }

    #[test]
    fn speculative_record() {
        let meta = Metadata::speculative("text/html").with_name("index");
        assert_eq!(meta.content_type.as_deref(), Some("text/html"));
        assert_eq!(meta.trust, Trust::Speculative);
        assert!(!meta.is_authoritative());
        assert!(meta.readable);
        assert_eq!(meta.name.as_deref(), Some("index"));
    }

    #[test]
    fn authoritative_record() {
        let meta = Metadata::authoritative("image/png").with_size(1024).with_mtime(5);
        assert!(meta.is_authoritative());
        assert_eq!(meta.size, Some(1024));
        assert_eq!(meta.mtime, Some(5));
    }

    #[test]
    fn content_type_parameters_stripped() {
        assert_eq!(
            normalize_content_type("text/html; charset=utf-8"),
            Some("text/html".to_string())
        );
        assert_eq!(
            normalize_content_type("  Text/HTML "),
            Some("text/html".to_string())
        );
    }

    #[test]
    fn unusable_content_type_is_none() {
        assert_eq!(normalize_content_type(""), None);
        assert_eq!(normalize_content_type("   ; charset=utf-8"), None);
        assert_eq!(normalize_content_type("garbage"), None);
    }
}
