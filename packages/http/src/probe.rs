//! Metadata probing via `HEAD`.

use url::Url;
use webfs_core::{normalize_content_type, Metadata, Trust};

use crate::error::Error;
use crate::transport::{Transport, TransportResponse};

/// Probe a resource for authoritative metadata. Never fetches the body and
/// never mutates any node; callers decide what to do with the result.
pub async fn probe(transport: &dyn Transport, uri: &Url) -> Result<Metadata, Error> {
    let response = transport.head(uri).await?;
    if response.status == 404 {
        return Err(Error::NotFound {
            uri: uri.to_string(),
        });
    }
    if !response.is_success() {
        return Err(Error::Status {
            status: response.status,
            uri: uri.to_string(),
        });
    }
    Ok(metadata_from_response(uri, &response))
}

/// Translate response headers into metadata.
///
/// The content type is authoritative only when the server actually sent a
/// parseable `Content-Type`; otherwise the type stays unknown rather than
/// being defaulted, so speculative knowledge elsewhere is not clobbered.
pub fn metadata_from_response(uri: &Url, response: &TransportResponse) -> Metadata {
    let mut meta = Metadata {
        readable: true,
        ..Metadata::default()
    };
    if response.final_url != *uri {
        meta.redirect = Some(response.final_url.clone());
    }
    if let Some(value) = response.header(http::header::LAST_MODIFIED.as_str()) {
        if let Ok(parsed) = chrono::DateTime::parse_from_rfc2822(value) {
            meta.mtime = Some(parsed.timestamp_millis());
        }
    }
    if let Some(raw) = response.header(http::header::CONTENT_TYPE.as_str()) {
        if let Some(content_type) = normalize_content_type(raw) {
            meta.content_type = Some(content_type);
            meta.trust = Trust::Authoritative;
        }
    }
    if let Some(value) = response.header(http::header::CONTENT_LENGTH.as_str()) {
        if let Ok(size) = value.trim().parse::<u64>() {
            meta.size = Some(size);
        }
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::response;

    #[test]
    fn full_header_set() {
        let uri = Url::parse("https://example.com/a.txt").unwrap();
        let resp = response(
            "https://example.com/a.txt",
            200,
            &[
                ("Content-Type", "text/plain; charset=utf-8"),
                ("Content-Length", "42"),
                ("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
            ],
            "",
        );
        let meta = metadata_from_response(&uri, &resp);
        assert_eq!(meta.content_type.as_deref(), Some("text/plain"));
        assert_eq!(meta.trust, Trust::Authoritative);
        assert_eq!(meta.size, Some(42));
        assert_eq!(meta.mtime, Some(1445412480000));
        assert!(meta.readable);
        assert!(meta.redirect.is_none());
    }

    #[test]
    fn missing_content_type_stays_untrusted() {
        let uri = Url::parse("https://example.com/blob").unwrap();
        let resp = response("https://example.com/blob", 200, &[], "");
        let meta = metadata_from_response(&uri, &resp);
        assert!(meta.content_type.is_none());
        assert_eq!(meta.trust, Trust::None);
    }

    #[test]
    fn unparseable_content_type_ignored() {
        let uri = Url::parse("https://example.com/blob").unwrap();
        let resp = response(
            "https://example.com/blob",
            200,
            &[("Content-Type", "garbage")],
            "",
        );
        let meta = metadata_from_response(&uri, &resp);
        assert!(meta.content_type.is_none());
        assert_eq!(meta.trust, Trust::None);
    }

    #[test]
    fn redirect_recorded_as_final_url() {
        let uri = Url::parse("https://example.com/old").unwrap();
        let resp = response("https://example.com/dir/new", 200, &[], "");
        let meta = metadata_from_response(&uri, &resp);
        assert_eq!(
            meta.redirect.map(|u| u.to_string()),
            Some("https://example.com/dir/new".to_string())
        );
    }
}
