//! Display names and content-type guesses derived from URIs.

/// Final path segment of a URI, usable as a display name.
///
/// Query and fragment are ignored; a trailing slash names the last directory
/// segment (`https://host/docs/` names `docs`). Falls back to the stripped
/// URI itself when no segment can be extracted.
pub fn basename_dir(uri: &str) -> String {
    let stripped = uri.split(['?', '#']).next().unwrap_or(uri);
    let trimmed = stripped.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or("");
    if segment.is_empty() || segment.ends_with(':') {
        stripped.to_string()
    } else {
        segment.to_string()
    }
}

/// Guess a content type from a URI's file extension.
pub fn content_type_for_extension(uri: &str) -> Option<&'static str> {
    let base = basename_dir(uri);
    let (_, ext) = base.rsplit_once('.')?;
    let guessed = match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "txt" | "text" => "text/plain",
        "css" => "text/css",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(guessed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_file_segment() {
        assert_eq!(basename_dir("https://example.com/docs/a.txt"), "a.txt");
    }

    #[test]
    fn trailing_slash_names_directory() {
        assert_eq!(basename_dir("https://example.com/docs/"), "docs");
    }

    #[test]
    fn host_root() {
        assert_eq!(basename_dir("https://example.com/"), "example.com");
        assert_eq!(basename_dir("https://example.com"), "example.com");
    }

    #[test]
    fn query_and_fragment_ignored() {
        assert_eq!(
            basename_dir("https://example.com/a.txt?x=1#frag"),
            "a.txt"
        );
    }

    #[test]
    fn degenerate_uri_falls_back() {
        assert_eq!(basename_dir("https://"), "https://");
    }

    #[test]
    fn extension_guesses() {
        assert_eq!(
            content_type_for_extension("https://h/a.txt"),
            Some("text/plain")
        );
        assert_eq!(
            content_type_for_extension("https://h/style.CSS"),
            Some("text/css")
        );
        assert_eq!(
            content_type_for_extension("https://h/pic.png?s=64"),
            Some("image/png")
        );
        assert_eq!(content_type_for_extension("https://h/noext"), None);
        assert_eq!(content_type_for_extension("https://h/a.weird"), None);
    }
}
