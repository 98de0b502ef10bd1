//! Bundling: a document plus its stylesheet, image and script dependencies,
//! packaged as a rewritten document, a resource map and a manifest.

use std::collections::BTreeMap;
use std::sync::Arc;

use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

use webfs_core::DIR_CONTENT_TYPE;

use crate::error::Error;
use crate::node::{HttpNode, ReadOptions};
use crate::registry::{Registry, ResolveOptions};

pub(crate) const RSRC_DIR: &str = ".rsrc";
pub(crate) const BUNDLE_SELECTOR: &str = "link, img, script";

/// A manifest field that is either inline data or a file reference.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ManifestMapping {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: serde_json::Value,
}

impl ManifestMapping {
    pub fn object(value: serde_json::Value) -> Self {
        Self {
            kind: "object".to_string(),
            value,
        }
    }

    pub fn file(name: &str) -> Self {
        Self {
            kind: "file".to_string(),
            value: serde_json::Value::String(name.to_string()),
        }
    }
}

/// Bundle manifest, serialized alongside the rewritten document.
#[derive(Debug, Clone, Serialize)]
pub struct BundleManifest {
    pub mime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<i64>,
    pub origin: String,
    pub meta: ManifestMapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ManifestMapping>,
}

impl BundleManifest {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A bundled document with at least one captured resource.
#[derive(Debug)]
pub struct BundleTree {
    pub manifest: BundleManifest,
    /// Resource key to resolved node, key order deterministic.
    pub resources: BTreeMap<String, Arc<HttpNode>>,
    /// Document text with captured references rewritten to `.rsrc/` paths.
    pub document: String,
    /// File name the rewritten document should be stored under.
    pub name: String,
}

/// Result of bundling: a page with no capturable resources stays plain.
#[derive(Debug)]
pub enum Bundle {
    Plain(String),
    Tree(BundleTree),
}

/// One reference the bundler plans to capture.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BundleEntry {
    /// Attribute value exactly as written in the document.
    pub raw: String,
    /// Attribute the value was read from (`href` for `link`, else `src`).
    pub attr: &'static str,
    pub uri: Url,
    /// Manifest key: the raw reference minus query and fragment, slashes
    /// flattened to underscores.
    pub key: String,
    /// Replacement attribute value under the resource directory.
    pub local: String,
}

impl HttpNode {
    /// Package the document together with its referenced resources.
    ///
    /// Stylesheets, images and scripts are resolved in document order; a
    /// reference that fails to resolve is left in place unrewritten. A
    /// document referencing nothing capturable comes back as
    /// [`Bundle::Plain`].
    pub async fn bundle(&self, registry: &Registry) -> Result<Bundle, Error> {
        let (content, _) = self
            .read(&ReadOptions {
                range: None,
                as_text: true,
            })
            .await?;

        let content_type = self.content_type().unwrap_or_default();
        if content_type != "text/html" && content_type != DIR_CONTENT_TYPE {
            return Err(Error::NotBundleable {
                uri: self.ident().to_string(),
            });
        }

        let text = content.into_text();
        let base = self.redirect_base();
        let entries = plan_bundle(&text, &base)?;

        let mut resources = BTreeMap::new();
        let mut rewrites = Vec::new();
        for entry in entries {
            if resources.contains_key(&entry.key) {
                rewrites.push((entry.attr, entry.raw, entry.local));
                continue;
            }
            match registry
                .resolve(entry.uri.as_str(), ResolveOptions::default())
                .await
            {
                Ok(node) => {
                    resources.insert(entry.key, node);
                    rewrites.push((entry.attr, entry.raw, entry.local));
                }
                Err(error) => {
                    tracing::warn!(
                        document = %self.ident(),
                        resource = %entry.uri,
                        %error,
                        "leaving unresolvable resource reference in place"
                    );
                }
            }
        }

        if resources.is_empty() {
            return Ok(Bundle::Plain(text));
        }

        let document = rewrite_references(&text, &rewrites);
        let name = self.name();
        let manifest = BundleManifest {
            mime: content_type,
            mtime: self.mtime(),
            origin: self.ident().to_string(),
            meta: ManifestMapping::object(serde_json::json!({
                "mime": "text/html",
                "mtime": self.mtime(),
            })),
            data: Some(ManifestMapping::file(&name)),
        };
        Ok(Bundle::Tree(BundleTree {
            manifest,
            resources,
            document,
            name,
        }))
    }
}

/// Collect capturable references in document order.
///
/// Synchronous on purpose: the parsed DOM never crosses an await point.
pub(crate) fn plan_bundle(html: &str, base: &Url) -> Result<Vec<BundleEntry>, Error> {
    let selector = Selector::parse(BUNDLE_SELECTOR).map_err(|e| Error::Parse {
        message: format!("bad bundle selector: {e}"),
    })?;
    let document = Html::parse_document(html);

    let mut entries = Vec::new();
    for element in document.select(&selector) {
        let attr = if element.value().name().eq_ignore_ascii_case("link") {
            "href"
        } else {
            "src"
        };
        let Some(raw) = element.value().attr(attr) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        let Ok(resolved) = base.join(raw) else {
            continue;
        };
        entries.push(BundleEntry {
            raw: raw.to_string(),
            attr,
            uri: resolved,
            key: transliterate(raw),
            local: format!("{}/{}", RSRC_DIR, raw.replace('/', "_")),
        });
    }
    Ok(entries)
}

/// Flatten a raw reference into a manifest key.
pub(crate) fn transliterate(raw: &str) -> String {
    let stripped = raw.split(['?', '#']).next().unwrap_or(raw);
    stripped.replace('/', "_")
}

/// Substitute captured attribute values with their local paths.
///
/// Only `link`, `img` and `script` tags are touched, so an uncaptured
/// element sharing the same value (an anchor to a stylesheet, say) stays as
/// authored. Untouched markup is kept byte-identical.
pub(crate) fn rewrite_references(
    html: &str,
    rewrites: &[(&'static str, String, String)],
) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some((tag_start, attr)) = next_capture_tag(&lower, pos) {
        let tag_end = match lower[tag_start..].find('>') {
            Some(offset) => tag_start + offset + 1,
            None => break,
        };
        out.push_str(&html[pos..tag_start]);
        let tag = &html[tag_start..tag_end];
        let tag_lower = &lower[tag_start..tag_end];
        let rewritten = attr_value_span(tag, tag_lower, attr).and_then(|(start, end)| {
            let value = &tag[start..end];
            rewrites
                .iter()
                .find(|(a, raw, _)| *a == attr && raw == value)
                .map(|(_, _, local)| format!("{}{}{}", &tag[..start], local, &tag[end..]))
        });
        match rewritten {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(tag),
        }
        pos = tag_end;
    }
    out.push_str(&html[pos..]);
    out
}

/// Earliest capturable tag at or after `from`, with the attribute the
/// bundler reads from it.
fn next_capture_tag(lower: &str, from: usize) -> Option<(usize, &'static str)> {
    let mut best: Option<(usize, &'static str)> = None;
    for (open, attr) in [("<link", "href"), ("<img", "src"), ("<script", "src")] {
        let mut search = from;
        while let Some(found) = lower[search..].find(open) {
            let at = search + found;
            let after = lower.as_bytes().get(at + open.len()).copied();
            // Reject a longer tag name sharing this prefix.
            if matches!(after, None | Some(b' ' | b'\t' | b'\n' | b'\r' | b'/' | b'>')) {
                if best.map_or(true, |(b, _)| at < b) {
                    best = Some((at, attr));
                }
                break;
            }
            search = at + open.len();
        }
    }
    best
}

/// Byte span of a quoted attribute value inside one tag. The attribute name
/// must sit at a boundary, so `data-src` never stands in for `src`.
fn attr_value_span(tag: &str, tag_lower: &str, attr: &str) -> Option<(usize, usize)> {
    let needle = format!("{attr}=");
    let mut search = 0;
    while let Some(found) = tag_lower[search..].find(&needle) {
        let at = search + found;
        if !matches!(
            tag_lower.as_bytes()[..at].last(),
            Some(b' ' | b'\t' | b'\n' | b'\r')
        ) {
            search = at + needle.len();
            continue;
        }
        let value_at = at + needle.len();
        let quote = *tag.as_bytes().get(value_at)?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        let start = value_at + 1;
        let end = start + tag[start..].find(quote as char)?;
        return Some((start, end));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/page/").unwrap()
    }

    #[test]
    fn links_use_href_others_use_src() {
        let entries = plan_bundle(
            r#"<link href="style.css"><img src="logo.png"><script src="app.js"></script>"#,
            &base(),
        )
        .unwrap();
        let raws: Vec<_> = entries.iter().map(|e| e.raw.as_str()).collect();
        assert_eq!(raws, vec!["style.css", "logo.png", "app.js"]);
    }

    #[test]
    fn keys_flatten_paths_and_drop_queries() {
        assert_eq!(transliterate("css/style.css?v=3"), "css_style.css");
        assert_eq!(transliterate("/a/b/c.js#frag"), "_a_b_c.js");
        assert_eq!(transliterate("plain.png"), "plain.png");
    }

    #[test]
    fn local_path_keeps_query_in_flattened_name() {
        let entries = plan_bundle(r#"<img src="img/pic.png?s=2">"#, &base()).unwrap();
        assert_eq!(entries[0].key, "img_pic.png");
        assert_eq!(entries[0].local, ".rsrc/img_pic.png?s=2");
    }

    #[test]
    fn rewrite_is_exact_and_quote_aware() {
        let html = r#"<link href="style.css"><img src='style.css'><link href="style.css.bak">"#;
        let out = rewrite_references(
            html,
            &[
                ("href", "style.css".to_string(), ".rsrc/style.css".to_string()),
                ("src", "style.css".to_string(), ".rsrc/style.css".to_string()),
            ],
        );
        assert!(out.contains(r#"<link href=".rsrc/style.css">"#));
        assert!(out.contains(r#"<img src='.rsrc/style.css'>"#));
        assert!(out.contains(r#"style.css.bak"#));
    }

    #[test]
    fn rewrite_leaves_uncaptured_elements_alone() {
        let html = r#"<link href="style.css"><a href="style.css">the stylesheet</a>"#;
        let out = rewrite_references(
            html,
            &[("href", "style.css".to_string(), ".rsrc/style.css".to_string())],
        );
        assert!(out.contains(r#"<link href=".rsrc/style.css">"#));
        assert!(out.contains(r#"<a href="style.css">the stylesheet</a>"#));
    }

    #[test]
    fn rewrite_skips_prefixed_attribute_names() {
        let html = r#"<img data-src="logo.png" src="logo.png">"#;
        let out = rewrite_references(
            html,
            &[("src", "logo.png".to_string(), ".rsrc/logo.png".to_string())],
        );
        assert!(out.contains(r#"data-src="logo.png""#));
        assert!(out.contains(r#" src=".rsrc/logo.png""#));
    }

    #[test]
    fn manifest_serializes_wire_shape() {
        let manifest = BundleManifest {
            mime: "text/html".to_string(),
            mtime: Some(100),
            origin: "https://example.com/page".to_string(),
            meta: ManifestMapping::object(serde_json::json!({"mime": "text/html", "mtime": 100})),
            data: Some(ManifestMapping::file("page")),
        };
        let value: serde_json::Value = serde_json::from_str(&manifest.to_json()).unwrap();
        assert_eq!(value["mime"], "text/html");
        assert_eq!(value["meta"]["type"], "object");
        assert_eq!(value["meta"]["value"]["mtime"], 100);
        assert_eq!(value["data"]["type"], "file");
        assert_eq!(value["data"]["value"], "page");
    }
}
