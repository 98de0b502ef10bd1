//! Directory emulation over HTML documents.
//!
//! An HTML page enumerates as a directory of the resources it references:
//! anchors and images by default, or whatever a mount's filter selects.
//! Listing-derived child metadata is speculative by construction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;

use webfs_core::{
    basename_dir, content_type_for_extension, Metadata, Trust, DIR_CONTENT_TYPE, IMAGE_UNKNOWN,
};

use crate::error::Error;
use crate::node::{Handler, HttpNode, ReadOptions};
use crate::registry::{Registry, ResolveOptions};

pub(crate) const DEFAULT_FILTER: &str = "a, img";

/// One reference extracted from a listing document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChildCandidate {
    pub name: String,
    pub uri: Url,
    pub content_type: String,
}

impl HttpNode {
    /// Enumerate the document's referenced resources as named children.
    ///
    /// The first enumeration fetches and parses the page and registers each
    /// child with speculative metadata; later calls serve the cached table
    /// until an update with a new modification time invalidates it.
    /// Concurrent calls on one node coalesce into a single fetch.
    pub async fn readdir(
        &self,
        registry: &Registry,
    ) -> Result<Vec<(String, Arc<HttpNode>)>, Error> {
        let _gate = self.dir_gate.lock().await;

        if let Some(children) = self.cached_children()? {
            return Ok(children);
        }

        let (content, _) = self
            .read(&ReadOptions {
                range: None,
                as_text: true,
            })
            .await?;

        // The read may have retyped the node away from a directory.
        if !self.is_dir() {
            return Err(Error::NotADirectory {
                uri: self.ident().to_string(),
            });
        }

        let base = self.redirect_base();
        let parent_mtime = self.mtime();
        let filter = self
            .fs()
            .opts()
            .html_filter
            .clone()
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let candidates = unique_names(parse_candidates(&content.into_text(), &base, &filter)?);

        let mut resolved = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let meta = Metadata {
                name: Some(candidate.name.clone()),
                content_type: Some(candidate.content_type.clone()),
                trust: Trust::Speculative,
                mtime: parent_mtime,
                readable: true,
                ..Metadata::default()
            };
            let opts = ResolveOptions { meta: Some(meta) };
            match registry.resolve(candidate.uri.as_str(), opts).await {
                Ok(node) => resolved.push((candidate.name, node)),
                Err(error) => {
                    tracing::warn!(
                        parent = %self.ident(),
                        child = %candidate.uri,
                        %error,
                        "skipping unresolvable listing entry"
                    );
                }
            }
        }

        let mut state = self.state.lock().unwrap();
        if let Handler::HtmlDir(dir) = &mut state.handler {
            dir.children = resolved;
            dir.populated = true;
            Ok(dir.children.clone())
        } else {
            Err(Error::NotADirectory {
                uri: self.ident().to_string(),
            })
        }
    }

    /// Cached children when populated, `None` when a fetch is needed, an
    /// error when the node is not directory-shaped.
    fn cached_children(&self) -> Result<Option<Vec<(String, Arc<HttpNode>)>>, Error> {
        let state = self.state.lock().unwrap();
        match &state.handler {
            Handler::HtmlDir(dir) if dir.populated => Ok(Some(
                dir.children
                    .iter()
                    .map(|(name, node)| (name.clone(), node.clone()))
                    .collect(),
            )),
            Handler::HtmlDir(_) | Handler::Unbound => Ok(None),
            Handler::Blob => Err(Error::NotADirectory {
                uri: self.ident().to_string(),
            }),
        }
    }
}

/// Extract child candidates from a listing document.
///
/// Synchronous on purpose: the parsed DOM never crosses an await point.
pub(crate) fn parse_candidates(
    html: &str,
    base: &Url,
    filter: &str,
) -> Result<Vec<ChildCandidate>, Error> {
    let selector = Selector::parse(filter).map_err(|e| Error::Parse {
        message: format!("bad listing filter {filter:?}: {e}"),
    })?;
    let document = Html::parse_document(&neutralize_img_src(html));

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if !seen.insert(resolved.to_string()) {
            continue;
        }
        let is_img = element.value().name().eq_ignore_ascii_case("img");
        let name = if is_img {
            basename_dir(resolved.as_str())
        } else {
            let title = element.value().attr("title").map(str::trim).unwrap_or("");
            if !title.is_empty() {
                title.to_string()
            } else {
                let text: String = element.text().collect();
                let text = text.trim();
                if !text.is_empty() {
                    text.to_string()
                } else {
                    basename_dir(resolved.as_str())
                }
            }
        };
        let content_type = if is_img {
            IMAGE_UNKNOWN.to_string()
        } else if resolved.as_str().ends_with('/') {
            DIR_CONTENT_TYPE.to_string()
        } else {
            content_type_for_extension(resolved.as_str())
                .unwrap_or("text/html")
                .to_string()
        };
        candidates.push(ChildCandidate {
            name,
            uri: resolved,
            content_type,
        });
    }
    Ok(candidates)
}

/// Make image references extractable by the same attribute as anchors.
///
/// Rewrites `src=` to `href=` inside `<img>` tags only, before parsing.
/// All matched text is ASCII so byte offsets stay valid.
pub(crate) fn neutralize_img_src(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(found) = lower[pos..].find("<img") {
        let tag_start = pos + found;
        let tag_end = match lower[tag_start..].find('>') {
            Some(offset) => tag_start + offset + 1,
            None => break,
        };
        out.push_str(&html[pos..tag_start]);
        let tag = &html[tag_start..tag_end];
        let tag_lower = &lower[tag_start..tag_end];
        if let Some(src_at) = find_src_attr(tag_lower) {
            out.push_str(&tag[..src_at]);
            out.push_str("href=");
            out.push_str(&tag[src_at + 4..]);
        } else {
            out.push_str(tag);
        }
        pos = tag_end;
    }
    out.push_str(&html[pos..]);
    out
}

/// Offset of a genuine `src=` attribute within one tag. The name must sit
/// at an attribute boundary, so `data-src=` never matches.
fn find_src_attr(tag_lower: &str) -> Option<usize> {
    let mut search = 0;
    while let Some(found) = tag_lower[search..].find("src=") {
        let at = search + found;
        if matches!(
            tag_lower.as_bytes()[..at].last(),
            Some(b' ' | b'\t' | b'\n' | b'\r')
        ) {
            return Some(at);
        }
        search = at + 4;
    }
    None
}

/// Disambiguate duplicate names with a numeric suffix, first occurrence
/// keeping the bare name.
pub(crate) fn unique_names(candidates: Vec<ChildCandidate>) -> Vec<ChildCandidate> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, u32> = HashMap::new();
    candidates
        .into_iter()
        .map(|mut candidate| {
            if taken.insert(candidate.name.clone()) {
                return candidate;
            }
            let counter = counters.entry(candidate.name.clone()).or_insert(2);
            loop {
                let attempt = format!("{}-{}", candidate.name, counter);
                *counter += 1;
                if taken.insert(attempt.clone()) {
                    candidate.name = attempt;
                    return candidate;
                }
            }
        })
        .collect()
}
