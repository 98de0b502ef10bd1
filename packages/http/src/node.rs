//! Nodes: identity, trust-tracked metadata and the in-place handler swap.
//!
//! A node is created once per URI and lives for the registry's lifetime.
//! Its behavioral shape is a [`Handler`] chosen by content type; when an
//! update changes the resolved type the handler is replaced inside the node,
//! so references held by callers stay valid across the swap.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use url::Url;

use webfs_core::{
    basename_dir, parse_content_range, ByteRange, EffectiveRange, HandlerKind, Metadata, Trust,
};

use crate::error::Error;
use crate::registry::HttpFs;

/// Child table of a directory-shaped node.
///
/// Names are unique; entries keep the order the listing discovered them in.
#[derive(Debug, Default)]
pub struct DirState {
    pub(crate) children: Vec<(String, Arc<HttpNode>)>,
    pub(crate) populated: bool,
}

/// The behavioral shape currently bound to a node.
#[derive(Debug, Default)]
pub enum Handler {
    /// No content type resolved yet; reads force a probe first.
    #[default]
    Unbound,
    Blob,
    HtmlDir(DirState),
}

#[derive(Debug, Default)]
pub(crate) struct NodeState {
    pub(crate) name: String,
    pub(crate) trust: Trust,
    pub(crate) content_type: Option<String>,
    pub(crate) mtime: Option<i64>,
    pub(crate) size: Option<u64>,
    pub(crate) readable: bool,
    pub(crate) redirect: Option<Url>,
    pub(crate) handler: Handler,
}

/// One HTTP(S) resource viewed as a filesystem node.
pub struct HttpNode {
    ident: Url,
    fs: Arc<HttpFs>,
    pub(crate) state: Mutex<NodeState>,
    /// Serializes directory enumeration so concurrent `readdir` calls do not
    /// each fetch and parse the page.
    pub(crate) dir_gate: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for HttpNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNode")
            .field("ident", &self.ident.as_str())
            .finish_non_exhaustive()
    }
}

/// Options for [`HttpNode::read`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Byte range to request; `None` fetches the whole body.
    pub range: Option<ByteRange>,
    /// Decode the body as text (lossy UTF-8) instead of returning bytes.
    pub as_text: bool,
}

/// Data returned by a read.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Bytes(Bytes),
    Text(String),
}

impl Content {
    pub fn len(&self) -> usize {
        match self {
            Content::Bytes(b) => b.len(),
            Content::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_text(self) -> String {
        match self {
            Content::Text(t) => t,
            Content::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Bytes(b) => b,
            Content::Text(t) => t.as_bytes(),
        }
    }
}

impl HttpNode {
    pub(crate) fn new(ident: Url, name: Option<String>, fs: Arc<HttpFs>) -> Arc<Self> {
        let name = name.unwrap_or_else(|| basename_dir(ident.as_str()));
        Arc::new(Self {
            ident,
            fs,
            state: Mutex::new(NodeState {
                name,
                ..NodeState::default()
            }),
            dir_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// The node's identity. Stable for the node's whole lifetime.
    pub fn ident(&self) -> &Url {
        &self.ident
    }

    pub fn name(&self) -> String {
        self.state.lock().unwrap().name.clone()
    }

    pub fn content_type(&self) -> Option<String> {
        self.state.lock().unwrap().content_type.clone()
    }

    pub fn trust(&self) -> Trust {
        self.state.lock().unwrap().trust
    }

    pub fn mtime(&self) -> Option<i64> {
        self.state.lock().unwrap().mtime
    }

    pub fn size(&self) -> Option<u64> {
        self.state.lock().unwrap().size
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.state.lock().unwrap().handler, Handler::HtmlDir(_))
    }

    pub(crate) fn fs(&self) -> &Arc<HttpFs> {
        &self.fs
    }

    /// Probe the resource and apply the result. Returns the probed record.
    pub async fn stat(&self) -> Result<Metadata, Error> {
        let meta = crate::probe::probe(self.fs.transport(), &self.ident).await?;
        self.update(&meta);
        Ok(meta)
    }

    /// Apply a metadata record to the node.
    ///
    /// A record that would retype an authoritatively bound node with less
    /// than authoritative trust is dropped whole. Otherwise a type change
    /// (or a first binding) installs a fresh handler for the new type, and
    /// freshness fields merge in.
    pub fn update(&self, meta: &Metadata) {
        let mut state = self.state.lock().unwrap();
        if let Some(new_type) = meta.content_type.as_deref() {
            let type_changed = state.content_type.as_deref() != Some(new_type);
            if type_changed
                && state.trust == Trust::Authoritative
                && meta.trust != Trust::Authoritative
            {
                tracing::debug!(
                    uri = %self.ident,
                    current = state.content_type.as_deref().unwrap_or(""),
                    proposed = new_type,
                    "dropping speculative retype of an authoritative node"
                );
                return;
            }
            if type_changed || matches!(state.handler, Handler::Unbound) {
                state.handler = match self.fs.dispatch(new_type) {
                    HandlerKind::Blob => Handler::Blob,
                    HandlerKind::HtmlDir => Handler::HtmlDir(DirState::default()),
                };
                state.content_type = Some(new_type.to_string());
            }
        }
        Self::merge(&mut state, meta);
    }

    fn merge(state: &mut NodeState, meta: &Metadata) {
        if let Some(mtime) = meta.mtime {
            if state.mtime != Some(mtime) {
                // Modification time moved; any cached listing is stale.
                if let Handler::HtmlDir(dir) = &mut state.handler {
                    dir.children.clear();
                    dir.populated = false;
                }
            }
            state.mtime = Some(mtime);
        }
        if let Some(size) = meta.size {
            state.size = Some(size);
        }
        if meta.readable {
            state.readable = true;
        }
        if let Some(redirect) = &meta.redirect {
            state.redirect = Some(redirect.clone());
        }
        if meta.content_type.is_some() {
            match meta.trust {
                Trust::Authoritative => state.trust = Trust::Authoritative,
                Trust::Speculative => {
                    if state.trust == Trust::None {
                        state.trust = Trust::Speculative;
                    }
                }
                Trust::None => {}
            }
        }
    }

    /// Read the resource's data.
    ///
    /// A node whose content type is not authoritative re-probes first, so a
    /// handler bound from a guess is confirmed or corrected before any data
    /// is interpreted under it.
    pub async fn read(&self, opts: &ReadOptions) -> Result<(Content, EffectiveRange), Error> {
        if self.trust() != Trust::Authoritative {
            self.stat().await?;
        }
        self.fetch(opts).await
    }

    pub(crate) async fn fetch(
        &self,
        opts: &ReadOptions,
    ) -> Result<(Content, EffectiveRange), Error> {
        let mut headers = Vec::new();
        if let Some(value) = opts.range.as_ref().and_then(ByteRange::to_header_value) {
            headers.push((http::header::RANGE.as_str().to_string(), value));
        }
        let response = self.fs.transport().get(&self.ident, &headers).await?;
        if response.status == 404 {
            return Err(Error::NotFound {
                uri: self.ident.to_string(),
            });
        }
        if !response.is_success() {
            return Err(Error::Status {
                status: response.status,
                uri: self.ident.to_string(),
            });
        }
        let effective = response
            .header(http::header::CONTENT_RANGE.as_str())
            .and_then(parse_content_range)
            .unwrap_or_else(|| EffectiveRange::unknown(response.body.len()));
        let content = if opts.as_text {
            Content::Text(response.text())
        } else {
            Content::Bytes(response.body.clone())
        };
        Ok((content, effective))
    }

    pub(crate) fn redirect_base(&self) -> Url {
        self.state
            .lock()
            .unwrap()
            .redirect
            .clone()
            .unwrap_or_else(|| self.ident.clone())
    }
}
