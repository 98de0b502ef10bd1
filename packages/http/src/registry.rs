//! Filesystem instance and the URI-to-node registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use url::Url;
use webfs_core::{HandlerKind, HandlerTable, Metadata};

use crate::error::Error;
use crate::node::HttpNode;
use crate::transport::Transport;

/// Mount-level options.
#[derive(Debug, Clone, Default)]
pub struct FsOptions {
    /// Treat HTML documents as plain blobs instead of directories.
    pub html_nodir: bool,
    /// CSS selector overriding which elements a listing extracts.
    pub html_filter: Option<String>,
}

/// One mounted HTTP filesystem: a transport, a handler table and options.
pub struct HttpFs {
    transport: Arc<dyn Transport>,
    table: HandlerTable,
    opts: FsOptions,
}

impl HttpFs {
    pub fn new(transport: Arc<dyn Transport>, opts: FsOptions) -> Arc<Self> {
        Self::with_table(transport, HandlerTable::defaults().clone(), opts)
    }

    pub fn with_table(
        transport: Arc<dyn Transport>,
        table: HandlerTable,
        opts: FsOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            table,
            opts,
        })
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn opts(&self) -> &FsOptions {
        &self.opts
    }

    /// Resolve a content type to a handler kind under this mount's options.
    pub(crate) fn dispatch(&self, content_type: &str) -> HandlerKind {
        let kind = self.table.lookup(content_type);
        if self.opts.html_nodir && kind == HandlerKind::HtmlDir {
            return HandlerKind::Blob;
        }
        kind
    }
}

/// Options for [`Registry::resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Known metadata to apply instead of probing. `None` forces a probe.
    pub meta: Option<Metadata>,
}

/// Deduplicating map from URI to node.
///
/// Resolving the same URI twice yields the same `Arc`, so updates through one
/// reference are visible through every other.
pub struct Registry {
    fs: Arc<HttpFs>,
    nodes: Mutex<HashMap<String, Arc<HttpNode>>>,
}

impl Registry {
    pub fn new(fs: Arc<HttpFs>) -> Self {
        Self {
            fs,
            nodes: Mutex::new(HashMap::new()),
        }
    }

    pub fn fs(&self) -> &Arc<HttpFs> {
        &self.fs
    }

    /// Resolve a URI to its node, creating it on first sight.
    ///
    /// With supplied metadata the node is updated lazily and no request is
    /// made; without it a probe runs and its result is applied. Fragments are
    /// not part of identity and are stripped.
    pub async fn resolve(&self, uri: &str, opts: ResolveOptions) -> Result<Arc<HttpNode>, Error> {
        let mut parsed = Url::parse(uri)?;
        parsed.set_fragment(None);

        let node = {
            let mut nodes = self.nodes.lock().unwrap();
            nodes
                .entry(parsed.to_string())
                .or_insert_with(|| {
                    let name = opts.meta.as_ref().and_then(|m| m.name.clone());
                    HttpNode::new(parsed.clone(), name, self.fs.clone())
                })
                .clone()
        };

        match &opts.meta {
            Some(meta) => node.update(meta),
            None => {
                node.stat().await?;
            }
        }
        Ok(node)
    }

    /// Forget a node. Existing references stay usable; the next resolve of
    /// the URI creates a fresh node.
    pub fn unmount(&self, uri: &str) -> Option<Arc<HttpNode>> {
        let mut parsed = Url::parse(uri).ok()?;
        parsed.set_fragment(None);
        self.nodes.lock().unwrap().remove(&parsed.to_string())
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockTransport, Verb};
    use webfs_core::Trust;

    fn registry() -> (Arc<MockTransport>, Registry) {
        let transport = Arc::new(MockTransport::new());
        let fs = HttpFs::new(transport.clone(), FsOptions::default());
        (transport, Registry::new(fs))
    }

    #[tokio::test]
    async fn same_uri_yields_same_node() {
        let (_, registry) = registry();
        let opts = ResolveOptions {
            meta: Some(Metadata::speculative("text/plain")),
        };
        let a = registry
            .resolve("https://example.com/a.txt", opts.clone())
            .await
            .unwrap();
        let b = registry
            .resolve("https://example.com/a.txt", opts)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn fragments_are_not_identity() {
        let (_, registry) = registry();
        let opts = ResolveOptions {
            meta: Some(Metadata::speculative("text/html")),
        };
        let a = registry
            .resolve("https://example.com/page#top", opts.clone())
            .await
            .unwrap();
        let b = registry
            .resolve("https://example.com/page#bottom", opts)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.ident().as_str(), "https://example.com/page");
    }

    #[tokio::test]
    async fn supplied_metadata_skips_the_probe() {
        let (transport, registry) = registry();
        let node = registry
            .resolve(
                "https://example.com/pic.png",
                ResolveOptions {
                    meta: Some(Metadata::speculative("image/png").with_name("pic")),
                },
            )
            .await
            .unwrap();
        assert!(transport.requests().is_empty());
        assert_eq!(node.name(), "pic");
        assert_eq!(node.trust(), Trust::Speculative);
    }

    #[tokio::test]
    async fn probe_applies_authoritative_metadata() {
        let (transport, registry) = registry();
        transport.on_head(
            "https://example.com/a.txt",
            crate::transport::mock::response(
                "https://example.com/a.txt",
                200,
                &[("Content-Type", "text/plain"), ("Content-Length", "7")],
                "",
            ),
        );
        let node = registry
            .resolve("https://example.com/a.txt", ResolveOptions::default())
            .await
            .unwrap();
        assert_eq!(transport.request_count(Verb::Head, "https://example.com/a.txt"), 1);
        assert_eq!(node.trust(), Trust::Authoritative);
        assert_eq!(node.size(), Some(7));
    }

    #[tokio::test]
    async fn invalid_uri_is_rejected() {
        let (_, registry) = registry();
        let err = registry
            .resolve("not a uri", ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUri { .. }));
    }

    #[tokio::test]
    async fn unmount_forgets_the_node() {
        let (_, registry) = registry();
        let opts = ResolveOptions {
            meta: Some(Metadata::speculative("text/plain")),
        };
        let a = registry
            .resolve("https://example.com/a.txt", opts.clone())
            .await
            .unwrap();
        assert!(registry.unmount("https://example.com/a.txt").is_some());
        let b = registry
            .resolve("https://example.com/a.txt", opts)
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn nodir_option_downgrades_html() {
        let transport = Arc::new(MockTransport::new());
        let fs = HttpFs::new(
            transport,
            FsOptions {
                html_nodir: true,
                html_filter: None,
            },
        );
        assert_eq!(fs.dispatch("text/html"), HandlerKind::Blob);
        assert_eq!(fs.dispatch("image/png"), HandlerKind::Blob);
    }
}
