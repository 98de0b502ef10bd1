//! # webfs-http
//!
//! HTTP(S) resources behind a uniform virtual-filesystem interface.
//!
//! Every addressable resource — a document, an image, an HTML page treated
//! as a directory — is an [`HttpNode`] supporting metadata retrieval
//! (`stat`), data retrieval (`read`) and, for directory-shaped nodes, child
//! enumeration (`readdir`). A node's behavioral shape is selected by its
//! content type, which is not known until the first probe and may change
//! across probes; the node swaps its handler in place without invalidating
//! references held by callers.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use webfs_http::{FsOptions, HttpFs, Registry, ReqwestTransport, ResolveOptions};
//!
//! let transport = Arc::new(ReqwestTransport::with_default_timeout()?);
//! let fs = HttpFs::new(transport, FsOptions::default());
//! let registry = Registry::new(fs);
//!
//! // Probe and bind a node
//! let node = registry.resolve("https://example.com/index.html", ResolveOptions::default()).await?;
//!
//! // Enumerate an HTML page as a directory
//! for (name, child) in node.readdir(&registry).await? {
//!     println!("{} -> {}", name, child.ident());
//! }
//! ```
//!
//! Speculative metadata (guessed from listing data) never silently
//! masquerades as authoritative: a `read` on a node whose type is not
//! probe-confirmed re-probes first, and a speculative update can never
//! retype a node that holds an authoritative binding.

pub mod bundle;
pub mod error;
pub mod htmldir;
pub mod node;
pub mod probe;
pub mod registry;
pub mod transport;

pub use bundle::{Bundle, BundleManifest, BundleTree, ManifestMapping};
pub use error::Error;
pub use node::{Content, DirState, Handler, HttpNode, ReadOptions};
pub use probe::{metadata_from_response, probe};
pub use registry::{FsOptions, HttpFs, Registry, ResolveOptions};
pub use transport::{ReqwestTransport, Transport, TransportResponse};
