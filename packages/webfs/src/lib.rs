//! webfs: HTTP(S) resources as a virtual filesystem.
//!
//! A node per URI, metadata probing with explicit trust tracking, HTML pages
//! enumerable as directories, ranged reads and document bundling. The pieces
//! live in [`core`] (types and dispatch) and [`http`] (transport, nodes and
//! the registry); this crate re-exports both.

pub use webfs_core as core;
pub use webfs_http as http;

pub use webfs_http::{
    Bundle, Error, FsOptions, HttpFs, HttpNode, ReadOptions, Registry, ReqwestTransport,
    ResolveOptions,
};
