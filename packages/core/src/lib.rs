//! Core webfs: transport-independent semantics.
//!
//! This layer defines the meaning shared by every webfs backend:
//! - `Metadata` / `Trust`: resource attributes carrying an explicit trust
//!   level, so speculative listing data never masquerades as the result of
//!   an authoritative probe
//! - `HandlerTable` / `HandlerKind`: the content-type driven dispatch table
//! - `ByteRange` / `EffectiveRange`: range requests and the reconciliation
//!   of what a server actually served
//! - naming helpers: display names and content-type guesses derived from URIs
//!
//! The HTTP backend lives in `webfs-http`; this crate never touches the
//! network.

mod handler;
mod meta;
mod name;
mod range;

pub use handler::{
    HandlerKind, HandlerTable, Registration, DIR_CONTENT_TYPE, GENERIC_CONTENT_TYPE, IMAGE_UNKNOWN,
};
pub use meta::{normalize_content_type, Metadata, Trust};
pub use name::{basename_dir, content_type_for_extension};
pub use range::{parse_content_range, ByteRange, EffectiveRange};
