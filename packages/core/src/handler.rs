//! Content-type driven handler dispatch.
//!
//! A node's behavioral shape is selected by looking its content type up in a
//! registration table. Registrations carry an explicit priority so overlaps
//! resolve deterministically instead of depending on load order.

use lazy_static::lazy_static;

/// Placeholder content type for a reference that ends in a path separator
/// and should enumerate as a directory without a probe round-trip.
pub const DIR_CONTENT_TYPE: &str = "text/vnd.webfs.html+dir";

/// Guessed type for an embedded image whose real type is unknown.
pub const IMAGE_UNKNOWN: &str = "image/unknown";

/// The generic binary fallback type.
pub const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

/// The behavioral shape a handler gives a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Plain blob of bytes.
    Blob,
    /// HTML document emulating a directory of its linked resources.
    HtmlDir,
}

/// One table entry: a content-type pattern mapped to a handler kind.
///
/// Patterns are either exact (`text/html`) or a type wildcard (`image/*`).
#[derive(Debug, Clone)]
pub struct Registration {
    pub pattern: String,
    pub kind: HandlerKind,
    pub priority: u32,
}

/// Priority-ordered content-type to handler mapping.
///
/// Lookup prefers an exact match over a wildcard match; among equally
/// specific matches the highest priority wins. An unmatched type falls back
/// to [`HandlerKind::Blob`].
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    registrations: Vec<Registration>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default table, populated once at startup.
    pub fn defaults() -> &'static HandlerTable {
        &DEFAULT_TABLE
    }

    pub fn register(&mut self, pattern: impl Into<String>, kind: HandlerKind, priority: u32) {
        self.registrations.push(Registration {
            pattern: pattern.into(),
            kind,
            priority,
        });
    }

    pub fn lookup(&self, content_type: &str) -> HandlerKind {
        let mut best: Option<(u8, u32, HandlerKind)> = None;
        for reg in &self.registrations {
            let specificity = if reg.pattern == content_type {
                2
            } else if let Some(prefix) = reg.pattern.strip_suffix('*') {
                if prefix.ends_with('/') && content_type.starts_with(prefix) {
                    1
                } else {
                    continue;
                }
            } else {
                continue;
            };
            let candidate = (specificity, reg.priority, reg.kind);
            if best.map_or(true, |b| (candidate.0, candidate.1) > (b.0, b.1)) {
                best = Some(candidate);
            }
        }
        best.map(|(_, _, kind)| kind).unwrap_or(HandlerKind::Blob)
    }
}

lazy_static! {
    static ref DEFAULT_TABLE: HandlerTable = {
        let mut table = HandlerTable::new();
        table.register("text/html", HandlerKind::HtmlDir, 100);
        table.register(DIR_CONTENT_TYPE, HandlerKind::HtmlDir, 100);
        table.register(GENERIC_CONTENT_TYPE, HandlerKind::Blob, 100);
        table.register("image/*", HandlerKind::Blob, 50);
        table
    };
}
