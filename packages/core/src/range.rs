//! Byte-range requests and reconciliation of what was actually served.

/// A requested byte range. `len == -1` means "from `off` to the end".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub off: u64,
    pub len: i64,
}

impl ByteRange {
    pub fn new(off: u64, len: i64) -> Self {
        Self { off, len }
    }

    /// Render as a `Range` request header value.
    ///
    /// A zero-length range has no header form; callers treat `None` as no
    /// range at all.
    pub fn to_header_value(&self) -> Option<String> {
        if self.len < 0 {
            Some(format!("bytes={}-", self.off))
        } else if self.len == 0 {
            None
        } else {
            Some(format!(
                "bytes={}-{}",
                self.off,
                self.off + self.len as u64 - 1
            ))
        }
    }
}

/// The range a server actually served.
///
/// When the response carried no usable `Content-Range`, `off` and `size` are
/// the `-1` sentinel and `len` is the byte length of what arrived. Callers
/// must not assume they received the whole object unless `size` is known and
/// `off == 0 && len == size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveRange {
    pub off: i64,
    pub len: i64,
    pub size: i64,
}

impl EffectiveRange {
    /// The unknown-range sentinel for a body of `len` bytes.
    pub fn unknown(len: usize) -> Self {
        Self {
            off: -1,
            len: len as i64,
            size: -1,
        }
    }

    /// True only when the range provably covers the whole object.
    pub fn is_whole(&self) -> bool {
        self.size >= 0 && self.off == 0 && self.len == self.size
    }
}

/// Parse a `Content-Range` header of the form `bytes 10-19/100`.
///
/// Returns `None` for unsatisfiable or wildcard (`*/...`, `.../*`) forms;
/// callers then fall back to [`EffectiveRange::unknown`].
pub fn parse_content_range(value: &str) -> Option<EffectiveRange> {
    let rest = value.trim().strip_prefix("bytes")?.trim_start();
    let (range, size) = rest.split_once('/')?;
    let (start, end) = range.split_once('-')?;
    let start: i64 = start.trim().parse().ok()?;
    let end: i64 = end.trim().parse().ok()?;
    let size: i64 = size.trim().parse().ok()?;
    if start < 0 || end < start {
        return None;
    }
    Some(EffectiveRange {
        off: start,
        len: end - start + 1,
        size,
    })
}
