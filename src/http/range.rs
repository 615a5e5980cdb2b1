//! `Range` request-header parser (§4.12) and the byte-range type shared with
//! the range response filter (§4.7(b)).
//!
//! Grounded on `http_range_filter.c`'s validation rules: ascending,
//! non-overlapping specs, `N-M` / `N-` / `-N` forms, numbers capped at 19
//! digits. Any violation returns `None` rather than an error — a malformed
//! `Range` header falls through to an ordinary 200 response instead of
//! failing the request, matching "Range-parser totality" in the testable
//! properties.

use memchr::memchr;

const MAX_DIGITS: usize = 19;

/// One half-open-at-parse-time, materialised-as-inclusive byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// `None` encodes a suffix range (`-N`): "last N bytes".
    pub start: Option<u64>,
    pub end: Option<u64>,
}

fn parse_u64(digits: &[u8]) -> Option<u64> {
    if digits.is_empty() || digits.len() > MAX_DIGITS || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Parses a full `Range: bytes=...` value (the `bytes=` prefix already
/// stripped by the caller) into an ascending, non-overlapping list of specs.
///
/// Returns `None` on any malformed or out-of-order input — callers treat that
/// as "no range requested".
pub(crate) fn parse(value: &[u8]) -> Option<Vec<ByteRange>> {
    let mut ranges = Vec::new();
    let mut prev_end: Option<u64> = None;
    let mut start = 0;

    while start < value.len() {
        let end = memchr(b',', &value[start..])
            .map(|p| start + p)
            .unwrap_or(value.len());
        let spec = &value[start..end];
        let dash = memchr(b'-', spec)?;

        let range = if dash == 0 {
            let n = parse_u64(&spec[1..])?;
            ByteRange { start: None, end: Some(n) }
        } else if dash == spec.len() - 1 {
            let n = parse_u64(&spec[..dash])?;
            ByteRange { start: Some(n), end: None }
        } else {
            let s = parse_u64(&spec[..dash])?;
            let e = parse_u64(&spec[dash + 1..])?;
            if s > e {
                return None;
            }
            ByteRange { start: Some(s), end: Some(e) }
        };

        if let (Some(s), Some(prev)) = (range.start, prev_end) {
            if s <= prev {
                return None;
            }
        }
        prev_end = range.end.or(range.start);

        ranges.push(range);
        start = end + 1;
    }

    if ranges.is_empty() {
        return None;
    }
    Some(ranges)
}

/// Materialises the first range (per the "first range only" resolution in
/// SPEC_FULL.md §9.1) against a known data size, clamping a suffix range and
/// converting to an inclusive `[start, end]` pair. `None` on any inconsistency
/// (`start`/`end` beyond `datasize`, empty ranges after clamping).
pub(crate) fn materialize_first(ranges: &[ByteRange], datasize: u64) -> Option<(u64, u64)> {
    let first = ranges.first()?;
    if datasize == 0 {
        return None;
    }

    let (start, end) = match (first.start, first.end) {
        (Some(s), Some(e)) => (s, e.min(datasize - 1)),
        (Some(s), None) => (s, datasize - 1),
        (None, Some(n)) => {
            let len = n.min(datasize);
            (datasize - len, datasize - 1)
        }
        (None, None) => return None,
    };

    if start > end || start >= datasize {
        return None;
    }
    Some((start, end))
}
