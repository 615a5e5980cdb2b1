//! Message-level protocols sitting above the frame layer (§4.8): what a
//! completed text/binary message actually means.
//!
//! Grounded on `websocketsprotocoldefault.c`/`websocketsprotocolresource.c`:
//! the default protocol just spools the payload to disk for the handler, the
//! resource protocol further parses it as a pseudo-HTTP request so a single
//! WebSocket connection can drive the same route dispatch as plain HTTP.

use crate::{
    errors::ErrorKind,
    http::{path, percent},
    query::Query,
    Method,
};
use std::path::Path;

/// A completed WebSocket message handed to the default protocol: the whole
/// payload spooled to disk, addressable without holding it in memory.
pub(crate) struct DefaultMessage {
    spool: crate::http::spool::Spool,
}

impl DefaultMessage {
    pub(crate) fn spool(tmp_dir: &Path, payload: &[u8]) -> std::io::Result<Self> {
        let mut spool = crate::http::spool::Spool::create(tmp_dir)?;
        spool.append(payload)?;
        Ok(DefaultMessage { spool })
    }

    pub(crate) fn size(&self) -> u64 {
        self.spool.size()
    }

    pub(crate) fn path(&self) -> &Path {
        self.spool.path()
    }

    pub(crate) fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        self.spool.read_at(offset, buf)
    }
}

/// A WebSocket message parsed as `METHOD /path?query DATA` (resource
/// sub-protocol, negotiated via `Sec-WebSocket-Protocol: resource`).
pub(crate) struct ResourceMessage {
    pub(crate) method: Method,
    pub(crate) path: Vec<u8>,
    pub(crate) path_segments: Vec<Vec<u8>>,
    pub(crate) query: Option<Vec<u8>>,
    pub(crate) body: Vec<u8>,
}

/// Parses one resource-protocol message.
///
/// Reuses the HTTP request line's method grammar (it already expects a
/// trailing space) plus the URL decoder and traversal guard, so a resource
/// message is rejected exactly like an HTTP request would be for the same
/// malformed or traversal-attempting path.
pub(crate) fn parse_resource_message(data: &[u8]) -> Result<ResourceMessage, ErrorKind> {
    let (method, method_len) = Method::from_bytes(data)?;
    let rest = &data[method_len..];

    let space = rest
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ErrorKind::InvalidUrl)?;
    let (target, body) = (&rest[..space], &rest[space + 1..]);

    let (raw_path, raw_query) = match target.iter().position(|&b| b == b'?') {
        Some(idx) => (&target[..idx], Some(&target[idx + 1..])),
        None => (target, None),
    };

    let decoded_path = percent::decode(raw_path).ok_or(ErrorKind::InvalidUrl)?;
    let path_segments: Vec<Vec<u8>> = decoded_path
        .split(|&b| b == b'/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_vec())
        .collect();

    let segment_refs: Vec<&[u8]> = path_segments.iter().map(Vec::as_slice).collect();
    if !path::is_safe(&segment_refs) {
        return Err(ErrorKind::Forbidden);
    }

    Ok(ResourceMessage {
        method,
        path: decoded_path,
        path_segments,
        query: raw_query.map(<[u8]>::to_vec),
        body: body.to_vec(),
    })
}

impl ResourceMessage {
    /// Parses the message's query string with the same collector-based API
    /// HTTP requests use.
    pub(crate) fn parse_query<'a, C: crate::query::QueryCollector<'a>>(
        &'a self,
        limit: usize,
    ) -> Result<C, crate::query::Error> {
        match &self.query {
            Some(query) => Query::parse(query, limit),
            None => Query::parse(b"", limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_get_without_body() {
        let msg = parse_resource_message(b"GET /api/users?sort=name ").unwrap();
        assert_eq!(msg.method, Method::Get);
        assert_eq!(msg.path, b"api/users");
        assert_eq!(msg.path_segments, vec![b"api".to_vec(), b"users".to_vec()]);
        assert_eq!(msg.query.as_deref(), Some(&b"sort=name"[..]));
        assert!(msg.body.is_empty());
    }

    #[test]
    fn parses_post_with_body() {
        let msg = parse_resource_message(br#"POST /api/users {"name":"a"}"#).unwrap();
        assert_eq!(msg.method, Method::Post);
        assert_eq!(msg.body, br#"{"name":"a"}"#);
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(matches!(
            parse_resource_message(b"GET /../secret "),
            Err(ErrorKind::Forbidden)
        ));
    }

    #[test]
    fn rejects_malformed_method() {
        assert!(parse_resource_message(b"FROB /x ").is_err());
    }
}
