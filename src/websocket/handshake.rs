//! Opening handshake (RFC 6455 §1.3): `Sec-WebSocket-Accept` derivation and
//! upgrade-request recognition.

use crate::http::request::Request;
use base64::{engine::general_purpose::STANDARD, Engine};
use sha1::{Digest, Sha1};

/// Fixed GUID the handshake concatenates onto the client's key before hashing.
const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Whether `request` is asking to switch to the WebSocket protocol: `GET`
/// with `Connection: upgrade`, `Upgrade: websocket` and a `Sec-WebSocket-Key`.
pub(crate) fn is_upgrade_request(request: &Request) -> bool {
    header_contains_token(request.header(b"connection"), b"upgrade")
        && request
            .header(b"upgrade")
            .is_some_and(|v| v.eq_ignore_ascii_case(b"websocket"))
        && request.header(b"sec-websocket-key").is_some()
}

fn header_contains_token(value: Option<&[u8]>, token: &[u8]) -> bool {
    let Some(value) = value else { return false };
    value
        .split(|&b| b == b',')
        .map(|part| trim_ascii_whitespace(part))
        .any(|part| part.eq_ignore_ascii_case(token))
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Computes `Sec-WebSocket-Accept` from the client's `Sec-WebSocket-Key`.
pub(crate) fn accept_key(client_key: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key);
    hasher.update(GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_rfc6455_example() {
        // RFC 6455 §1.3's worked example.
        assert_eq!(
            accept_key(b"dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn connection_token_matches_among_others() {
        assert!(header_contains_token(Some(b"keep-alive, Upgrade"), b"upgrade"));
        assert!(!header_contains_token(Some(b"keep-alive"), b"upgrade"));
        assert!(!header_contains_token(None, b"upgrade"));
    }
}
