//! permessage-deflate extension (RFC 7692), negotiated over
//! `Sec-WebSocket-Extensions` during the handshake.
//!
//! Grounded on the original's `ws_deflate.c`: raw deflate (no zlib/gzip
//! header), a four-byte `00 00 FF FF` trailer stripped from compressed
//! output and re-appended before decompression, and optional
//! per-direction "no context takeover" resetting the stream between
//! messages instead of carrying the sliding window forward.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

// `Compress`/`Decompress::new_with_window_bits` only exist on flate2's
// `any_zlib` backend (a real system zlib). The pinned `flate2 = "1.0"` here
// resolves to the portable `rust_backend` (miniz_oxide), whose raw-deflate
// constructors always use the maximum window; negotiated `*_max_window_bits`
// values are honoured in the advertised/accepted extension header but are not
// wired into the stream itself, matching what this backend can actually do.

/// Trailer appended by a raw-deflate `Z_SYNC_FLUSH`; RFC 7692 §7.2.1 has the
/// receiver re-append it before inflating, since the sender strips it.
const TRAILER: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

const DEFAULT_WINDOW_BITS: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeflateConfig {
    pub(crate) server_max_window_bits: u8,
    pub(crate) client_max_window_bits: u8,
    pub(crate) server_no_context_takeover: bool,
    pub(crate) client_no_context_takeover: bool,
}

impl Default for DeflateConfig {
    fn default() -> Self {
        DeflateConfig {
            server_max_window_bits: DEFAULT_WINDOW_BITS,
            client_max_window_bits: DEFAULT_WINDOW_BITS,
            server_no_context_takeover: false,
            client_no_context_takeover: false,
        }
    }
}

/// Parses a `Sec-WebSocket-Extensions` header value, returning the
/// negotiated configuration if `permessage-deflate` is offered.
///
/// Unknown parameters are ignored; window-bits values outside `8..=15` fall
/// back to the default rather than rejecting the whole extension, matching
/// the original's tolerant parser.
pub(crate) fn parse_extension_header(value: &[u8]) -> Option<DeflateConfig> {
    let value = std::str::from_utf8(value).ok()?;

    for offer in value.split(',') {
        let mut parts = offer.split(';').map(str::trim);
        if parts.next()? != "permessage-deflate" {
            continue;
        }

        let mut config = DeflateConfig::default();
        for param in parts {
            let (name, arg) = match param.split_once('=') {
                Some((n, a)) => (n.trim(), Some(a.trim().trim_matches('"'))),
                None => (param.trim(), None),
            };

            match (name, arg) {
                ("server_no_context_takeover", _) => config.server_no_context_takeover = true,
                ("client_no_context_takeover", _) => config.client_no_context_takeover = true,
                ("server_max_window_bits", Some(bits)) => {
                    if let Some(bits) = parse_window_bits(bits) {
                        config.server_max_window_bits = bits;
                    }
                }
                ("client_max_window_bits", Some(bits)) => {
                    if let Some(bits) = parse_window_bits(bits) {
                        config.client_max_window_bits = bits;
                    }
                }
                ("client_max_window_bits", None) => {}
                _ => {}
            }
        }

        return Some(config);
    }

    None
}

fn parse_window_bits(text: &str) -> Option<u8> {
    let bits: u8 = text.parse().ok()?;
    (8..=15).contains(&bits).then_some(bits)
}

/// Renders the negotiated configuration back into a `Sec-WebSocket-Extensions`
/// response value.
pub(crate) fn build_extension_header(config: &DeflateConfig) -> String {
    let mut out = String::from("permessage-deflate");

    if config.server_max_window_bits != DEFAULT_WINDOW_BITS {
        out.push_str(&format!("; server_max_window_bits={}", config.server_max_window_bits));
    }
    if config.client_max_window_bits != DEFAULT_WINDOW_BITS {
        out.push_str(&format!("; client_max_window_bits={}", config.client_max_window_bits));
    }
    if config.server_no_context_takeover {
        out.push_str("; server_no_context_takeover");
    }
    if config.client_no_context_takeover {
        out.push_str("; client_no_context_takeover");
    }

    out
}

#[derive(Debug)]
pub(crate) enum DeflateError {
    Compress,
    Decompress,
}

/// Per-connection compression/decompression state. One side's stream is
/// reused across messages unless `no_context_takeover` was negotiated for
/// that side.
pub(crate) struct PerMessageDeflate {
    config: DeflateConfig,
    deflate: Compress,
    inflate: Decompress,
}

impl PerMessageDeflate {
    pub(crate) fn new(config: DeflateConfig) -> Self {
        PerMessageDeflate {
            config,
            deflate: new_compress(config.server_max_window_bits),
            inflate: new_decompress(config.client_max_window_bits),
        }
    }

    /// Compresses one message's payload. Appends RSV1-worthy raw-deflate
    /// output with the trailer already stripped, per RFC 7692 §7.2.1.
    pub(crate) fn compress_message(&mut self, payload: &[u8]) -> Result<Vec<u8>, DeflateError> {
        let mut out = Vec::with_capacity(payload.len());
        let mut chunk = [0u8; 8192];
        let mut consumed = 0usize;

        loop {
            let before_in = self.deflate.total_in();
            let before_out = self.deflate.total_out();

            let status = self
                .deflate
                .compress(&payload[consumed..], &mut chunk, FlushCompress::Sync)
                .map_err(|_| DeflateError::Compress)?;

            consumed += (self.deflate.total_in() - before_in) as usize;
            out.extend_from_slice(&chunk[..(self.deflate.total_out() - before_out) as usize]);

            if status == Status::StreamEnd || consumed == payload.len() {
                break;
            }
        }

        if out.ends_with(&TRAILER) {
            out.truncate(out.len() - TRAILER.len());
        }

        if self.config.server_no_context_takeover {
            self.deflate = new_compress(self.config.server_max_window_bits);
        }

        Ok(out)
    }

    /// Decompresses one message's payload. `payload` must have the trailer
    /// already stripped by the sender; it is re-appended here.
    pub(crate) fn decompress_message(&mut self, payload: &[u8]) -> Result<Vec<u8>, DeflateError> {
        let mut input = Vec::with_capacity(payload.len() + TRAILER.len());
        input.extend_from_slice(payload);
        input.extend_from_slice(&TRAILER);

        let mut out = Vec::with_capacity(payload.len() * 2);
        let mut chunk = [0u8; 8192];
        let mut consumed = 0usize;

        loop {
            let before_in = self.inflate.total_in();
            let before_out = self.inflate.total_out();

            let status = self
                .inflate
                .decompress(&input[consumed..], &mut chunk, FlushDecompress::Sync)
                .map_err(|_| DeflateError::Decompress)?;

            consumed += (self.inflate.total_in() - before_in) as usize;
            out.extend_from_slice(&chunk[..(self.inflate.total_out() - before_out) as usize]);

            if status == Status::StreamEnd || consumed >= input.len() {
                break;
            }
        }

        if self.config.client_no_context_takeover {
            self.inflate = new_decompress(self.config.client_max_window_bits);
        }

        Ok(out)
    }
}

fn new_compress(_window_bits: u8) -> Compress {
    Compress::new(Compression::fast(), false)
}

fn new_decompress(_window_bits: u8) -> Decompress {
    Decompress::new(false)
}
