//! Owning-or-proxy byte buffer shuttled through the response filter chain (§4.1, §4.7).
//!
//! Each filter (`not_modified -> range -> data_source -> gzip -> chunked ->
//! socket_write`) either passes a `Bufo` through untouched, replaces its bytes
//! in place (e.g. `gzip` compressing a proxy chunk into an owned one), or
//! produces a new one (e.g. `range` slicing a window out of a data-source
//! chunk). Keeping ownership explicit in the type — rather than always
//! copying — is the zero-copy fast path for static file responses that never
//! need transformation.

/// A chunk of response body data, either borrowed from the spool/static file
/// ([`Bufo::Proxy`]) or owned because some filter had to transform it
/// ([`Bufo::Owned`]).
pub(crate) enum Bufo {
    Owned(Box<[u8]>),
    Proxy(&'static [u8]),
}

impl Bufo {
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Bufo::Owned(b) => b,
            Bufo::Proxy(b) => b,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        match self {
            Bufo::Owned(b) => b.len(),
            Bufo::Proxy(b) => b.len(),
        }
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One link in the filter chain's output: a chunk of body bytes plus whether
/// more chunks follow. `socket_write` stops once it sees `is_last == true`.
pub(crate) struct FilterChunk {
    pub(crate) data: Bufo,
    pub(crate) is_last: bool,
}

impl FilterChunk {
    pub(crate) const fn new(data: Bufo, is_last: bool) -> Self {
        Self { data, is_last }
    }
}
