//! Rewrites an eligible response so its body goes through a gzip or deflate encoder.
//!
//! The compressed body is produced fully in memory and `Content-Length` is set to its
//! exact size. Headers are only touched once that buffer exists, so a failing producer
//! leaves the response headers as the handler set them. When the configuration enables
//! streaming for large responses, the encoder is installed as the body producer instead
//! and the transport frames the unknown-length body.

use std::io::{self, Write};

use bytes::Bytes;
use flate2::{
    Compression,
    write::{DeflateEncoder, GzEncoder},
};
use http::{
    HeaderMap, HeaderValue,
    header::{CONTENT_ENCODING, CONTENT_LENGTH, VARY},
};

use crate::{
    body::{Contents, WriteBody},
    error::CompressionError,
    plugins::compression::{Config, Encoding},
    types::Response,
};

/// Body producer that runs `source` through an encoder wrapped around the sink.
///
/// The encoder borrows the sink, so finishing it flushes the trailer without closing the
/// sink itself.
pub struct Compressed {
    source: Contents,
    encoding: Encoding,
    level: Compression,
}

impl Compressed {
    pub fn new(source: Contents, encoding: Encoding, level: u32) -> Self {
        Self {
            source,
            encoding,
            level: Compression::new(level.min(9)),
        }
    }
}

impl WriteBody for Compressed {
    fn write_to(self: Box<Self>, sink: &mut dyn Write) -> io::Result<()> {
        let Compressed {
            source,
            encoding,
            level,
        } = *self;

        match encoding {
            Encoding::Gzip => {
                let mut encoder = GzEncoder::new(sink, level);
                source.write_to(&mut encoder)?;
                encoder.finish()?;
            }
            Encoding::Deflate => {
                let mut encoder = DeflateEncoder::new(sink, level);
                source.write_to(&mut encoder)?;
                encoder.finish()?;
            }
        }
        Ok(())
    }
}

/// Compresses `res` with `encoding`.
///
/// `buffered` holds the body if it was already read while measuring; otherwise the
/// response's own producer is taken and run. `length` is the uncompressed size and only
/// matters for the streaming cutover.
pub fn apply(
    res: &mut Response,
    encoding: Encoding,
    length: u64,
    buffered: Option<Bytes>,
    cfg: &Config,
) -> Result<(), CompressionError> {
    let source = match buffered {
        Some(bytes) => Contents::from(bytes),
        None => std::mem::take(res.body_mut()),
    };
    let wrapped = Contents::new(Compressed::new(source, encoding, cfg.level));

    if cfg.stream_above.is_some_and(|limit| length > limit) {
        cfg.debug(|| format!("{length} bytes streamed with {encoding}, length left to transport"));
        let headers = res.headers_mut();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding.as_str()));
        headers.remove(CONTENT_LENGTH);
        if cfg.vary {
            append_vary(headers);
        }
        *res.body_mut() = wrapped;
        return Ok(());
    }

    let compressed = wrapped.into_bytes()?;
    cfg.debug(|| format!("{length} bytes compressed to {} with {encoding}", compressed.len()));

    let headers = res.headers_mut();
    headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding.as_str()));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(compressed.len() as u64));
    if cfg.vary {
        append_vary(headers);
    }
    *res.body_mut() = Contents::from(compressed);
    Ok(())
}

/// Adds `Accept-Encoding` to `Vary` unless it is already covered.
fn append_vary(headers: &mut HeaderMap) {
    let covered = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|v| v == "*" || v.eq_ignore_ascii_case("accept-encoding"));

    if !covered {
        headers.append(VARY, HeaderValue::from_static("Accept-Encoding"));
    }
}
