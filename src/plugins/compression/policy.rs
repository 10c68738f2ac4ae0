//! Eligibility checks deciding whether, and how, a response gets compressed.
//!
//! The checks run in a fixed order and the first one that fails skips compression:
//! negotiation, existing `Content-Encoding`, status, content type, size. Only the size
//! check may touch the body, and only when no `Content-Length` is declared; the bytes it
//! reads are handed on so the producer never runs twice.

use bytes::Bytes;
use http::{
    HeaderMap, StatusCode,
    header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE},
};

use crate::{
    body::Contents,
    error::CompressionError,
    plugins::compression::{Config, Encoding},
    types::{Request, Response},
};

/// Outcome of [`decide`].
#[derive(Debug)]
pub enum Decision {
    Skip,
    Compress {
        encoding: Encoding,
        /// Uncompressed length, declared or measured.
        length: u64,
        /// Body bytes read while measuring, if the producer already ran.
        buffered: Option<Bytes>,
    },
}

/// Picks the encoding offered by `Accept-Encoding`, preferring `deflate` over `gzip`.
///
/// Tokens are matched as case-sensitive substrings of every header value, so
/// `gzip;q=0.8` counts as an offer of gzip.
pub fn negotiate(headers: &HeaderMap) -> Option<Encoding> {
    let offers = move || {
        headers
            .get_all(ACCEPT_ENCODING)
            .iter()
            .filter_map(|v| v.to_str().ok())
    };

    if offers().any(|v| v.contains("deflate")) {
        Some(Encoding::Deflate)
    } else if offers().any(|v| v.contains("gzip")) {
        Some(Encoding::Gzip)
    } else {
        None
    }
}

/// Parses the declared `Content-Length`, if any.
pub fn declared_length(headers: &HeaderMap) -> Result<Option<u64>, CompressionError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| {
            CompressionError::InvalidResponseState(format!(
                "content-length {value:?} is not a non-negative integer"
            ))
        })
}

/// Runs the eligibility chain for one request/response pair.
///
/// When the body had to be measured and the response turns out too small, the body is
/// put back unchanged before returning [`Decision::Skip`].
pub fn decide(
    req: &Request,
    res: &mut Response,
    cfg: &Config,
) -> Result<Decision, CompressionError> {
    let Some(encoding) = negotiate(req.headers()) else {
        cfg.debug(|| "accept-encoding offers neither gzip nor deflate".to_string());
        return Ok(Decision::Skip);
    };
    cfg.debug(|| format!("accept-encoding offers {encoding}"));

    if res.headers().contains_key(CONTENT_ENCODING) {
        cfg.debug(|| "response already has a content-encoding".to_string());
        return Ok(Decision::Skip);
    }

    if res.status() != StatusCode::OK {
        cfg.debug(|| format!("status {} is not compressed", res.status()));
        return Ok(Decision::Skip);
    }

    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !cfg.accepts_mime(content_type) {
        cfg.debug(|| format!("content-type {content_type:?} is not eligible"));
        return Ok(Decision::Skip);
    }
    cfg.debug(|| format!("content-type {content_type:?} is eligible"));

    let (length, buffered) = match declared_length(res.headers())? {
        Some(length) => (length, None),
        None => {
            let bytes = std::mem::take(res.body_mut()).into_bytes()?;
            (bytes.len() as u64, Some(bytes))
        }
    };

    if length <= cfg.min_bytes {
        cfg.debug(|| format!("{length} bytes is within the {} byte minimum", cfg.min_bytes));
        if let Some(bytes) = buffered {
            *res.body_mut() = Contents::from(bytes);
        }
        return Ok(Decision::Skip);
    }
    cfg.debug(|| format!("{length} bytes exceeds the {} byte minimum", cfg.min_bytes));
    cfg.debug(|| format!("compressing with {encoding}"));

    Ok(Decision::Compress {
        encoding,
        length,
        buffered,
    })
}
