use std::io;

use thiserror::Error;

/// Errors surfaced by the compression hook.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The response carries headers the layer cannot interpret, such as a
    /// `Content-Length` that is not a non-negative integer.
    #[error("invalid response state: {0}")]
    InvalidResponseState(String),

    /// The body producer failed while being materialized or compressed.
    #[error(transparent)]
    Body(#[from] io::Error),
}
