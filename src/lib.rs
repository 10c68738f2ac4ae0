pub mod body;
pub mod error;
pub mod handler;
pub mod log;
pub mod pipeline;
pub mod plugins;
pub mod responder;
pub mod types;

#[cfg(feature = "init-tracing")]
pub mod tracing;

pub use error::CompressionError;
pub use pipeline::Pipelines;
pub use plugins::compression::{enable_compression, maybe_compress};
