//! The `CompressionPlugin` compresses eligible responses with gzip or deflate after the
//! handler ran and before the transport serializes them. A response is compressed only
//! when the client offers `gzip` or `deflate`, the status is `200 OK`, no
//! `Content-Encoding` is set yet, the content type is on the configured list and the body
//! is larger than the configured minimum. The compressed body is buffered so
//! `Content-Length` always matches the bytes sent.
//!
//! # Example
//! ```rust
//! use tako_gzip::pipeline::Pipelines;
//! use tako_gzip::plugins::compression::CompressionBuilder;
//!
//! let mut pipelines = Pipelines::new();
//! pipelines.plugin(
//!     CompressionBuilder::new()
//!         .min_bytes(1024)
//!         .add_mime_type("image/svg+xml")
//!         .build(),
//! )?;
//! ```

use std::{fmt, sync::Arc};

use anyhow::{Result, bail};
use arc_swap::ArcSwap;
use serde::Deserialize;

pub mod policy;
pub mod transform;

use crate::{
    error::CompressionError,
    log::{Log, LoggerSlot},
    pipeline::Pipelines,
    plugins::TakoPlugin,
    types::{Request, Response},
};

use self::policy::Decision;

/// Prefix of the environment variables read by [`Config::from_env`].
pub const ENV_PREFIX: &str = "TAKO_GZIP_";

/// Supported compression encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Gzip,
    Deflate,
}

impl Encoding {
    /// Returns the `Content-Encoding` token for the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the compression plugin.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Responses whose length is at or below this many bytes are left alone.
    #[serde(default = "default_min_bytes")]
    pub min_bytes: u64,
    /// Content types eligible for compression, matched exactly or up to a `;`.
    #[serde(default = "default_mime_types")]
    pub mime_types: Vec<String>,
    /// Compression level, 0 (store) to 9 (smallest output).
    #[serde(default = "default_level")]
    pub level: u32,
    /// Whether compressed responses get `Vary: Accept-Encoding`.
    #[serde(default = "default_vary")]
    pub vary: bool,
    /// Responses longer than this are compressed on the fly without a `Content-Length`.
    #[serde(default)]
    pub stream_above: Option<u64>,
    /// Receives a debug record at every decision point.
    #[serde(skip)]
    pub logger: Option<Arc<dyn Log>>,
}

fn default_min_bytes() -> u64 {
    4096
}

fn default_mime_types() -> Vec<String> {
    [
        "text/plain",
        "text/html",
        "text/xml",
        "text/css",
        "application/json",
        "application/x-javascript",
        "application/atom+xml",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_level() -> u32 {
    6
}

fn default_vary() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_bytes: default_min_bytes(),
            mime_types: default_mime_types(),
            level: default_level(),
            vary: default_vary(),
            stream_above: None,
            logger: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("min_bytes", &self.min_bytes)
            .field("mime_types", &self.mime_types)
            .field("level", &self.level)
            .field("vary", &self.vary)
            .field("stream_above", &self.stream_above)
            .field("logger", &LoggerSlot(&self.logger))
            .finish()
    }
}

impl Config {
    /// Reads `TAKO_GZIP_*` variables from the process environment.
    ///
    /// `TAKO_GZIP_MIME_TYPES` is a comma separated list. Unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`Config::from_env`] over an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let cfg: Config = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mime_types.is_empty() {
            bail!("compression needs at least one eligible mime type");
        }
        if self.level > 9 {
            bail!("compression level must be 0-9, got {}", self.level);
        }
        Ok(())
    }

    /// Returns true when `content_type` equals a configured type or extends one with
    /// parameters (`application/json; charset=utf-8`).
    pub fn accepts_mime(&self, content_type: Option<&str>) -> bool {
        let Some(ct) = content_type else {
            return false;
        };
        self.mime_types.iter().any(|m| {
            ct == m.as_str()
                || ct
                    .strip_prefix(m.as_str())
                    .is_some_and(|rest| rest.starts_with(';'))
        })
    }

    pub(crate) fn debug(&self, message: impl FnOnce() -> String) {
        if let Some(log) = &self.logger {
            log.debug(&message(), None);
        }
    }
}

/// Builder for configuring and creating a `CompressionPlugin`.
pub struct CompressionBuilder(Config);

impl CompressionBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self(Config::default())
    }

    /// Sets the size at or below which responses are not compressed.
    pub fn min_bytes(mut self, bytes: u64) -> Self {
        self.0.min_bytes = bytes;
        self
    }

    /// Replaces the eligible content types.
    pub fn mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.mime_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one eligible content type, keeping insertion order and skipping duplicates.
    pub fn add_mime_type(mut self, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        if !self.0.mime_types.contains(&mime) {
            self.0.mime_types.push(mime);
        }
        self
    }

    /// Sets the compression level.
    pub fn level(mut self, lvl: u32) -> Self {
        self.0.level = lvl.min(9);
        self
    }

    pub fn vary(mut self, yes: bool) -> Self {
        self.0.vary = yes;
        self
    }

    /// Streams responses longer than `bytes` instead of buffering them.
    pub fn stream_above(mut self, bytes: u64) -> Self {
        self.0.stream_above = Some(bytes);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Log>) -> Self {
        self.0.logger = Some(logger);
        self
    }

    /// Returns the configuration without wrapping it in a plugin.
    pub fn into_config(self) -> Config {
        self.0
    }

    /// Builds and returns the `CompressionPlugin` with the configured settings.
    pub fn build(self) -> CompressionPlugin {
        CompressionPlugin::new(self.0)
    }
}

impl Default for CompressionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Plugin for handling response compression.
#[derive(Clone)]
pub struct CompressionPlugin {
    cfg: Arc<ArcSwap<Config>>,
}

impl CompressionPlugin {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg: Arc::new(ArcSwap::from_pointee(cfg)),
        }
    }

    /// Returns a handle that can swap the configuration while requests are served.
    pub fn handle(&self) -> CompressionHandle {
        CompressionHandle {
            cfg: self.cfg.clone(),
        }
    }
}

impl Default for CompressionPlugin {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl TakoPlugin for CompressionPlugin {
    fn name(&self) -> &'static str {
        "CompressionPlugin"
    }

    /// Validates the configuration and registers the after-request hook.
    fn setup(&self, pipelines: &mut Pipelines) -> Result<()> {
        self.cfg.load().validate()?;
        let cfg = self.cfg.clone();
        pipelines.after_request(move |req, res| {
            maybe_compress(req, res, &cfg.load()).map_err(Into::into)
        });
        Ok(())
    }
}

/// Swaps the configuration a registered [`CompressionPlugin`] reads.
///
/// Each request loads one snapshot, so a swap never shows a request a mix of old and new
/// settings.
#[derive(Clone)]
pub struct CompressionHandle {
    cfg: Arc<ArcSwap<Config>>,
}

impl CompressionHandle {
    pub fn reconfigure(&self, cfg: Config) -> Result<()> {
        cfg.validate()?;
        self.cfg.store(Arc::new(cfg));
        tracing::debug!("compression configuration replaced");
        Ok(())
    }

    pub fn current(&self) -> Arc<Config> {
        self.cfg.load_full()
    }
}

/// Registers response compression on `pipelines`, using the defaults when `cfg` is `None`.
pub fn enable_compression(
    pipelines: &mut Pipelines,
    cfg: Option<Config>,
) -> Result<CompressionHandle> {
    let plugin = CompressionPlugin::new(cfg.unwrap_or_default());
    let handle = plugin.handle();
    pipelines.plugin(plugin)?;
    Ok(handle)
}

/// Compresses `res` in place when the request and response allow it.
pub fn maybe_compress(
    req: &Request,
    res: &mut Response,
    cfg: &Config,
) -> Result<(), CompressionError> {
    match policy::decide(req, res, cfg)? {
        Decision::Skip => Ok(()),
        Decision::Compress {
            encoding,
            length,
            buffered,
        } => transform::apply(res, encoding, length, buffered, cfg),
    }
}
