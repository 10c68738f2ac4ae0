//! Plugin system for extending a request pipeline with composable modules.
//!
//! A plugin registers hooks on [`Pipelines`] when it is installed. Response compression is
//! the plugin this crate ships.
//!
//! # Examples
//!
//! ```rust
//! use tako_gzip::plugins::TakoPlugin;
//! use tako_gzip::pipeline::Pipelines;
//! use anyhow::Result;
//!
//! struct ServerHeader;
//!
//! impl TakoPlugin for ServerHeader {
//!     fn name(&self) -> &'static str {
//!         "server-header"
//!     }
//!
//!     fn setup(&self, pipelines: &mut Pipelines) -> Result<()> {
//!         pipelines.after_request(|_req, res| {
//!             res.headers_mut().insert("server", "tako".parse()?);
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//! }
//! ```

use anyhow::Result;

use crate::pipeline::Pipelines;

/// Response compression plugin.
pub mod compression;

/// Trait for implementing pipeline plugins.
///
/// Plugins must be thread-safe and have a static lifetime because the hooks they register
/// outlive the call to `setup`.
pub trait TakoPlugin: Send + Sync + 'static {
    /// Returns the unique name identifier for this plugin.
    fn name(&self) -> &'static str;

    /// Registers the plugin's hooks on the given pipeline.
    fn setup(&self, pipelines: &mut Pipelines) -> Result<()>;
}
