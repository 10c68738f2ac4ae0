//! Logging capability used at every compression decision point.
//!
//! The compression layer talks to a [`Log`] trait object rather than a concrete backend.
//! When no logger is configured the calls are skipped. [`TracingLog`] forwards to the
//! `tracing` macros so records land in whatever subscriber the application installed.

use std::{error::Error, fmt};

pub trait Log: Send + Sync {
    fn debug(&self, message: &str, err: Option<&dyn Error>);
    fn info(&self, message: &str, err: Option<&dyn Error>);
    fn warn(&self, message: &str, err: Option<&dyn Error>);
    fn error(&self, message: &str, err: Option<&dyn Error>);
}

/// [`Log`] implementation backed by `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl Log for TracingLog {
    fn debug(&self, message: &str, err: Option<&dyn Error>) {
        match err {
            Some(e) => tracing::debug!(error = %e, "{message}"),
            None => tracing::debug!("{message}"),
        }
    }

    fn info(&self, message: &str, err: Option<&dyn Error>) {
        match err {
            Some(e) => tracing::info!(error = %e, "{message}"),
            None => tracing::info!("{message}"),
        }
    }

    fn warn(&self, message: &str, err: Option<&dyn Error>) {
        match err {
            Some(e) => tracing::warn!(error = %e, "{message}"),
            None => tracing::warn!("{message}"),
        }
    }

    fn error(&self, message: &str, err: Option<&dyn Error>) {
        match err {
            Some(e) => tracing::error!(error = %e, "{message}"),
            None => tracing::error!("{message}"),
        }
    }
}

/// Wrapper printed in place of a logger inside `Debug` output.
pub(crate) struct LoggerSlot<'a>(pub(crate) &'a Option<std::sync::Arc<dyn Log>>);

impl fmt::Debug for LoggerSlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Some(<logger>)"),
            None => f.write_str("None"),
        }
    }
}
