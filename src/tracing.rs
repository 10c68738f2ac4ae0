//! Subscriber setup for applications that want the compression layer's records on stdout.
//!
//! Configures structured output with file names, line numbers, log levels, and span
//! close events. Applications with their own subscriber can skip this entirely.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing_subscriber::{
    Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

pub use tracing::level_filters::LevelFilter;

static TRACING_LEVEL: AtomicU8 = AtomicU8::new(4);

const LEVELS: [LevelFilter; 6] = [
    LevelFilter::OFF,
    LevelFilter::ERROR,
    LevelFilter::WARN,
    LevelFilter::INFO,
    LevelFilter::DEBUG,
    LevelFilter::TRACE,
];

fn encode(level: LevelFilter) -> u8 {
    LEVELS.iter().position(|l| *l == level).unwrap_or(5) as u8
}

fn decode(raw: u8) -> LevelFilter {
    LEVELS[(raw as usize).min(LEVELS.len() - 1)]
}

/// Sets the level used by the next [`init_tracing`] call.
pub fn set_tracing_level(level_filter: LevelFilter) {
    TRACING_LEVEL.store(encode(level_filter), Ordering::Relaxed);
}

pub fn tracing_level() -> LevelFilter {
    decode(TRACING_LEVEL.load(Ordering::Relaxed))
}

/// Initializes the global tracing subscriber with formatted output.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .with_filter(tracing_level()),
        )
        .init();
}
