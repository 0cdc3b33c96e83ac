//! Logging setup for the export tool.
//!
//! All diagnostics go to stderr. Stdout is reserved for export data and
//! must never receive log output.

use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::{LoggingError, LoggingResult};

/// Initialize stderr logging with the given level.
///
/// An explicit `RUST_LOG` environment filter takes precedence over the
/// level passed in.
pub fn init_logging(level: LevelFilter) -> LoggingResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| LoggingError::SubscriberInit(e.to_string()))
}
