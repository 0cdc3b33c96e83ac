//! Batch exporter for committed compact block filters.
//!
//! This library drives a one-shot export against a dcrd-style daemon: it
//! connects over authenticated websocket RPC, retrieves the committed
//! version-2 compact filter for every block from genesis up to a target
//! height, and emits either a hex hash manifest or a length-prefixed
//! binary dump together with aggregate statistics.
//!
//! Retrieval is windowed: heights are partitioned into batches of
//! [`export::WINDOW_WIDTH`] and fetched with one concurrent task per
//! height, while output is always written in strictly increasing height
//! order.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cfilter_export::{DaemonClient, Network, Settings, export};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cfilter_export::ExportError> {
//!     let mut settings = Settings::new(Network::Mainnet);
//!     settings.rpc_user = "user".to_string();
//!     settings.rpc_pass = "pass".to_string();
//!     settings.binary = true;
//!
//!     let client = Arc::new(DaemonClient::connect(&settings).await?);
//!     let stats = export::run(&client, &settings, std::io::stdout().lock()).await?;
//!     client.shutdown().await;
//!
//!     eprintln!("exported {} filters", stats.filter_count);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod rpc;

// Re-export main types for convenience
pub use config::{Network, Settings};
pub use error::{ConfigError, ExportError, LoggingError, OutputError, Result, RpcError};
pub use export::{OutputMode, RunStats};
pub use logging::init_logging;
pub use rpc::{DaemonClient, FilterSource};
pub use tracing::level_filters::LevelFilter;

/// Current version of the cfilter-export crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
