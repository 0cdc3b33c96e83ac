//! Error types for the cfilter export tool.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Configuration-related errors.
///
/// All of these are detected before any network activity takes place.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("only one of --hashes and --binary may be specified")]
    ConflictingOutputModes,

    #[error("failed to read RPC certificate {}: {}", path.display(), source)]
    CertificateRead { path: PathBuf, source: io::Error },

    #[error("cannot export up to height {target} when the chain tip is {tip}")]
    TargetBeyondTip { target: u64, tip: u64 },
}

/// Errors from the daemon RPC connection and its query calls.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("websocket transport error: {0}")]
    Transport(String),

    #[error("daemon rejected {method}: {message} (code {code})")]
    Call { method: String, code: i64, message: String },

    #[error("malformed response to {method}: {reason}")]
    Response { method: String, reason: String },

    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    #[error("worker task failed: {0}")]
    Task(String),
}

/// Errors while formatting or writing export output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("filter of {len} bytes exceeds the 2-byte length prefix (max {})", u16::MAX)]
    FilterTooLarge { len: usize },

    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Logging-related errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Subscriber initialization failed: {0}")]
    SubscriberInit(String),
}

/// Type alias for Result with ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Type alias for RPC operation results.
pub type RpcResult<T> = std::result::Result<T, RpcError>;

/// Type alias for output operation results.
pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// Type alias for logging operation results.
pub type LoggingResult<T> = std::result::Result<T, LoggingError>;
