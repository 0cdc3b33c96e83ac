//! JSON-RPC message types for the daemon websocket interface.

use serde::{Deserialize, Serialize};

use crate::error::{RpcError, RpcResult};

/// Outgoing JSON-RPC request envelope.
#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> Request<'a> {
    pub(crate) fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self { jsonrpc: "1.0", id, method, params }
    }
}

/// Incoming JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Response {
    pub id: Option<u64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<ErrorObject>,
}

/// Error object attached to a failed JSON-RPC response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// Result payload of `getcfilterv2`.
///
/// The daemon also returns inclusion-proof fields alongside the filter
/// data; this tool performs no validation and ignores them.
#[derive(Debug, Deserialize)]
pub(crate) struct CFilterV2 {
    pub data: String,
}

impl CFilterV2 {
    /// Decode the hex filter payload into raw bytes.
    pub(crate) fn into_bytes(self) -> RpcResult<Vec<u8>> {
        hex::decode(&self.data).map_err(|e| RpcError::Response {
            method: "getcfilterv2".to_string(),
            reason: format!("invalid hex filter payload: {}", e),
        })
    }
}
