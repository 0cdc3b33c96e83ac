//! High-level daemon client and the filter-source seam.

use async_trait::async_trait;

use crate::config::Settings;
use crate::error::{ExportError, RpcError, RpcResult};
use crate::rpc::connection::Connection;
use crate::rpc::messages::CFilterV2;

/// Provider of the three chain queries the export loop needs.
///
/// The live implementation is [`DaemonClient`]; tests substitute their
/// own sources.
#[async_trait]
pub trait FilterSource: Send + Sync {
    /// Height of the best block known to the daemon.
    async fn tip_height(&self) -> RpcResult<u64>;

    /// Hash of the block at the given height, as reported by the daemon.
    async fn block_hash(&self, height: u64) -> RpcResult<String>;

    /// Raw committed filter bytes for the given block hash.
    async fn cfilter(&self, block_hash: &str) -> RpcResult<Vec<u8>>;
}

/// Client for a dcrd-style daemon RPC interface.
pub struct DaemonClient {
    conn: Connection,
}

impl DaemonClient {
    /// Connect and authenticate to the daemon named by the settings.
    pub async fn connect(settings: &Settings) -> Result<Self, ExportError> {
        let conn = Connection::open(settings).await?;
        Ok(Self { conn })
    }

    /// Close the RPC connection.
    pub async fn shutdown(&self) {
        self.conn.close().await;
    }

    fn decode<T: serde::de::DeserializeOwned>(
        method: &str,
        value: serde_json::Value,
    ) -> RpcResult<T> {
        serde_json::from_value(value).map_err(|e| RpcError::Response {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl FilterSource for DaemonClient {
    async fn tip_height(&self) -> RpcResult<u64> {
        let value = self.conn.call("getblockcount", serde_json::json!([])).await?;
        value.as_u64().ok_or_else(|| RpcError::Response {
            method: "getblockcount".to_string(),
            reason: "expected a block count".to_string(),
        })
    }

    async fn block_hash(&self, height: u64) -> RpcResult<String> {
        let value = self.conn.call("getblockhash", serde_json::json!([height])).await?;
        value.as_str().map(str::to_string).ok_or_else(|| RpcError::Response {
            method: "getblockhash".to_string(),
            reason: "expected a hash string".to_string(),
        })
    }

    async fn cfilter(&self, block_hash: &str) -> RpcResult<Vec<u8>> {
        let value = self.conn.call("getcfilterv2", serde_json::json!([block_hash])).await?;
        let cfilter: CFilterV2 = Self::decode("getcfilterv2", value)?;
        cfilter.into_bytes()
    }
}
