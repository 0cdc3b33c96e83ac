//! Websocket transport to the daemon RPC endpoint.
//!
//! The daemon serves JSON-RPC over a TLS websocket authenticated with
//! basic-auth credentials. Trust is anchored to the daemon's own
//! certificate file rather than the system roots. A single connection is
//! shared by all concurrent query calls; responses are correlated back to
//! callers by request id.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::{frame::Utf8Bytes, Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::config::Settings;
use crate::error::{ConfigError, ExportError, RpcError, RpcResult};
use crate::rpc::messages::{Request, Response};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

/// An authenticated websocket JSON-RPC connection to the daemon.
pub(crate) struct Connection {
    writer: Mutex<SplitSink<WsStream, Message>>,
    pending: PendingMap,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl Connection {
    /// Open a connection using the resolved settings.
    ///
    /// Reads the daemon certificate, builds a TLS config trusting only
    /// that certificate, performs the websocket handshake with basic-auth
    /// credentials, and spawns the response-routing task.
    pub(crate) async fn open(settings: &Settings) -> Result<Self, ExportError> {
        let tls = build_tls_config(settings)?;

        let url = format!("wss://{}/ws", settings.effective_rpc_connect());
        let mut request =
            url.into_client_request().map_err(|e| RpcError::Connect(e.to_string()))?;

        let credentials =
            BASE64.encode(format!("{}:{}", settings.rpc_user, settings.rpc_pass));
        let auth = HeaderValue::from_str(&format!("Basic {}", credentials))
            .map_err(|e| RpcError::Connect(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let (stream, _response) =
            connect_async_tls_with_config(request, None, false, Some(Connector::Rustls(tls)))
                .await
                .map_err(|e| RpcError::Connect(e.to_string()))?;

        tracing::debug!("Connected to daemon at {}", settings.effective_rpc_connect());

        let (writer, reader) = stream.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(route_responses(reader, Arc::clone(&pending)));

        Ok(Self {
            writer: Mutex::new(writer),
            pending,
            next_id: AtomicU64::new(1),
            reader,
        })
    }

    /// Issue a single JSON-RPC call and wait for its correlated response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> RpcResult<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let encoded = serde_json::to_string(&Request::new(id, method, params))
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let sent = self.writer.lock().await.send(Message::Text(Utf8Bytes::from(encoded))).await;
        if let Err(e) = sent {
            self.pending.lock().await.remove(&id);
            return Err(RpcError::Transport(e.to_string()));
        }

        // Sender dropped means the reader task ended without routing us a
        // response.
        let response = rx.await.map_err(|_| RpcError::ConnectionClosed)?;

        if let Some(err) = response.error {
            return Err(RpcError::Call {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }

        response.result.filter(|v| !v.is_null()).ok_or_else(|| RpcError::Response {
            method: method.to_string(),
            reason: "missing result".to_string(),
        })
    }

    /// Close the connection, ending the response-routing task.
    pub(crate) async fn close(&self) {
        {
            let mut writer = self.writer.lock().await;
            let _ = writer.send(Message::Close(None)).await;
            let _ = writer.close().await;
        }
        self.reader.abort();
        // Callers still waiting see the pending map drain as a closed
        // connection.
        self.pending.lock().await.clear();
    }
}

/// Build a TLS client config trusting only the daemon's certificate.
fn build_tls_config(settings: &Settings) -> Result<Arc<rustls::ClientConfig>, ExportError> {
    let pem = fs::read(&settings.rpc_cert).map_err(|source| ConfigError::CertificateRead {
        path: settings.rpc_cert.clone(),
        source,
    })?;

    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut pem.as_slice()) {
        let cert =
            cert.map_err(|e| RpcError::Tls(format!("invalid certificate entry: {}", e)))?;
        roots.add(cert).map_err(|e| RpcError::Tls(e.to_string()))?;
    }
    if roots.is_empty() {
        return Err(RpcError::Tls("certificate file contains no certificates".to_string()).into());
    }

    let config =
        rustls::ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();
    Ok(Arc::new(config))
}

/// Route incoming responses to their waiting callers by request id.
///
/// Ends when the stream closes or errors; dropping the pending senders
/// wakes every outstanding caller with a closed-connection error.
async fn route_responses(mut reader: SplitStream<WsStream>, pending: PendingMap) {
    while let Some(msg) = reader.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response: Response = match serde_json::from_str(&text) {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!("Discarding unparseable RPC message: {}", e);
                        continue;
                    }
                };

                // Notifications carry no id and are not ours to route.
                let Some(id) = response.id else {
                    continue;
                };

                if let Some(tx) = pending.lock().await.remove(&id) {
                    let _ = tx.send(response);
                } else {
                    tracing::warn!("Response for unknown request id {}", id);
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Websocket read failed: {}", e);
                break;
            }
        }
    }

    pending.lock().await.clear();
}
