//! Daemon RPC client: websocket transport, message types, and the
//! query surface the export loop consumes.

mod client;
mod connection;
mod messages;

pub use client::{DaemonClient, FilterSource};
