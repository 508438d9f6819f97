//! Persistent socket for page commits.
//!
//! ```text
//!   callers                          SocketClient
//!   ┌──────────────┐  request()   ┌───────────────────────────────┐
//!   │ PageWriter   │ ──────────▶  │ Session (one live socket)     │
//!   │ PageWriter   │              │  writer: Mutex<SplitSink>     │──▶ 42<id>[...]
//!   └──────────────┘  ◀────────── │  pending: id → oneshot        │
//!                      ack body   │  read loop (spawned task)     │◀── 2 / 43<id>[...]
//!                                 └───────────────────────────────┘
//! ```
//!
//! The socket is dialed lazily on first use and reused until a read or write
//! fails; the next call dials again. No request is ever retried here: a
//! timed-out commit may or may not have been applied.

mod connection;
pub mod frame;
mod pending;

use std::time::Duration;

pub use connection::SocketClient;

use crate::constants::{ACK_TIMEOUT, CONNECT_TIMEOUT};

/// Lifecycle of the socket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    AwaitingTransportHandshake,
    AwaitingApplicationHandshake,
    Connected,
}

/// Socket endpoint and timing.
#[derive(Clone)]
pub struct SocketConfig {
    /// Endpoint, e.g. `wss://scrapbox.io/socket.io/`.
    pub url: String,
    /// Session credential, sent as the `connect.sid` cookie.
    pub session_id: Option<String>,
    pub ack_timeout: Duration,
    pub connect_timeout: Duration,
}

impl SocketConfig {
    pub fn new(url: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            url: url.into(),
            session_id,
            ack_timeout: ACK_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for SocketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketConfig")
            .field("url", &self.url)
            .field("session_id", &self.session_id.as_ref().map(|_| "<redacted>"))
            .field("ack_timeout", &self.ack_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Errors from the socket write path.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Dial, read, or write failed. The socket has been torn down.
    #[error("transport error: {0}")]
    Transport(String),
    /// The peer answered the handshake with something unexpected.
    #[error("handshake failed: {0}")]
    Handshake(String),
    /// No acknowledgement arrived in time. The commit may or may not have
    /// been applied.
    #[error("no acknowledgement within {0:?}")]
    Timeout(Duration),
    /// The service rejected the commit (stale parent, validation, ...).
    #[error("commit rejected: {0}")]
    Commit(String),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for SocketError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        SocketError::Transport(e.to_string())
    }
}
