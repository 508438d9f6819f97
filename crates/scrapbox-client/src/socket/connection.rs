//! Socket lifecycle: dial, two-layer handshake, read loop, request/ack.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::COOKIE};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::frame::{self, Frame, Packet};
use super::pending::{self, PendingAcks};
use super::{ConnectionState, SocketConfig, SocketError};
use crate::constants::{ENGINE_IO_VERSION, SESSION_COOKIE, TRANSPORT_KIND};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type SharedSink = Arc<tokio::sync::Mutex<WsSink>>;

// ============================================================================
// State
// ============================================================================

/// Connection state tagged with the dial attempt that owns it, so a stale
/// read loop cannot overwrite the state of a newer socket.
#[derive(Debug, Default)]
struct StateCell {
    inner: Mutex<(u64, ConnectionState)>,
}

impl StateCell {
    fn get(&self) -> ConnectionState {
        self.inner.lock().1
    }

    /// Start a new dial attempt and return its epoch.
    fn begin(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.0 += 1;
        inner.1 = ConnectionState::Connecting;
        inner.0
    }

    fn set(&self, epoch: u64, state: ConnectionState) {
        let mut inner = self.inner.lock();
        if inner.0 == epoch && inner.1 != state {
            tracing::debug!(from = %inner.1, to = %state, "socket state");
            inner.1 = state;
        }
    }
}

// ============================================================================
// Session (one live socket)
// ============================================================================

struct Session {
    epoch: u64,
    writer: SharedSink,
    pending: Arc<PendingAcks>,
    next_ack: AtomicU64,
    /// Cancelled when the socket dies or is torn down; stops the read loop.
    shutdown: CancellationToken,
}

impl Session {
    fn is_alive(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    async fn send(&self, text: String) -> Result<(), SocketError> {
        self.writer.lock().await.send(Message::text(text)).await?;
        Ok(())
    }

    async fn request(&self, payload: &Value, ack_timeout: Duration) -> Result<Value, SocketError> {
        let ack_id = self.next_ack.fetch_add(1, Ordering::Relaxed) + 1;
        let text = frame::event_with_ack(ack_id, payload)?;

        // Registered before the write so a fast reply always has a slot.
        let mut ack = self.pending.register(ack_id);
        self.send(text).await?;
        tracing::debug!(ack_id, in_flight = self.pending.len(), "request sent, awaiting acknowledgement");

        let body = match tokio::time::timeout(ack_timeout, ack.wait()).await {
            Ok(Ok(body)) => body,
            Ok(Err(_)) => {
                return Err(SocketError::Transport(
                    "connection closed before acknowledgement".into(),
                ));
            }
            Err(_) => {
                tracing::warn!(ack_id, ?ack_timeout, "acknowledgement timed out");
                return Err(SocketError::Timeout(ack_timeout));
            }
        };

        tracing::debug!(ack_id, "acknowledgement received");
        pending::check_ack(&body)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.pending.fail_all();
    }
}

// ============================================================================
// SocketClient
// ============================================================================

/// Owner of the one persistent socket.
///
/// Cheap to share behind an `Arc`; every method takes `&self`. Writes are
/// serialized on the sink mutex, replies are matched by ack id, and any
/// number of requests may be in flight at once.
pub struct SocketClient {
    config: SocketConfig,
    state: Arc<StateCell>,
    session: tokio::sync::Mutex<Option<Arc<Session>>>,
}

impl SocketClient {
    pub fn new(config: SocketConfig) -> Self {
        Self {
            config,
            state: Arc::new(StateCell::default()),
            session: tokio::sync::Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Dial and handshake unless already connected.
    pub async fn connect(&self) -> Result<(), SocketError> {
        self.session().await.map(|_| ())
    }

    /// Send `payload` as an event expecting an acknowledgement and wait for
    /// the reply.
    ///
    /// Returns the first element of the reply array. A transport failure
    /// tears the socket down so the next call redials; a timeout leaves it
    /// up.
    pub async fn request(&self, payload: &Value) -> Result<Value, SocketError> {
        let session = self.session().await?;
        let result = session.request(payload, self.config.ack_timeout).await;
        if let Err(SocketError::Transport(reason)) = &result {
            tracing::warn!(%reason, "tearing down socket after transport failure");
            self.teardown(&session).await;
        }
        result
    }

    /// Close the socket if open. The next request redials.
    pub async fn close(&self) {
        let Some(session) = self.session.lock().await.take() else {
            return;
        };
        if let Err(e) = session.writer.lock().await.close().await {
            tracing::debug!(error = %e, "error closing socket");
        }
        self.state.set(session.epoch, ConnectionState::Disconnected);
        session.shutdown.cancel();
        tracing::info!("socket closed");
    }

    async fn session(&self) -> Result<Arc<Session>, SocketError> {
        let mut slot = self.session.lock().await;
        if let Some(session) = slot.as_ref() {
            if session.is_alive() {
                return Ok(Arc::clone(session));
            }
        }
        *slot = None;

        let epoch = self.state.begin();
        let connect_timeout = self.config.connect_timeout;
        let (sink, source) = match tokio::time::timeout(connect_timeout, self.establish(epoch)).await {
            Ok(Ok(halves)) => halves,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "socket connect failed");
                self.state.set(epoch, ConnectionState::Disconnected);
                return Err(e);
            }
            Err(_) => {
                tracing::warn!(?connect_timeout, "socket connect timed out");
                self.state.set(epoch, ConnectionState::Disconnected);
                return Err(SocketError::Transport(format!(
                    "connect timed out after {connect_timeout:?}"
                )));
            }
        };

        let session = Arc::new(Session {
            epoch,
            writer: Arc::new(tokio::sync::Mutex::new(sink)),
            pending: PendingAcks::new(),
            next_ack: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        });
        self.state.set(epoch, ConnectionState::Connected);

        tokio::spawn(read_loop(
            source,
            Arc::clone(&session.writer),
            Arc::clone(&session.pending),
            session.shutdown.clone(),
            Arc::clone(&self.state),
            epoch,
        ));

        tracing::info!(url = %self.config.url, "socket connected");
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Dial, then run both handshake layers.
    async fn establish(&self, epoch: u64) -> Result<(WsSink, WsSource), SocketError> {
        let request = self.client_request()?;
        tracing::debug!(url = %self.config.url, "dialing socket");
        let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
        let (mut sink, mut source) = stream.split();

        self.state.set(epoch, ConnectionState::AwaitingTransportHandshake);
        let open = next_text(&mut source).await?;
        if !is_session_open(&open) {
            return Err(SocketError::Handshake(format!("expected open frame, got {open:?}")));
        }

        sink.send(Message::text(frame::CONNECT)).await?;

        self.state.set(epoch, ConnectionState::AwaitingApplicationHandshake);
        let reply = next_text(&mut source).await?;
        if !matches!(Frame::parse(&reply), Some(Frame::Message(Packet::Connect(_)))) {
            return Err(SocketError::Handshake(format!("expected connect reply, got {reply:?}")));
        }

        Ok((sink, source))
    }

    fn client_request(&self) -> Result<Request, SocketError> {
        let url = endpoint_url(&self.config.url)?;
        let mut request = url.to_string().into_client_request()?;
        if let Some(sid) = &self.config.session_id {
            let cookie = HeaderValue::from_str(&format!("{SESSION_COOKIE}={sid}"))
                .map_err(|e| SocketError::InvalidEndpoint(format!("session cookie: {e}")))?;
            request.headers_mut().insert(COOKIE, cookie);
        }
        Ok(request)
    }

    async fn teardown(&self, session: &Arc<Session>) {
        let mut slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, session)) {
            *slot = None;
        }
        self.state.set(session.epoch, ConnectionState::Disconnected);
        session.shutdown.cancel();
        session.pending.fail_all();
    }
}

impl std::fmt::Debug for SocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketClient")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Endpoint with the protocol version and transport kind in the query.
pub(crate) fn endpoint_url(base: &str) -> Result<Url, SocketError> {
    let mut url =
        Url::parse(base).map_err(|e| SocketError::InvalidEndpoint(format!("{base}: {e}")))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "EIO" && k != "transport")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("EIO", ENGINE_IO_VERSION)
        .append_pair("transport", TRANSPORT_KIND);
    Ok(url)
}

/// An open frame carrying a JSON object session description.
fn is_session_open(text: &str) -> bool {
    match Frame::parse(text) {
        Some(Frame::Open(payload)) => {
            serde_json::from_str::<Value>(payload).is_ok_and(|v| v.is_object())
        }
        _ => false,
    }
}

/// Next text message during the handshake, skipping control frames.
async fn next_text(source: &mut WsSource) -> Result<String, SocketError> {
    while let Some(msg) = source.next().await {
        match msg? {
            Message::Text(text) => return Ok(text.as_str().to_owned()),
            Message::Close(close) => {
                return Err(SocketError::Transport(format!(
                    "closed during handshake: {close:?}"
                )));
            }
            _ => continue,
        }
    }
    Err(SocketError::Transport("stream ended during handshake".into()))
}

// ============================================================================
// Read loop
// ============================================================================

/// Drain inbound frames until the socket fails or `shutdown` fires.
async fn read_loop(
    mut source: WsSource,
    writer: SharedSink,
    pending: Arc<PendingAcks>,
    shutdown: CancellationToken,
    state: Arc<StateCell>,
    epoch: u64,
) {
    let reason = loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("read loop cancelled");
                pending.fail_all();
                return;
            }
            next = source.next() => next,
        };
        match next {
            Some(Ok(Message::Text(text))) => {
                if let Err(e) = dispatch(text.as_str(), &writer, &pending).await {
                    break e.to_string();
                }
            }
            Some(Ok(Message::Close(close))) => break format!("closed by peer: {close:?}"),
            Some(Ok(_)) => {}
            Some(Err(e)) => break e.to_string(),
            None => break "stream ended".to_string(),
        }
    };

    tracing::warn!(%reason, "socket read loop stopped");
    state.set(epoch, ConnectionState::Disconnected);
    shutdown.cancel();
    pending.fail_all();
}

/// Route one inbound frame: pings get a pong, acks go to their waiter,
/// everything else is dropped.
async fn dispatch(text: &str, writer: &SharedSink, pending: &PendingAcks) -> Result<(), SocketError> {
    match Frame::parse(text) {
        Some(Frame::Ping(_)) => {
            writer.lock().await.send(Message::text(frame::PONG)).await?;
            tracing::trace!("pong");
        }
        Some(Frame::Message(Packet::Ack { ack_id, body })) => {
            if !pending.resolve(ack_id, body.to_string()) {
                tracing::debug!(ack_id, "dropping unmatched acknowledgement");
            }
        }
        other => tracing::trace!(frame = ?other, "ignoring frame"),
    }
    Ok(())
}
