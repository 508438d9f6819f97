//! Scripted socket server for integration tests.
//!
//! Speaks just enough of the protocol: the open/connect handshake, then one
//! reply per `42<id>[...]` request according to a per-request script. Every
//! text frame the client sends after the handshake is forwarded to
//! `received`.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use scrapbox_client::socket::frame::{Frame, Packet};
use scrapbox_client::{SocketClient, SocketConfig};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

pub const OPEN_FRAME: &str = r#"0{"sid":"mock","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

/// How the server answers one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `43<id>[{"ok":true,"echo":<request data>}]`
    Accept,
    /// `43<id>[{"error":<msg>}]`
    Reject(&'static str),
    /// Never answer.
    Silent,
    /// Drop the connection without answering.
    Hangup,
}

/// How the server runs the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    Normal,
    /// Skip the open frame and send an application connect instead.
    BadOpen,
    /// Send a bare `0` with no session description, then carry on as normal.
    EmptyOpen,
    /// Answer the client's connect with an application error.
    BadConnect,
}

/// What the client sent during the WebSocket upgrade.
#[derive(Debug, Clone, Default)]
pub struct Upgrade {
    pub query: Option<String>,
    pub cookie: Option<String>,
}

struct Shared {
    handshake: Handshake,
    script: Mutex<VecDeque<Reply>>,
    /// When > 0, replies are held until this many are queued, then sent in
    /// reverse order.
    reverse_batch: usize,
    received: mpsc::UnboundedSender<String>,
    push: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    upgrades: Mutex<Vec<Upgrade>>,
    connections: AtomicUsize,
}

pub struct MockServer {
    pub url: String,
    pub received: mpsc::UnboundedReceiver<String>,
    push: mpsc::UnboundedSender<String>,
    shared: Arc<Shared>,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::builder().start().await
    }

    pub fn builder() -> MockServerBuilder {
        MockServerBuilder {
            handshake: Handshake::Normal,
            script: VecDeque::new(),
            reverse_batch: 0,
        }
    }

    /// Send a raw frame to the connected client.
    pub fn push(&self, frame: &str) {
        let _ = self.push.send(frame.to_string());
    }

    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    pub fn upgrades(&self) -> Vec<Upgrade> {
        self.shared.upgrades.lock().clone()
    }

    /// Client socket pointed at this server with short timeouts.
    pub fn client(&self, session_id: Option<&str>) -> SocketClient {
        let mut config = SocketConfig::new(&self.url, session_id.map(str::to_string));
        config.ack_timeout = Duration::from_millis(300);
        config.connect_timeout = Duration::from_secs(2);
        SocketClient::new(config)
    }

    /// Next frame from the client, with a deadline.
    pub async fn next_received(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(2), self.received.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("server stopped")
    }

    /// Next request frame from the client, decoded as `(ack_id, data)`.
    pub async fn next_commit(&mut self) -> (u64, Value) {
        loop {
            let text = self.next_received().await;
            if let Some((ack_id, body)) = parse_request(&text) {
                return (ack_id, body[1]["data"].clone());
            }
        }
    }
}

pub struct MockServerBuilder {
    handshake: Handshake,
    script: VecDeque<Reply>,
    reverse_batch: usize,
}

impl MockServerBuilder {
    pub fn handshake(mut self, handshake: Handshake) -> Self {
        self.handshake = handshake;
        self
    }

    /// Replies for the next requests, in order. Later requests are accepted.
    pub fn script(mut self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.script.extend(replies);
        self
    }

    pub fn reverse_batch(mut self, n: usize) -> Self {
        self.reverse_batch = n;
        self
    }

    pub async fn start(self) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received_rx) = mpsc::unbounded_channel();
        let (push_tx, push_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            handshake: self.handshake,
            script: Mutex::new(self.script),
            reverse_batch: self.reverse_batch,
            received: received_tx,
            push: tokio::sync::Mutex::new(push_rx),
            upgrades: Mutex::new(Vec::new()),
            connections: AtomicUsize::new(0),
        });

        let accept_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&accept_shared)));
            }
        });

        MockServer {
            url: format!("ws://{addr}/socket.io/"),
            received: received_rx,
            push: push_tx,
            shared,
        }
    }
}

/// Decode `42<id>[...]` into its ack id and JSON array.
pub fn parse_request(text: &str) -> Option<(u64, Value)> {
    match Frame::parse(text)? {
        Frame::Message(Packet::Event { ack_id: Some(ack_id), body }) => {
            Some((ack_id, serde_json::from_str(body).ok()?))
        }
        _ => None,
    }
}

async fn serve(stream: TcpStream, shared: Arc<Shared>) {
    let mut upgrade = Upgrade::default();
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        upgrade.query = req.uri().query().map(str::to_string);
        upgrade.cookie = req
            .headers()
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(resp)
    };
    let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
        return;
    };
    shared.upgrades.lock().push(upgrade);
    shared.connections.fetch_add(1, Ordering::SeqCst);

    let (mut tx, mut rx) = ws.split();

    if shared.handshake == Handshake::BadOpen {
        let _ = tx.send(Message::text("40")).await;
        return;
    }
    let open = match shared.handshake {
        Handshake::EmptyOpen => "0",
        _ => OPEN_FRAME,
    };
    if tx.send(Message::text(open)).await.is_err() {
        return;
    }

    // Client's application connect.
    match rx.next().await {
        Some(Ok(Message::Text(text))) if text.as_str() == "40" => {}
        _ => return,
    }
    if shared.handshake == Handshake::BadConnect {
        let _ = tx.send(Message::text(r#"44{"message":"unauthorized"}"#)).await;
        return;
    }
    if tx.send(Message::text(r#"40{"sid":"app"}"#)).await.is_err() {
        return;
    }

    let mut push = shared.push.lock().await;
    let mut held: Vec<String> = Vec::new();
    loop {
        tokio::select! {
            msg = rx.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text.as_str().to_string(),
                    Some(Ok(_)) => continue,
                    _ => return,
                };
                let _ = shared.received.send(text.clone());
                let Some((ack_id, body)) = parse_request(&text) else {
                    continue;
                };
                let reply = shared.script.lock().pop_front().unwrap_or(Reply::Accept);
                let frame = match reply {
                    Reply::Accept => {
                        let ack = json!([{ "ok": true, "echo": body[1]["data"].clone() }]);
                        format!("43{ack_id}{ack}")
                    }
                    Reply::Reject(msg) => format!("43{ack_id}{}", json!([{ "error": msg }])),
                    Reply::Silent => continue,
                    Reply::Hangup => {
                        let _ = tx.close().await;
                        return;
                    }
                };
                if shared.reverse_batch > 0 {
                    held.push(frame);
                    if held.len() == shared.reverse_batch {
                        for frame in held.drain(..).rev() {
                            let _ = tx.send(Message::text(frame)).await;
                        }
                    }
                } else if tx.send(Message::text(frame)).await.is_err() {
                    return;
                }
            }
            Some(frame) = push.recv() => {
                if tx.send(Message::text(frame)).await.is_err() {
                    return;
                }
            }
        }
    }
}
