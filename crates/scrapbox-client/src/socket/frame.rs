//! Two-layer text framing.
//!
//! Every websocket text message is one transport frame: a single ASCII digit
//! followed by a payload. Transport `message` frames (`4`) carry one more
//! digit selecting the application packet type.
//!
//! ```text
//! transport:   0 open   1 close   2 ping   3 pong   4 message
//! application: 40 connect  41 disconnect  42 event  43 ack  44 error
//!
//! 42<ackId>["socket.io-request", {...}]   outbound request
//! 43<ackId>[{...}, ...]                   inbound reply
//! ```

use serde_json::Value;

/// Application `connect` packet, sent once after the transport opens.
pub const CONNECT: &str = "40";

/// Transport `pong`, the reply to every ping.
pub const PONG: &str = "3";

/// A decoded transport frame. Payloads borrow from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    Open(&'a str),
    Close,
    Ping(&'a str),
    Pong(&'a str),
    Message(Packet<'a>),
    Unknown(&'a str),
}

/// A decoded application packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<'a> {
    Connect(&'a str),
    Disconnect,
    Event { ack_id: Option<u64>, body: &'a str },
    Ack { ack_id: u64, body: &'a str },
    Error(&'a str),
    Unknown(&'a str),
}

impl<'a> Frame<'a> {
    /// Decode one text message. Returns `None` for an empty message.
    pub fn parse(text: &'a str) -> Option<Self> {
        let mut chars = text.chars();
        let kind = chars.next()?;
        let rest = chars.as_str();
        Some(match kind {
            '0' => Frame::Open(rest),
            '1' => Frame::Close,
            '2' => Frame::Ping(rest),
            '3' => Frame::Pong(rest),
            '4' => Frame::Message(Packet::parse(rest)),
            _ => Frame::Unknown(text),
        })
    }
}

impl<'a> Packet<'a> {
    fn parse(text: &'a str) -> Self {
        let mut chars = text.chars();
        let Some(kind) = chars.next() else {
            return Packet::Unknown(text);
        };
        let rest = chars.as_str();
        match kind {
            '0' => Packet::Connect(rest),
            '1' => Packet::Disconnect,
            '2' => {
                let (ack_id, body) = split_ack_id(rest);
                Packet::Event { ack_id, body }
            }
            '3' => match split_ack_id(rest) {
                (Some(ack_id), body) => Packet::Ack { ack_id, body },
                (None, _) => Packet::Unknown(text),
            },
            '4' => Packet::Error(rest),
            _ => Packet::Unknown(text),
        }
    }
}

/// Split a leading decimal ack id from the JSON body. Whitespace around the
/// id is tolerated.
fn split_ack_id(text: &str) -> (Option<u64>, &str) {
    let text = text.trim_start();
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return (None, text);
    }
    match text[..digits].parse() {
        Ok(id) => (Some(id), text[digits..].trim_start()),
        Err(_) => (None, text),
    }
}

/// `42<id><json>`: an event that expects an acknowledgement.
pub fn event_with_ack(ack_id: u64, payload: &Value) -> Result<String, serde_json::Error> {
    Ok(format!("42{ack_id}{}", serde_json::to_string(payload)?))
}
