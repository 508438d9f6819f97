//! Client configuration constants.
//!
//! Centralizes endpoint defaults and protocol parameters.

use std::time::Duration;

/// Default REST API root.
pub const DEFAULT_API_URL: &str = "https://scrapbox.io/api";

/// Default socket endpoint.
pub const DEFAULT_WS_URL: &str = "wss://scrapbox.io/socket.io/";

/// Public page URL root, used when reporting created pages.
pub const PAGE_URL_BASE: &str = "https://scrapbox.io";

/// Cookie name carrying the session credential.
pub const SESSION_COOKIE: &str = "connect.sid";

/// Engine.IO protocol version, sent as the `EIO` query parameter.
pub const ENGINE_IO_VERSION: &str = "4";

/// Transport kind, sent as the `transport` query parameter.
pub const TRANSPORT_KIND: &str = "websocket";

/// How long a commit waits for its acknowledgement.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on dialing plus both handshake reads.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request timeout for the REST client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
