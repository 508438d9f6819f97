//! Scrapbox client library
//!
//! Reads pages over the REST API and writes them over the persistent socket
//! as per-line commits. [`ScrapboxClient`] wires both halves together for one
//! default project.

pub mod constants;
pub mod diff;
pub mod line_id;
pub mod rest;
pub mod socket;
pub mod writer;

use std::sync::Arc;
use std::time::Duration;

pub use diff::{diff_lines, splice_after};
pub use line_id::new_line_id;
pub use rest::{RestClient, RestError};
pub use socket::{ConnectionState, SocketClient, SocketConfig, SocketError};
pub use writer::{PageSource, PageWriter, WriteOutcome};

use constants::{ACK_TIMEOUT, CONNECT_TIMEOUT, DEFAULT_API_URL, DEFAULT_WS_URL, REQUEST_TIMEOUT};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Rest(#[from] RestError),
    #[error("{0}")]
    Socket(#[from] SocketError),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Everything needed to talk to one Scrapbox deployment.
#[derive(Clone)]
pub struct ClientConfig {
    /// Project used when a call names none.
    pub project: String,
    /// `connect.sid` credential.
    pub session_id: Option<String>,
    pub api_url: String,
    pub ws_url: String,
    pub request_timeout: Duration,
    pub ack_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(project: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            project: project.into(),
            session_id,
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            ack_timeout: ACK_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("project", &self.project)
            .field("session_id", &self.session_id.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("ws_url", &self.ws_url)
            .field("request_timeout", &self.request_timeout)
            .field("ack_timeout", &self.ack_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// REST reader, socket, and page writer sharing one configuration.
///
/// The socket is not dialed until the first write.
pub struct ScrapboxClient {
    project: String,
    rest: Arc<RestClient>,
    socket: Arc<SocketClient>,
    writer: PageWriter<RestClient>,
}

impl ScrapboxClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.project.trim().is_empty() {
            return Err(ClientError::Config("project name is required".into()));
        }

        let rest = Arc::new(RestClient::new(
            &config.api_url,
            config.session_id.clone(),
            config.request_timeout,
        )?);

        let mut socket_config = SocketConfig::new(config.ws_url, config.session_id);
        socket_config.ack_timeout = config.ack_timeout;
        socket_config.connect_timeout = config.connect_timeout;
        let socket = Arc::new(SocketClient::new(socket_config));

        let writer = PageWriter::new(Arc::clone(&rest), Arc::clone(&socket));
        Ok(Self {
            project: config.project,
            rest,
            socket,
            writer,
        })
    }

    /// Default project name.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// `project` if given and non-empty, else the default.
    pub fn resolve_project<'a>(&'a self, project: Option<&'a str>) -> &'a str {
        match project {
            Some(p) if !p.trim().is_empty() => p,
            _ => &self.project,
        }
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn socket(&self) -> &SocketClient {
        &self.socket
    }

    pub fn writer(&self) -> &PageWriter<RestClient> {
        &self.writer
    }

    /// Close the socket. Later writes redial.
    pub async fn close(&self) {
        self.socket.close().await;
    }
}

impl std::fmt::Debug for ScrapboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapboxClient")
            .field("project", &self.project)
            .field("rest", &self.rest)
            .field("socket", &self.socket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_project() {
        let err = ScrapboxClient::new(ClientConfig::new("  ", None)).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_resolve_project() {
        let client = ScrapboxClient::new(ClientConfig::new("main", None)).unwrap();
        assert_eq!(client.resolve_project(None), "main");
        assert_eq!(client.resolve_project(Some("")), "main");
        assert_eq!(client.resolve_project(Some("other")), "other");
    }

    #[test]
    fn test_starts_disconnected() {
        let client = ScrapboxClient::new(ClientConfig::new("main", Some("sid".into()))).unwrap();
        assert_eq!(client.socket().state(), ConnectionState::Disconnected);
        assert!(!format!("{client:?}").contains("\"sid\""));
    }

    #[test]
    fn test_config_debug_redacts() {
        let config = ClientConfig::new("main", Some("s3cret".into()));
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
