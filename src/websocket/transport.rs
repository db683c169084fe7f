//! Push transport seam and its WebSocket implementation.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::TransportError;

/// Close frame details reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

/// A single event read from an open push transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    /// Application text frame
    Text(String),
    /// The server closed the connection
    Close(Option<CloseInfo>),
    /// The transport failed
    Error(TransportError),
}

/// An open push connection
#[async_trait]
pub trait PushStream: Send {
    /// Next frame, or `None` once the stream has ended.
    async fn next_frame(&mut self) -> Option<PushFrame>;

    /// Close the connection from the client side.
    async fn close(&mut self);
}

/// Opens push connections
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn PushStream>, TransportError>;
}

/// Build the channel URL: `<base>/ws?token=<credential>`
pub fn push_url(base_url: &str, credential: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(&format!("{}/ws", base_url.trim_end_matches('/')))?;
    url.query_pairs_mut().append_pair("token", credential);
    Ok(url.into())
}

/// `PushConnector` backed by tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl PushConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn PushStream>, TransportError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        tracing::debug!(status = %response.status(), "WebSocket handshake completed");

        Ok(Box::new(TungsteniteStream { inner: stream }))
    }
}

struct TungsteniteStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushStream for TungsteniteStream {
    async fn next_frame(&mut self) -> Option<PushFrame> {
        loop {
            let frame = match self.inner.next().await? {
                Ok(Message::Text(text)) => PushFrame::Text(text),
                Ok(Message::Close(frame)) => PushFrame::Close(frame.map(|f| CloseInfo {
                    code: u16::from(f.code),
                    reason: f.reason.into_owned(),
                })),
                // Pings are answered by tungstenite; binary frames carry nothing for us
                Ok(_) => continue,
                Err(e) => PushFrame::Error(TransportError::Protocol(e.to_string())),
            };
            return Some(frame);
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            tracing::debug!(error = %e, "Error while closing WebSocket");
        }
    }
}
