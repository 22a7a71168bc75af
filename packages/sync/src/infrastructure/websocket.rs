//! Stream channels over tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use geolive_shared::session::Session;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::domain::{ChannelError, ChannelEvent, ChannelFactory, FeedChannel, FeedEndpoint};

/// Opens WebSocket connections to `<ws_base>/<path>?token=..&<scope>`.
#[derive(Debug, Clone)]
pub struct WebSocketChannelFactory {
    ws_base: String,
    token: Option<String>,
}

impl WebSocketChannelFactory {
    pub fn new(ws_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            ws_base: ws_base.into(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn from_session(session: &Session) -> Self {
        Self::new(session.ws_base(), session.token().map(str::to_string))
    }

    /// Stream URL for `endpoint`
    pub fn url(&self, endpoint: &FeedEndpoint) -> Result<Url, ChannelError> {
        let raw = format!(
            "{}/{}",
            self.ws_base.trim_end_matches('/'),
            endpoint.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|e| ChannelError::InvalidUrl(e.to_string()))?;
        if self.token.is_some() || !endpoint.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            if let Some(token) = &self.token {
                pairs.append_pair("token", token);
            }
            pairs.extend_pairs(&endpoint.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl ChannelFactory for WebSocketChannelFactory {
    async fn open(&self, endpoint: &FeedEndpoint) -> Result<Box<dyn FeedChannel>, ChannelError> {
        let url = self.url(endpoint)?;
        tracing::debug!("Connecting to {}{}", url.origin().ascii_serialization(), url.path());

        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        Ok(Box::new(WebSocketChannel { stream }))
    }
}

/// An open WebSocket connection.
pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FeedChannel for WebSocketChannel {
    async fn recv(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(ChannelEvent::Text(text.to_string())),
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server closed the connection: {:?}", frame);
                    return Some(ChannelEvent::Closed);
                }
                Ok(Message::Binary(data)) => {
                    tracing::debug!("Ignoring binary frame ({} bytes)", data.len());
                }
                Ok(_) => {}
                Err(e) => return Some(ChannelEvent::Error(e.to_string())),
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), ChannelError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }
}
