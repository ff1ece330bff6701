use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use intelligence_core::{PushConnection, PushTransport};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;

/// WebSocket transport for the real-time channel.
#[derive(Debug, Clone)]
pub struct WsTransport {
    url: String,
    api_key: Option<String>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Socket URL scoped to `room` (and carrying the token when one is set).
    pub fn room_url(&self, room: &str) -> Result<String, ClientError> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            ClientError::new(
                intelligence_core::ApiErrorKind::Transport,
                None,
                format!("invalid socket url {}: {e}", self.url),
            )
        })?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("room", room);
            if let Some(key) = self.api_key.as_deref() {
                q.append_pair("token", key);
            }
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl PushTransport for WsTransport {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn connect(&self, room: &str) -> intelligence_core::Result<Box<dyn PushConnection>> {
        let url = self.room_url(room)?;
        let (stream, _resp) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(ClientError::from)?;
        tracing::debug!("socket open");
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushConnection for WsConnection {
    async fn recv(&mut self) -> Option<intelligence_core::Result<String>> {
        loop {
            let msg = match self.stream.next().await? {
                Ok(m) => m,
                Err(e) => return Some(Err(ClientError::from(e).into())),
            };
            match msg {
                Message::Text(text) => return Some(Ok(text.to_string())),
                Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::debug!("ignoring non-utf8 binary frame"),
                },
                Message::Close(_) => return None,
                // Pings are answered by tungstenite on the next read/write.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn send(&mut self, text: String) -> intelligence_core::Result<()> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| ClientError::from(e).into())
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(%e, "socket close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_is_appended_as_query() {
        let t = WsTransport::new("ws://localhost:8000/ws");
        assert_eq!(
            t.room_url("team 1").unwrap(),
            "ws://localhost:8000/ws?room=team+1"
        );
        let t = WsTransport::new("wss://host/ws?v=2").with_api_key("k");
        assert_eq!(t.room_url("r").unwrap(), "wss://host/ws?v=2&room=r&token=k");
    }

    #[test]
    fn bad_url_is_transport_error() {
        let err = WsTransport::new("not a url").room_url("r").unwrap_err();
        assert_eq!(err.kind, intelligence_core::ApiErrorKind::Transport);
    }

    #[tokio::test]
    async fn unreachable_socket_fails_to_connect() {
        let t = WsTransport::new("ws://127.0.0.1:9/ws");
        assert!(t.connect("r").await.is_err());
    }
}
