use intelligence_core::ApiErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct ClientError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        let kind = if e.is_decode() {
            ApiErrorKind::Serialization
        } else {
            ApiErrorKind::Transport
        };
        ClientError::new(kind, status, e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::new(ApiErrorKind::Serialization, None, e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::new(ApiErrorKind::Transport, None, e.to_string())
    }
}

impl From<ClientError> for intelligence_core::Error {
    fn from(e: ClientError) -> Self {
        match e.kind {
            ApiErrorKind::Transport => intelligence_core::Error::Transport(e.message),
            kind => intelligence_core::Error::api(kind, e.status, e.message),
        }
    }
}
