/// Classification of a failed remote API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    NotFound,
    Auth,
    Validation,
    Server,
    Transport,
    Serialization,
}

impl ApiErrorKind {
    /// Map an HTTP status code onto an error kind.
    pub fn from_status(code: u16) -> Self {
        if code == 404 {
            Self::NotFound
        } else if code == 401 || code == 403 {
            Self::Auth
        } else if (400..500).contains(&code) {
            Self::Validation
        } else {
            Self::Server
        }
    }
}

/// Common error type for `intelligence_core`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("api error ({kind:?}): {message}")]
    Api {
        kind: ApiErrorKind,
        status: Option<u16>,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(String),
}

impl Error {
    pub fn api(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            kind,
            status,
            message: message.into(),
        }
    }

    #[tracing::instrument(level = "debug")]
    pub fn transport(message: impl Into<String> + std::fmt::Debug) -> Self {
        Self::Transport(message.into())
    }

    /// Short user-facing text (no variant prefix) for notifications.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::InvalidInput(m) | Self::NotFound(m) | Self::Transport(m) | Self::Config(m) => {
                m.clone()
            }
            Self::Serialization(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(ApiErrorKind::from_status(404), ApiErrorKind::NotFound);
        assert_eq!(ApiErrorKind::from_status(401), ApiErrorKind::Auth);
        assert_eq!(ApiErrorKind::from_status(403), ApiErrorKind::Auth);
        assert_eq!(ApiErrorKind::from_status(422), ApiErrorKind::Validation);
        assert_eq!(ApiErrorKind::from_status(503), ApiErrorKind::Server);
    }

    #[test]
    fn user_message_strips_prefix() {
        let e = Error::api(ApiErrorKind::Server, Some(500), "model store offline");
        assert_eq!(e.user_message(), "model store offline");
        assert!(e.to_string().starts_with("api error"));
    }
}
