// ── Core error types ──
//
// User-facing errors from vigil-core. Consumers never see raw HTTP or
// JSON failures; `From<vigil_api::Error>` translates them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Monitor is not running")]
    NotRunning,

    #[error("Monitor was already started")]
    AlreadyStarted,

    // ── Backend ──────────────────────────────────────────────────────
    /// The backend answered but reported a failure.
    #[error("{message}")]
    Backend {
        message: String,
        status: Option<u16>,
    },

    #[error("Unexpected response from backend: {message}")]
    InvalidResponse { message: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<vigil_api::Error> for CoreError {
    fn from(err: vigil_api::Error) -> Self {
        match err {
            vigil_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Backend {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            vigil_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vigil_api::Error::UnsupportedScheme(scheme) => CoreError::Config {
                message: format!("Unsupported URL scheme '{scheme}' (expected http or https)"),
            },
            vigil_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vigil_api::Error::Http { status, message } => CoreError::Backend {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            vigil_api::Error::Upstream { message } => CoreError::Backend {
                message,
                status: None,
            },
            vigil_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            vigil_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_is_shown_verbatim() {
        let err: CoreError = vigil_api::Error::Upstream {
            message: "查询失败".into(),
        }
        .into();
        assert_eq!(err.to_string(), "查询失败");
    }

    #[test]
    fn http_status_is_kept() {
        let err: CoreError = vigil_api::Error::Http {
            status: 502,
            message: "Bad Gateway".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Backend { status: Some(502), .. }));
    }
}
