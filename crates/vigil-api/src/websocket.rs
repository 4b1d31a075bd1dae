//! Live WebSocket channels with fixed-delay auto-reconnect.
//!
//! Each [`ChannelHandle`] owns one background task that connects to a
//! backend channel (`/video_feed` or `/alerts`), forwards every inbound
//! frame as a typed [`ChannelEvent`], and reconnects forever after a fixed
//! delay whenever the connection drops. There is no retry limit and no
//! exponential backoff.
//!
//! Because a single task drives connect → read → wait → connect, at most
//! one reconnect timer exists per channel at any time.
//!
//! # Example
//!
//! ```rust,ignore
//! use vigil_api::websocket::{ChannelEvent, ChannelHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = url::Url::parse("ws://10.0.0.5:8000/alerts")?;
//! let mut alerts = ChannelHandle::connect("alerts", url, ReconnectConfig::alerts(), &CancellationToken::new());
//!
//! while let Some(event) = alerts.next().await {
//!     if let ChannelEvent::Text(text) = event {
//!         println!("{text}");
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle of a single channel.
///
/// `Connecting → Open` on handshake, `Open | Connecting → Closed` on error
/// or remote close, `Closed → Connecting` after the reconnect delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

// ── ChannelEvent ─────────────────────────────────────────────────────

/// Everything a channel produces, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel changed state.
    State(ConnectionState),
    /// A binary frame (an encoded camera image on the video channel).
    Binary(Bytes),
    /// A text frame, usually JSON.
    Text(String),
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Fixed-delay reconnection policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay between a close and the next connection attempt.
    pub delay: Duration,
}

impl ReconnectConfig {
    /// Default policy for the video channel (5 s).
    pub fn video() -> Self {
        Self {
            delay: Duration::from_secs(5),
        }
    }

    /// Default policy for the alert channel (3 s).
    pub fn alerts() -> Self {
        Self {
            delay: Duration::from_secs(3),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self::alerts()
    }
}

/// Derive a channel URL from an HTTP base URL (`http → ws`, `https → wss`).
pub fn channel_url(base: &Url, path: &str) -> Result<Url, Error> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(Error::UnsupportedScheme(other.to_string())),
    };
    let mut url = base.join(path)?;
    url.set_scheme(scheme)
        .map_err(|()| Error::UnsupportedScheme(base.scheme().to_string()))?;
    Ok(url)
}

// ── ChannelHandle ────────────────────────────────────────────────────

/// Handle to a running channel task.
///
/// Dropping the handle cancels the task.
pub struct ChannelHandle {
    name: String,
    event_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl ChannelHandle {
    /// Spawn the connect/reconnect loop for one channel.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background. `cancel` stops the task (a child token is used, so
    /// cancelling the parent tears down every channel).
    pub fn connect(
        name: impl Into<String>,
        url: Url,
        reconnect: ReconnectConfig,
        cancel: &CancellationToken,
    ) -> Self {
        let name = name.into();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let cancel = cancel.child_token();

        let task = ChannelTask {
            name: name.clone(),
            url,
            reconnect,
            event_tx,
            state_tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(task.run());

        Self {
            name,
            event_rx,
            state_rx,
            cancel,
        }
    }

    /// Channel name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receive the next event. Returns `None` once the task has stopped.
    pub async fn next(&mut self) -> Option<ChannelEvent> {
        self.event_rx.recv().await
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state changes without consuming events.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

struct ChannelTask {
    name: String,
    url: Url,
    reconnect: ReconnectConfig,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl ChannelTask {
    /// connect → read → closed → wait `delay` → connect, until cancelled.
    async fn run(self) {
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            self.set_state(ConnectionState::Connecting);

            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = self.connect_and_read() => result,
            };

            match result {
                Ok(()) => tracing::info!(channel = %self.name, attempt, "channel closed"),
                Err(e) => tracing::warn!(channel = %self.name, attempt, error = %e, "channel error"),
            }
            self.set_state(ConnectionState::Closed);

            if self.event_tx.is_closed() || self.cancel.is_cancelled() {
                break;
            }

            tracing::info!(
                channel = %self.name,
                delay_ms = u64::try_from(self.reconnect.delay.as_millis()).unwrap_or(u64::MAX),
                "scheduling reconnect"
            );

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.reconnect.delay) => {}
            }
        }

        self.set_state(ConnectionState::Closed);
        tracing::debug!(channel = %self.name, "channel loop exiting");
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state || state == ConnectionState::Connecting {
            let _ = self.event_tx.send(ChannelEvent::State(state));
        }
    }

    /// Establish a single connection and read frames until it drops.
    async fn connect_and_read(&self) -> Result<(), Error> {
        tracing::info!(channel = %self.name, url = %self.url, "connecting");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        self.set_state(ConnectionState::Open);
        tracing::info!(channel = %self.name, "connected");

        let (_write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Ok(()),
                frame = read.next() => {
                    match frame {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            let _ = self.event_tx.send(ChannelEvent::Text(text.as_str().to_owned()));
                        }
                        Some(Ok(tungstenite::Message::Binary(data))) => {
                            let _ = self.event_tx.send(ChannelEvent::Binary(data));
                        }
                        Some(Ok(tungstenite::Message::Ping(_))) => {
                            // tungstenite handles pong replies automatically
                            tracing::trace!(channel = %self.name, "ping");
                        }
                        Some(Ok(tungstenite::Message::Close(frame))) => {
                            if let Some(ref cf) = frame {
                                tracing::info!(
                                    channel = %self.name,
                                    code = %cf.code,
                                    reason = %cf.reason,
                                    "close frame received"
                                );
                            }
                            return Ok(());
                        }
                        Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                        None => return Ok(()),
                        _ => {}
                    }
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_differ_per_channel() {
        assert_eq!(ReconnectConfig::video().delay, Duration::from_secs(5));
        assert_eq!(ReconnectConfig::alerts().delay, Duration::from_secs(3));
        assert_eq!(ReconnectConfig::default(), ReconnectConfig::alerts());
    }

    #[test]
    fn channel_url_rejects_unknown_schemes() {
        let base = Url::parse("ftp://example.com").unwrap();
        assert!(matches!(
            channel_url(&base, "/alerts"),
            Err(Error::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn channel_url_replaces_path() {
        let base = Url::parse("http://example.com:8000/dashboard/").unwrap();
        assert_eq!(
            channel_url(&base, "/alerts").unwrap().as_str(),
            "ws://example.com:8000/alerts"
        );
    }

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Open.to_string(), "open");
        assert_eq!(ConnectionState::default(), ConnectionState::Connecting);
    }
}
