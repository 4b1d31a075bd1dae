// ── Runtime monitor configuration ──
//
// Describes *where* the backends live and how to reach them. Never
// touches disk: the CLI/TUI builds a `MonitorConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;
use vigil_api::{ReconnectConfig, TlsMode, TransportConfig};

/// Default search backend, a separate service next to the monitor.
pub const DEFAULT_SEARCH_URL: &str = "http://localhost:8085";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs on a LAN box).
    DangerAcceptInvalid,
}

/// Configuration for one monitoring backend.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Monitoring backend base URL, e.g. `http://192.168.1.20:8000`.
    pub server: Url,
    /// Search backend base URL.
    pub search: Url,
    pub tls: TlsVerification,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Reconnect policy of the video channel.
    pub video_reconnect: ReconnectConfig,
    /// Reconnect policy of the alert channel.
    pub alert_reconnect: ReconnectConfig,
    /// Fetch the historical alert batch on start.
    pub load_history: bool,
}

impl MonitorConfig {
    /// Defaults for the given monitoring and search backends.
    pub fn new(server: Url, search: Url) -> Self {
        Self {
            server,
            search,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            video_reconnect: ReconnectConfig::video(),
            alert_reconnect: ReconnectConfig::alerts(),
            load_history: true,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
