// vigil-api: Async Rust client for the monitoring backend (HTTP + live channels)

pub mod client;
pub mod error;
pub mod models;
pub mod search;
pub mod transport;
pub mod websocket;

pub use client::MonitorClient;
pub use error::Error;
pub use search::SearchClient;
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ChannelEvent, ChannelHandle, ConnectionState, ReconnectConfig};
