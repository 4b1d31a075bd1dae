//! Reactive dashboard core between `vigil-api` and the CLI / TUI.
//!
//! - **[`Monitor`]**: lifecycle facade. [`start()`](Monitor::start) opens the
//!   video and alert channels, loads the historical alert batch and spawns
//!   the reconcile task; request/response calls (behavior report, search)
//!   work without starting.
//!
//! - **[`Reconciler`]**: sole owner of dashboard state. Channel events are
//!   classified ([`classify()`]) and applied to the bounded stores, then
//!   published as an immutable [`DashboardSnapshot`] through a `watch`
//!   channel. Binary frames bypass the stores.
//!
//! - **Domain model** ([`model`]): behavior codes, alerts, frames, the
//!   behavior report and the synthetic status values.

pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod monitor;
pub mod qa;
pub mod reconcile;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::classify;
pub use config::{DEFAULT_SEARCH_URL, MonitorConfig, TlsVerification};
pub use error::CoreError;
pub use monitor::Monitor;
pub use qa::{QaAnswer, QaExchange, QaLog};
pub use reconcile::{ChannelKind, DashboardSnapshot, Reconciler};
pub use stream::SnapshotStream;

pub use model::{
    Alert, AlertLevel, AlertOrigin, BehaviorCode, BehaviorCounts, BehaviorEvent, BehaviorReport,
    BehaviorStatistics, BehaviorTally, Frame, FrameFormat, Severity, SystemStatus,
};

// Channel state is part of the snapshot.
pub use vigil_api::ConnectionState;
pub use vigil_api::search::DEFAULT_TOP_K;
