//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use vigil_core::{BehaviorReport, DashboardSnapshot, Frame, QaAnswer, SystemStatus};

use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ──
    SwitchScreen(ScreenId),
    ToggleHelp,

    // ── Live data ──
    SnapshotUpdated(Arc<DashboardSnapshot>),
    FrameReceived(Arc<Frame>),
    StatusUpdated(SystemStatus),
    /// The monitor could not be started.
    MonitorFailed(String),

    // ── Commands ──
    /// Clear behavior history and counters.
    ResetBehaviors,
    RequestReport,
    ReportLoaded(Arc<BehaviorReport>),
    ReportFailed(String),
    /// Send a question already recorded in the Q&A log under `id`.
    Ask { id: u64, question: String },
    Answered { id: u64, answer: QaAnswer },

    // ── Notifications ──
    Notify(Notification),
}
