// ── Live-event reconciliation ──
//
// `Reconciler` owns every piece of dashboard state. It is driven by a
// single task, so each inbound event or command is applied as one
// mutation with no locking, and callers observe the result only through
// immutable snapshots.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};
use url::Url;
use vigil_api::{ChannelEvent, ConnectionState};

use crate::classify::classify;
use crate::convert::parse_live_alert;
use crate::model::frame::FrameMeter;
use crate::model::{Alert, BehaviorCode, BehaviorCounts, BehaviorEvent, Frame};
use crate::store::{AlertFeed, BehaviorHistory, WarningClip};

/// Which live channel an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Video,
    Alerts,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Alerts => "alerts",
        }
    }

    /// Name shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Self::Video => "视频流",
            Self::Alerts => "预警消息",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requests handled by the reconcile task alongside channel events.
#[derive(Debug)]
pub enum Command {
    /// Clear behavior history and counters.
    Reset,
    /// The startup alert batch arrived.
    Historical(Vec<Alert>),
    /// The startup alert fetch failed.
    HistoricalFailed(String),
}

/// What applying an event changed.
#[derive(Debug)]
pub enum Applied {
    /// Store state changed; publish a new snapshot.
    Snapshot,
    /// A video frame arrived; stores are untouched.
    Frame(Arc<Frame>),
    /// Nothing changed.
    Ignored,
}

/// Immutable view of the dashboard state at one point in time.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    /// Bumped on every published change.
    pub version: u64,
    pub video: ConnectionState,
    pub alert_channel: ConnectionState,
    /// Behavior window, oldest first.
    pub history: Vec<BehaviorEvent>,
    pub counts: BehaviorCounts,
    pub current: Option<BehaviorCode>,
    /// Behaviors recorded since start. Never decreases, even on reset.
    pub behaviors_recorded: u64,
    /// Alert feed, top first.
    pub alerts: Vec<Alert>,
    pub alert_total: u64,
    /// Live alerts and notices put on top of the feed since start.
    pub alerts_pushed: u64,
    pub clip: Option<WarningClip>,
    /// Why the startup alert fetch failed, if it did.
    pub alerts_error: Option<String>,
}

impl DashboardSnapshot {
    pub fn channel(&self, kind: ChannelKind) -> ConnectionState {
        match kind {
            ChannelKind::Video => self.video,
            ChannelKind::Alerts => self.alert_channel,
        }
    }

    /// Behaviors recorded after an earlier snapshot's `behaviors_recorded`,
    /// oldest first. Arrivals that already left the window are not included.
    pub fn behaviors_since(&self, recorded: u64) -> &[BehaviorEvent] {
        let fresh = clamp_delta(self.behaviors_recorded, recorded, self.history.len());
        &self.history[self.history.len() - fresh..]
    }

    /// Live alerts and notices pushed after an earlier snapshot's
    /// `alerts_pushed`, top first.
    pub fn alerts_since(&self, pushed: u64) -> &[Alert] {
        &self.alerts[..clamp_delta(self.alerts_pushed, pushed, self.alerts.len())]
    }
}

fn clamp_delta(now: u64, then: u64, len: usize) -> usize {
    usize::try_from(now.saturating_sub(then))
        .unwrap_or(usize::MAX)
        .min(len)
}

/// Owner of all dashboard state.
pub struct Reconciler {
    history: BehaviorHistory,
    alerts: AlertFeed,
    clip: Option<WarningClip>,
    clip_base: Url,
    video: ConnectionState,
    alert_channel: ConnectionState,
    frames: FrameMeter,
    alerts_error: Option<String>,
    version: u64,
}

impl Reconciler {
    /// `clip_base` is the warning clip URL without a cache buster.
    pub fn new(clip_base: Url) -> Self {
        Self {
            history: BehaviorHistory::new(),
            alerts: AlertFeed::new(),
            clip: None,
            clip_base,
            video: ConnectionState::Connecting,
            alert_channel: ConnectionState::Connecting,
            frames: FrameMeter::default(),
            alerts_error: None,
            version: 0,
        }
    }

    /// Apply one event from a live channel.
    pub fn apply(&mut self, source: ChannelKind, event: ChannelEvent) -> Applied {
        match (source, event) {
            (_, ChannelEvent::State(state)) => self.set_channel_state(source, state),
            (ChannelKind::Video, ChannelEvent::Binary(data)) => {
                Applied::Frame(Arc::new(self.frames.observe(data, Instant::now())))
            }
            (ChannelKind::Video, ChannelEvent::Text(text)) => {
                let code = classify(&text);
                debug!(code = code.name(), "behavior classified");
                self.history.record(code);
                self.changed()
            }
            (ChannelKind::Alerts, ChannelEvent::Text(text)) => match parse_live_alert(&text) {
                Ok(alert) => {
                    debug!(severity = ?alert.severity(), "live alert");
                    if alert.has_image() {
                        self.refresh_clip();
                    }
                    self.alerts.record_live(alert);
                    self.changed()
                }
                Err(e) => {
                    debug!(error = %e, "dropping unparseable alert frame");
                    Applied::Ignored
                }
            },
            (ChannelKind::Alerts, ChannelEvent::Binary(data)) => {
                debug!(bytes = data.len(), "ignoring binary frame on alert channel");
                Applied::Ignored
            }
        }
    }

    /// Apply one command.
    pub fn apply_command(&mut self, command: Command) -> Applied {
        match command {
            Command::Reset => {
                self.history.reset();
                self.alerts.record_notice(Alert::notice("数据已重置"));
                info!("behavior data reset");
                self.changed()
            }
            Command::Historical(alerts) => {
                if alerts.is_empty() {
                    debug!("historical alert batch is empty");
                    return Applied::Ignored;
                }
                info!(count = alerts.len(), "loaded historical alerts");
                self.alerts.record_historical(alerts);
                self.refresh_clip();
                self.alerts_error = None;
                self.changed()
            }
            Command::HistoricalFailed(reason) => {
                self.alerts_error = Some(reason);
                self.changed()
            }
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            version: self.version,
            video: self.video,
            alert_channel: self.alert_channel,
            history: self.history.events().copied().collect(),
            counts: *self.history.counts(),
            current: self.history.current(),
            behaviors_recorded: self.history.recorded(),
            alerts: self.alerts.entries().cloned().collect(),
            alert_total: self.alerts.total(),
            alerts_pushed: self.alerts.pushed(),
            clip: self.clip.clone(),
            alerts_error: self.alerts_error.clone(),
        }
    }

    fn set_channel_state(&mut self, source: ChannelKind, state: ConnectionState) -> Applied {
        let slot = match source {
            ChannelKind::Video => &mut self.video,
            ChannelKind::Alerts => &mut self.alert_channel,
        };
        if *slot == state {
            return Applied::Ignored;
        }
        *slot = state;
        info!(channel = %source, %state, "channel state");

        if state == ConnectionState::Open {
            self.alerts
                .record_notice(Alert::notice(format!("{}已连接", source.label())));
        }
        self.changed()
    }

    fn refresh_clip(&mut self) {
        self.clip = Some(WarningClip::refreshed(&self.clip_base, Utc::now()));
    }

    fn changed(&mut self) -> Applied {
        self.version += 1;
        Applied::Snapshot
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AlertLevel, AlertOrigin};
    use crate::store::{ALERT_CAPACITY, HISTORY_CAPACITY};
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    fn reconciler() -> Reconciler {
        Reconciler::new(Url::parse("http://10.0.0.5:8000/video_warning/output.mp4").unwrap())
    }

    fn historical(content: &str) -> Alert {
        Alert {
            timestamp: "2025-03-28 20:10:00".into(),
            content: content.into(),
            details: None,
            level: Some(AlertLevel::Info),
            image_url: None,
            origin: AlertOrigin::Historical,
        }
    }

    fn live(content: &str) -> ChannelEvent {
        ChannelEvent::Text(serde_json::json!({ "content": content, "level": "warning" }).to_string())
    }

    #[test]
    fn video_text_is_classified_and_recorded() {
        let mut r = reconciler();
        let applied = r.apply(
            ChannelKind::Video,
            ChannelEvent::Text(r#"{"details":"检测到用户在睡觉"}"#.into()),
        );
        assert!(matches!(applied, Applied::Snapshot));

        let snap = r.snapshot();
        assert_eq!(snap.current, Some(BehaviorCode::Sleeping));
        assert_eq!(snap.counts.get(BehaviorCode::Sleeping), 1);
        assert_eq!(snap.history.len(), 1);
        assert_eq!(snap.version, 1);
    }

    #[test]
    fn unmatched_video_text_records_other() {
        let mut r = reconciler();
        r.apply(ChannelKind::Video, ChannelEvent::Text("garbage".into()));
        assert_eq!(r.snapshot().counts.get(BehaviorCode::Other), 1);
    }

    #[test]
    fn frames_bypass_the_stores() {
        let mut r = reconciler();
        let applied = r.apply(
            ChannelKind::Video,
            ChannelEvent::Binary(Bytes::from_static(&[0xFF, 0xD8, 0xFF])),
        );
        let Applied::Frame(frame) = applied else {
            panic!("expected a frame");
        };
        assert_eq!(frame.seq, 1);
        assert_eq!(r.snapshot().version, 0);
    }

    #[test]
    fn history_window_is_bounded() {
        let mut r = reconciler();
        for _ in 0..40 {
            r.apply(ChannelKind::Video, ChannelEvent::Text("在喝水".into()));
        }
        let snap = r.snapshot();
        assert_eq!(snap.history.len(), HISTORY_CAPACITY);
        assert_eq!(snap.counts.get(BehaviorCode::DrinkingWater), 40);
    }

    #[test]
    fn historical_then_live_ordering_and_total() {
        let mut r = reconciler();
        r.apply_command(Command::Historical(vec![historical("h1"), historical("h2")]));
        r.apply(ChannelKind::Alerts, live("l1"));
        r.apply(ChannelKind::Alerts, live("l2"));

        let snap = r.snapshot();
        let contents: Vec<_> = snap.alerts.iter().map(|a| a.content.as_str()).collect();
        assert_eq!(contents, ["l2", "l1", "h1", "h2"]);
        assert_eq!(snap.alert_total, 4);
        // A non-empty batch refreshes the clip.
        assert!(snap.clip.is_some());
    }

    #[test]
    fn empty_historical_batch_changes_nothing() {
        let mut r = reconciler();
        assert!(matches!(
            r.apply_command(Command::Historical(Vec::new())),
            Applied::Ignored
        ));
        let snap = r.snapshot();
        assert!(snap.clip.is_none());
        assert_eq!(snap.alert_total, 0);
    }

    #[test]
    fn alert_with_image_refreshes_clip() {
        let mut r = reconciler();
        r.apply(ChannelKind::Alerts, live("no image"));
        assert!(r.snapshot().clip.is_none());

        r.apply(
            ChannelKind::Alerts,
            ChannelEvent::Text(
                serde_json::json!({"content": "x", "image_url": "/video_warning/a.jpg"})
                    .to_string(),
            ),
        );
        let clip = r.snapshot().clip.unwrap();
        assert!(clip.url.as_str().contains("output.mp4?t="));
        assert!(clip.is_pulsing(Utc::now()));
    }

    #[test]
    fn malformed_alert_is_dropped() {
        let mut r = reconciler();
        assert!(matches!(
            r.apply(ChannelKind::Alerts, ChannelEvent::Text("{oops".into())),
            Applied::Ignored
        ));
        assert!(r.snapshot().alerts.is_empty());
    }

    #[test]
    fn alert_feed_is_bounded() {
        let mut r = reconciler();
        for i in 0..30 {
            r.apply(ChannelKind::Alerts, live(&format!("l{i}")));
        }
        let snap = r.snapshot();
        assert_eq!(snap.alerts.len(), ALERT_CAPACITY);
        assert_eq!(snap.alert_total, 30);
        assert_eq!(snap.alerts[0].content, "l29");
    }

    #[test]
    fn reset_clears_behavior_state_only() {
        let mut r = reconciler();
        r.apply(ChannelKind::Video, ChannelEvent::Text("玩手机".into()));
        r.apply(ChannelKind::Alerts, live("l1"));

        r.apply_command(Command::Reset);

        let snap = r.snapshot();
        assert!(snap.history.is_empty());
        assert!(snap.counts.is_empty());
        assert_eq!(snap.current, None);
        assert_eq!(snap.alert_total, 1);
        assert_eq!(snap.alerts[0].origin, AlertOrigin::Notice);
    }

    #[test]
    fn open_channel_posts_notice_once() {
        let mut r = reconciler();
        r.apply(ChannelKind::Video, ChannelEvent::State(ConnectionState::Connecting));
        r.apply(ChannelKind::Video, ChannelEvent::State(ConnectionState::Open));
        assert!(matches!(
            r.apply(ChannelKind::Video, ChannelEvent::State(ConnectionState::Open)),
            Applied::Ignored
        ));

        let snap = r.snapshot();
        assert_eq!(snap.video, ConnectionState::Open);
        assert_eq!(snap.alert_channel, ConnectionState::Connecting);
        assert_eq!(snap.alerts.len(), 1);
        assert_eq!(snap.alerts[0].content, "视频流已连接");
        assert_eq!(snap.alert_total, 0);
    }

    #[test]
    fn running_counters_track_every_arrival() {
        let mut r = reconciler();
        for _ in 0..35 {
            r.apply(ChannelKind::Video, ChannelEvent::Text("在吃东西".into()));
        }
        r.apply(ChannelKind::Alerts, live("检测到人员进行了抽烟"));
        r.apply(ChannelKind::Alerts, live("检测到人员进行了抽烟"));
        r.apply_command(Command::Reset);

        let snap = r.snapshot();
        assert_eq!(snap.behaviors_recorded, 35);
        assert!(snap.history.is_empty());
        // two live alerts plus the reset notice
        assert_eq!(snap.alerts_pushed, 3);
    }

    #[test]
    fn since_helpers_slice_the_new_entries() {
        let mut r = reconciler();
        r.apply(ChannelKind::Video, ChannelEvent::Text("在喝水".into()));
        r.apply(ChannelKind::Alerts, live("a"));
        let before = r.snapshot();

        r.apply(ChannelKind::Video, ChannelEvent::Text("在睡觉".into()));
        r.apply(ChannelKind::Alerts, live("a"));
        r.apply_command(Command::Historical(vec![historical("h1")]));
        let after = r.snapshot();

        let behaviors = after.behaviors_since(before.behaviors_recorded);
        assert_eq!(behaviors.len(), 1);
        assert_eq!(behaviors[0].code, BehaviorCode::Sleeping);

        let alerts = after.alerts_since(before.alerts_pushed);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].content, "a");
        assert_eq!(alerts[0].origin, AlertOrigin::Live);

        assert!(after.alerts_since(after.alerts_pushed).is_empty());
    }

    #[test]
    fn historical_failure_is_reported() {
        let mut r = reconciler();
        r.apply_command(Command::HistoricalFailed("connection refused".into()));
        assert_eq!(r.snapshot().alerts_error.as_deref(), Some("connection refused"));
    }
}
