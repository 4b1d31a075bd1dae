//! Headless live view: connect both channels and print what changes.
//!
//! Each published snapshot is compared with the previous one and the
//! difference is emitted as line events. JSON formats print one object
//! per line.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use vigil_core::{
    Alert, AlertOrigin, BehaviorCode, ChannelKind, DashboardSnapshot, Monitor, Severity,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WatchEvent {
    Channel {
        channel: &'static str,
        state: String,
    },
    Behavior {
        code: BehaviorCode,
        label: &'static str,
        observed_at: DateTime<Utc>,
    },
    Alert {
        severity: Severity,
        #[serde(flatten)]
        alert: Alert,
    },
    Historical {
        loaded: usize,
        total: u64,
    },
    HistoricalFailed {
        reason: String,
    },
}

impl WatchEvent {
    /// Behavior and alert events count towards `--count`.
    fn is_counted(&self) -> bool {
        matches!(self, Self::Behavior { .. } | Self::Alert { .. })
    }
}

// ── Snapshot diff ───────────────────────────────────────────────────

fn diff(prev: &DashboardSnapshot, next: &DashboardSnapshot) -> Vec<WatchEvent> {
    let mut events = Vec::new();

    for kind in [ChannelKind::Video, ChannelKind::Alerts] {
        let state = next.channel(kind);
        if prev.channel(kind) != state {
            events.push(WatchEvent::Channel {
                channel: kind.as_str(),
                state: state.to_string(),
            });
        }
    }

    events.extend(
        next.behaviors_since(prev.behaviors_recorded)
            .iter()
            .map(|e| WatchEvent::Behavior {
                code: e.code,
                label: e.code.label(),
                observed_at: e.observed_at,
            }),
    );

    // Oldest arrival first; notices are local and not reported.
    events.extend(
        next.alerts_since(prev.alerts_pushed)
            .iter()
            .rev()
            .filter(|a| a.origin == AlertOrigin::Live)
            .map(|a| WatchEvent::Alert {
                severity: a.severity(),
                alert: a.clone(),
            }),
    );

    let historical = |s: &DashboardSnapshot| {
        s.alerts
            .iter()
            .filter(|a| a.origin == AlertOrigin::Historical)
            .count()
    };
    let loaded = historical(next);
    if historical(prev) == 0 && loaded > 0 {
        events.push(WatchEvent::Historical {
            loaded,
            total: next.alert_total,
        });
    }

    if let (None, Some(reason)) = (&prev.alerts_error, &next.alerts_error) {
        events.push(WatchEvent::HistoricalFailed {
            reason: reason.clone(),
        });
    }

    events
}

// ── Rendering ───────────────────────────────────────────────────────

fn render_line(event: &WatchEvent, color: bool) -> String {
    match event {
        WatchEvent::Channel { channel, state } => {
            format!("[{}] {channel:<9} {state}", Local::now().format("%H:%M:%S"))
        }
        WatchEvent::Behavior {
            code, observed_at, ..
        } => format!(
            "[{}] behavior  {}",
            observed_at.with_timezone(&Local).format("%H:%M:%S"),
            output::paint_behavior(*code, color)
        ),
        WatchEvent::Alert { severity, alert } => {
            let mut line = format!(
                "[{}] alert     {}",
                alert.display_time(),
                output::paint_severity(*severity, &alert.content, color)
            );
            if let Some(details) = alert.details_preview() {
                line.push_str(" | ");
                line.push_str(&details);
            }
            line
        }
        WatchEvent::Historical { loaded, total } => {
            format!("loaded {loaded} stored alerts ({total} total)")
        }
        WatchEvent::HistoricalFailed { reason } => {
            format!("failed to load stored alerts: {reason}")
        }
    }
}

fn render(event: &WatchEvent, format: &OutputFormat, color: bool) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_line(event, color)),
        OutputFormat::Plain => Ok(render_line(event, false)),
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(event, true),
        OutputFormat::Yaml => Ok(format!("---\n{}", serde_yaml::to_string(event)?)),
    }
}

const BELL: char = '\x07';

/// Live alerts ring the bell when asked to, and only on human output.
fn rings_bell(event: &WatchEvent, bell: bool, format: &OutputFormat) -> bool {
    bell && matches!(format, OutputFormat::Table) && matches!(event, WatchEvent::Alert { .. })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &Monitor,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut snapshots = monitor.subscribe();
    monitor.start().await?;
    tracing::info!(server = %monitor.config().server, "watching live channels");

    let result = stream_events(&mut snapshots, args, global).await;
    monitor.shutdown().await;
    result
}

async fn stream_events(
    snapshots: &mut vigil_core::SnapshotStream,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let limit = args.count;
    let color = output::should_color(&global.color);
    let mut prev = snapshots.current().clone();
    let mut seen: u64 = 0;

    loop {
        if limit.is_some_and(|n| seen >= n) {
            return Ok(());
        }
        let next = tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            next = snapshots.changed() => next,
        };
        let Some(next) = next else {
            return Ok(());
        };

        for event in diff(&prev, &next) {
            if event.is_counted() {
                seen += 1;
            }
            let mut line = render(&event, &global.output, color)?;
            if rings_bell(&event, args.bell, &global.output) {
                line.insert(0, BELL);
            }
            output::print_output(&line, global.quiet);
            if limit.is_some_and(|n| seen >= n) {
                return Ok(());
            }
        }
        prev = next;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use vigil_core::{AlertLevel, BehaviorEvent, ConnectionState};

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 28, 20, 10, secs).unwrap()
    }

    fn alert(content: &str, origin: AlertOrigin) -> Alert {
        Alert {
            timestamp: "2025-03-28 20:10:00".into(),
            content: content.into(),
            details: None,
            level: Some(AlertLevel::Warning),
            image_url: None,
            origin,
        }
    }

    fn event(code: BehaviorCode, secs: u32) -> BehaviorEvent {
        BehaviorEvent {
            code,
            observed_at: at(secs),
        }
    }

    fn behavior_codes(events: &[WatchEvent]) -> Vec<BehaviorCode> {
        events
            .iter()
            .filter_map(|e| match e {
                WatchEvent::Behavior { code, .. } => Some(*code),
                _ => None,
            })
            .collect()
    }

    fn alert_contents(events: &[WatchEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                WatchEvent::Alert { alert, .. } => Some(alert.content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn channel_transitions_are_reported() {
        let prev = DashboardSnapshot::default();
        let next = DashboardSnapshot {
            video: ConnectionState::Open,
            ..DashboardSnapshot::default()
        };
        assert_eq!(
            diff(&prev, &next),
            vec![WatchEvent::Channel {
                channel: "video",
                state: ConnectionState::Open.to_string(),
            }]
        );
    }

    #[test]
    fn only_new_behaviors_are_reported() {
        let prev = DashboardSnapshot {
            history: vec![event(BehaviorCode::Eating, 1)],
            behaviors_recorded: 1,
            ..DashboardSnapshot::default()
        };
        let next = DashboardSnapshot {
            history: vec![
                event(BehaviorCode::Eating, 1),
                event(BehaviorCode::Sleeping, 2),
                event(BehaviorCode::Other, 3),
            ],
            behaviors_recorded: 3,
            ..DashboardSnapshot::default()
        };
        assert_eq!(
            behavior_codes(&diff(&prev, &next)),
            vec![BehaviorCode::Sleeping, BehaviorCode::Other]
        );
    }

    #[test]
    fn behavior_stamped_at_same_instant_is_reported() {
        let prev = DashboardSnapshot {
            history: vec![event(BehaviorCode::Eating, 1)],
            behaviors_recorded: 1,
            ..DashboardSnapshot::default()
        };
        let next = DashboardSnapshot {
            history: vec![event(BehaviorCode::Eating, 1), event(BehaviorCode::Sleeping, 1)],
            behaviors_recorded: 2,
            ..DashboardSnapshot::default()
        };
        assert_eq!(
            behavior_codes(&diff(&prev, &next)),
            vec![BehaviorCode::Sleeping]
        );
    }

    #[test]
    fn coalesced_burst_reports_whole_window() {
        let prev = DashboardSnapshot {
            history: vec![event(BehaviorCode::Eating, 0)],
            behaviors_recorded: 1,
            ..DashboardSnapshot::default()
        };
        // 40 arrivals between two notifications; only the last 30 survive.
        let next = DashboardSnapshot {
            history: (0..30).map(|i| event(BehaviorCode::PhoneUse, i)).collect(),
            behaviors_recorded: 41,
            ..DashboardSnapshot::default()
        };
        assert_eq!(behavior_codes(&diff(&prev, &next)).len(), 30);
    }

    #[test]
    fn events_after_reset_are_reported() {
        let prev = DashboardSnapshot {
            history: vec![event(BehaviorCode::Eating, 1), event(BehaviorCode::Eating, 2)],
            behaviors_recorded: 2,
            ..DashboardSnapshot::default()
        };
        let next = DashboardSnapshot {
            history: vec![event(BehaviorCode::Sleeping, 3)],
            behaviors_recorded: 3,
            ..DashboardSnapshot::default()
        };
        assert_eq!(
            behavior_codes(&diff(&prev, &next)),
            vec![BehaviorCode::Sleeping]
        );
    }

    #[test]
    fn new_live_alerts_in_arrival_order_without_notices() {
        let old = alert("old", AlertOrigin::Live);
        let prev = DashboardSnapshot {
            alerts: vec![old.clone()],
            alerts_pushed: 1,
            ..DashboardSnapshot::default()
        };
        let next = DashboardSnapshot {
            alerts: vec![
                alert("second", AlertOrigin::Live),
                Alert::notice("预警消息已连接"),
                alert("first", AlertOrigin::Live),
                old,
            ],
            alerts_pushed: 4,
            ..DashboardSnapshot::default()
        };
        assert_eq!(alert_contents(&diff(&prev, &next)), vec!["first", "second"]);
    }

    #[test]
    fn repeated_identical_alert_is_reported() {
        let smoking = alert("检测到人员进行了抽烟", AlertOrigin::Live);
        let prev = DashboardSnapshot {
            alerts: vec![smoking.clone()],
            alert_total: 1,
            alerts_pushed: 1,
            ..DashboardSnapshot::default()
        };
        let next = DashboardSnapshot {
            alerts: vec![smoking.clone(), smoking],
            alert_total: 2,
            alerts_pushed: 2,
            ..DashboardSnapshot::default()
        };
        assert_eq!(
            alert_contents(&diff(&prev, &next)),
            vec!["检测到人员进行了抽烟"]
        );
    }

    #[test]
    fn historical_batch_below_live_alerts_is_not_live() {
        let live = alert("l1", AlertOrigin::Live);
        let prev = DashboardSnapshot {
            alerts: vec![live.clone()],
            alerts_pushed: 1,
            ..DashboardSnapshot::default()
        };
        let next = DashboardSnapshot {
            alerts: vec![live, alert("h1", AlertOrigin::Historical)],
            alerts_pushed: 1,
            ..DashboardSnapshot::default()
        };
        assert!(alert_contents(&diff(&prev, &next)).is_empty());
    }

    #[test]
    fn historical_batch_is_summarized_once() {
        let prev = DashboardSnapshot::default();
        let next = DashboardSnapshot {
            alerts: vec![
                alert("a", AlertOrigin::Historical),
                alert("b", AlertOrigin::Historical),
            ],
            alert_total: 2,
            ..DashboardSnapshot::default()
        };
        assert_eq!(
            diff(&prev, &next),
            vec![WatchEvent::Historical {
                loaded: 2,
                total: 2
            }]
        );
        assert!(diff(&next, &next).is_empty());
    }

    #[test]
    fn historical_failure_is_reported() {
        let next = DashboardSnapshot {
            alerts_error: Some("数据库不可用".into()),
            ..DashboardSnapshot::default()
        };
        assert_eq!(
            diff(&DashboardSnapshot::default(), &next),
            vec![WatchEvent::HistoricalFailed {
                reason: "数据库不可用".into()
            }]
        );
    }

    #[test]
    fn json_lines_are_tagged() {
        let event = WatchEvent::Behavior {
            code: BehaviorCode::PhoneUse,
            label: BehaviorCode::PhoneUse.label(),
            observed_at: at(0),
        };
        let line = render(&event, &OutputFormat::Json, false).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "behavior");
        assert_eq!(value["label"], "玩手机");
    }

    #[test]
    fn plain_alert_line_includes_details() {
        let mut a = alert("检测到人员进行了抽烟", AlertOrigin::Live);
        a.details = Some("吸烟".into());
        let event = WatchEvent::Alert {
            severity: a.severity(),
            alert: a,
        };
        let line = render(&event, &OutputFormat::Plain, true).unwrap();
        assert!(line.ends_with("检测到人员进行了抽烟 | 吸烟…"));
        assert!(line.contains("2025/03/28 20:10:00"));
    }

    #[test]
    fn bell_rings_only_for_alerts_in_table_output() {
        let alert_event = WatchEvent::Alert {
            severity: Severity::Important,
            alert: alert("x", AlertOrigin::Live),
        };
        let behavior = WatchEvent::Behavior {
            code: BehaviorCode::Other,
            label: BehaviorCode::Other.label(),
            observed_at: at(0),
        };
        assert!(rings_bell(&alert_event, true, &OutputFormat::Table));
        assert!(!rings_bell(&alert_event, false, &OutputFormat::Table));
        assert!(!rings_bell(&alert_event, true, &OutputFormat::Json));
        assert!(!rings_bell(&behavior, true, &OutputFormat::Table));
    }
}
