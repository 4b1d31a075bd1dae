// ── API-to-domain type conversions ──
//
// Bridges raw `vigil_api::models` wire types into `vigil_core::model`
// domain types. Unknown enum strings become `None` rather than errors.

use vigil_api::models::{AlertPayload, BehaviorData, BehaviorEntry};

use crate::model::{
    Alert, AlertLevel, AlertOrigin, BehaviorReport, BehaviorStatistics, BehaviorTally,
};

// ── Alerts ─────────────────────────────────────────────────────────

impl Alert {
    /// Normalize a wire alert, tagging where it came from.
    pub fn from_payload(payload: AlertPayload, origin: AlertOrigin) -> Self {
        Self {
            timestamp: payload.timestamp,
            content: payload.content,
            details: payload.details.filter(|d| !d.is_empty()),
            level: payload.level.as_deref().and_then(AlertLevel::parse),
            image_url: payload.image_url.filter(|u| !u.is_empty()),
            origin,
        }
    }
}

/// Parse one text frame from the alert channel.
pub fn parse_live_alert(raw: &str) -> Result<Alert, serde_json::Error> {
    let payload: AlertPayload = serde_json::from_str(raw)?;
    Ok(Alert::from_payload(payload, AlertOrigin::Live))
}

// ── Behavior report ────────────────────────────────────────────────

impl From<BehaviorEntry> for BehaviorTally {
    fn from(entry: BehaviorEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind,
            count: entry.count,
            timestamp: entry.timestamp,
        }
    }
}

impl From<BehaviorData> for BehaviorReport {
    fn from(data: BehaviorData) -> Self {
        Self {
            statistics: BehaviorStatistics {
                total_behaviors: data.statistics.total_behaviors,
                unique_behaviors: data.statistics.unique_behaviors,
                most_frequent: data.statistics.most_frequent.filter(|s| !s.is_empty()),
            },
            behaviors: data.behaviors.into_iter().map(BehaviorTally::from).collect(),
        }
    }
}
