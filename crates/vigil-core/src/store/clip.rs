// ── Warning clip reference ──

use std::time::Duration;

use chrono::{DateTime, Utc};
use url::Url;

/// How long the panel pulses after the clip is refreshed.
pub const PULSE_DURATION: Duration = Duration::from_secs(3);

/// The current warning clip: a cache-busted URL plus the time it was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningClip {
    pub url: Url,
    pub refreshed_at: DateTime<Utc>,
}

impl WarningClip {
    /// Point at `base` with a fresh `t=<millis>` cache buster.
    pub fn refreshed(base: &Url, now: DateTime<Utc>) -> Self {
        let mut url = base.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("t", &now.timestamp_millis().to_string());
        Self {
            url,
            refreshed_at: now,
        }
    }

    /// Whether the pulse cue is still active at `now`.
    pub fn is_pulsing(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.refreshed_at);
        elapsed >= chrono::Duration::zero()
            && elapsed.to_std().is_ok_and(|e| e < PULSE_DURATION)
    }
}
