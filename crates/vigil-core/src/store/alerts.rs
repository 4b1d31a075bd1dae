// ── Alert feed ──
//
// Newest-first list of alerts, bounded to the most recent entries.
// Live alerts go on top, the startup batch is appended below them.

use std::collections::VecDeque;

use crate::model::Alert;

/// Number of alerts kept in the feed.
pub const ALERT_CAPACITY: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct AlertFeed {
    entries: VecDeque<Alert>,
    total: u64,
    /// Live alerts and notices ever prepended.
    pushed: u64,
}

impl AlertFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a live alert and count it.
    pub fn record_live(&mut self, alert: Alert) {
        self.push_front(alert);
        self.total += 1;
    }

    /// Append the startup batch in received order. The total becomes the
    /// batch length.
    pub fn record_historical(&mut self, alerts: Vec<Alert>) {
        self.total = u64::try_from(alerts.len()).unwrap_or(u64::MAX);
        self.entries.extend(alerts);
        self.entries.truncate(ALERT_CAPACITY);
    }

    /// Prepend a locally generated entry without counting it.
    pub fn record_notice(&mut self, alert: Alert) {
        self.push_front(alert);
    }

    fn push_front(&mut self, alert: Alert) {
        self.entries.push_front(alert);
        self.entries.truncate(ALERT_CAPACITY);
        self.pushed += 1;
    }

    /// Visible entries, top of the feed first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &Alert> {
        self.entries.iter()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Running number of entries put on top of the feed. The newest
    /// `pushed` delta entries are always the leading ones.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
