// ── Behavior history ──
//
// FIFO window of the most recent classified behaviors plus running
// per-code counters. Counters only go down through `reset`, which
// clears both halves together.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::model::{BehaviorCode, BehaviorCounts, BehaviorEvent};

/// Number of events kept for the timeline.
pub const HISTORY_CAPACITY: usize = 30;

#[derive(Debug, Clone, Default)]
pub struct BehaviorHistory {
    events: VecDeque<BehaviorEvent>,
    counts: BehaviorCounts,
    /// Events recorded since creation. Survives `reset`.
    recorded: u64,
}

impl BehaviorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `code` as observed now.
    pub fn record(&mut self, code: BehaviorCode) -> BehaviorEvent {
        self.record_at(code, Utc::now())
    }

    pub fn record_at(&mut self, code: BehaviorCode, observed_at: DateTime<Utc>) -> BehaviorEvent {
        let event = BehaviorEvent { code, observed_at };
        self.events.push_back(event);
        while self.events.len() > HISTORY_CAPACITY {
            self.events.pop_front();
        }
        self.counts.increment(code);
        self.recorded += 1;
        event
    }

    /// Zero all counters and clear the window.
    pub fn reset(&mut self) {
        self.events.clear();
        self.counts = BehaviorCounts::default();
    }

    /// Most recent code, the "current behavior".
    pub fn current(&self) -> Option<BehaviorCode> {
        self.events.back().map(|e| e.code)
    }

    /// Events oldest first.
    pub fn events(&self) -> impl ExactSizeIterator<Item = &BehaviorEvent> {
        self.events.iter()
    }

    pub fn counts(&self) -> &BehaviorCounts {
        &self.counts
    }

    /// Running number of recorded events, including those that have left
    /// the window or were cleared by a reset.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use strum::IntoEnumIterator;

    #[test]
    fn window_keeps_most_recent_events() {
        let mut history = BehaviorHistory::new();
        let start = Utc::now();
        let codes: Vec<_> = BehaviorCode::iter().cycle().take(45).collect();

        for (i, code) in codes.iter().enumerate() {
            history.record_at(*code, start + Duration::seconds(i64::try_from(i).unwrap()));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        let kept: Vec<_> = history.events().map(|e| e.code).collect();
        assert_eq!(kept, codes[45 - HISTORY_CAPACITY..]);
        assert_eq!(history.current(), codes.last().copied());
    }

    #[test]
    fn short_sequences_are_kept_whole() {
        let mut history = BehaviorHistory::new();
        for _ in 0..5 {
            history.record(BehaviorCode::Eating);
        }
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn counters_are_not_bounded_by_the_window() {
        let mut history = BehaviorHistory::new();
        for _ in 0..100 {
            history.record(BehaviorCode::PhoneUse);
        }
        assert_eq!(history.counts().get(BehaviorCode::PhoneUse), 100);
        assert_eq!(history.counts().get(BehaviorCode::Sleeping), 0);
    }

    #[test]
    fn reset_clears_events_and_counters_together() {
        let mut history = BehaviorHistory::new();
        history.record(BehaviorCode::Sleeping);
        history.record(BehaviorCode::Other);

        history.reset();

        assert!(history.is_empty());
        assert!(history.counts().is_empty());
        assert_eq!(history.current(), None);

        history.record(BehaviorCode::Eating);
        assert_eq!(history.counts().total(), 1);
    }

    #[test]
    fn recorded_keeps_running_past_window_and_reset() {
        let mut history = BehaviorHistory::new();
        for _ in 0..40 {
            history.record(BehaviorCode::Other);
        }
        assert_eq!(history.recorded(), 40);

        history.reset();
        history.record(BehaviorCode::Eating);
        assert_eq!(history.recorded(), 41);
        assert_eq!(history.len(), 1);
    }
}
