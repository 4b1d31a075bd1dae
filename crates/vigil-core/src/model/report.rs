// ── Behavior analysis report ──

use serde::{Deserialize, Serialize};

use super::behavior::BehaviorCode;

/// Aggregate statistics computed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorStatistics {
    pub total_behaviors: u64,
    pub unique_behaviors: u64,
    pub most_frequent: Option<String>,
}

/// One row of the report: a behavior type and how often it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorTally {
    pub id: u64,
    /// Label as the backend reports it.
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u64,
    pub timestamp: String,
}

impl BehaviorTally {
    /// The matching local code, when the label names one.
    pub fn code(&self) -> Option<BehaviorCode> {
        u8::try_from(self.id)
            .ok()
            .and_then(BehaviorCode::from_digit)
            .filter(|code| code.label() == self.kind)
            .or_else(|| BehaviorCode::match_keyword(&self.kind))
    }
}

/// Result of the behavior analysis fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorReport {
    pub statistics: BehaviorStatistics,
    pub behaviors: Vec<BehaviorTally>,
}

impl BehaviorReport {
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Sum of row counts. Differs from `statistics.total_behaviors` only
    /// when the backend truncates the rows.
    pub fn counted(&self) -> u64 {
        self.behaviors.iter().map(|b| b.count).sum()
    }
}
