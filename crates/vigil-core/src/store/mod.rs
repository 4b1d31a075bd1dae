// ── Dashboard state stores ──
//
// Plain owned structs mutated by the reconcile task only.

mod alerts;
mod clip;
mod history;

pub use alerts::{ALERT_CAPACITY, AlertFeed};
pub use clip::{PULSE_DURATION, WarningClip};
pub use history::{BehaviorHistory, HISTORY_CAPACITY};
