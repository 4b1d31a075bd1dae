// ── Domain model ──

pub mod alert;
pub mod behavior;
pub mod frame;
pub mod report;
pub mod status;

pub use alert::{Alert, AlertLevel, AlertOrigin, Severity};
pub use behavior::{BehaviorCode, BehaviorCounts, BehaviorEvent};
pub use frame::{Frame, FrameFormat};
pub use report::{BehaviorReport, BehaviorStatistics, BehaviorTally};
pub use status::SystemStatus;
