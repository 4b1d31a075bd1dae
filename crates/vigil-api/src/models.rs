// Wire types for the monitoring backend.
//
// These mirror the JSON exactly as the backend sends it. `vigil-core`
// converts them into domain types; nothing here interprets the values.

use serde::{Deserialize, Serialize};

/// Status string the backend uses for successful responses.
pub const STATUS_SUCCESS: &str = "success";

// ── Alerts ──────────────────────────────────────────────────────────

/// An alert as pushed on the `/alerts` channel or returned by `GET /alerts`.
///
/// `content` is required: a payload without it is treated as malformed.
/// All other fields are optional and unknown fields are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Backend-formatted timestamp. Formats vary (ISO-8601 or localized).
    #[serde(default)]
    pub timestamp: String,

    /// Headline text.
    pub content: String,

    /// Longer free-text description.
    #[serde(default)]
    pub details: Option<String>,

    /// `"info"`, `"warning"`, `"important"`, or anything else the backend sends.
    #[serde(default)]
    pub level: Option<String>,

    /// Path or URL of the captured evidence image.
    #[serde(default)]
    pub image_url: Option<String>,

    /// All remaining fields the backend sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response body of `GET /alerts`.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsResponse {
    pub status: String,
    #[serde(default)]
    pub alerts: Vec<AlertPayload>,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Behavior report ─────────────────────────────────────────────────

/// Response body of `GET /api/behavior-data`.
#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorDataResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<BehaviorData>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorData {
    pub statistics: BehaviorStatistics,
    #[serde(default)]
    pub behaviors: Vec<BehaviorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorStatistics {
    #[serde(default)]
    pub total_behaviors: u64,
    #[serde(default)]
    pub unique_behaviors: u64,
    #[serde(default)]
    pub most_frequent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorEntry {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub timestamp: String,
}

// ── Search ──────────────────────────────────────────────────────────

/// Request body of `POST /search/`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub k: u32,
}

/// Response body of `POST /search/`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
