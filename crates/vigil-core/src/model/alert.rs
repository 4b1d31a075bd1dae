// ── Alert domain types ──

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phrase in alert content that marks an alert as important regardless
/// of its level.
pub const IMPORTANT_PHRASE: &str = "人员进行了";

/// Maximum number of characters of `details` shown in list previews.
pub const DETAILS_PREVIEW_CHARS: usize = 80;

/// Level as sent by the backend. Unknown levels map to `None` on the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Important,
}

impl AlertLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "important" => Some(Self::Important),
            _ => None,
        }
    }
}

/// Visual weight of an alert in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Important,
}

/// Where an alert entered the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertOrigin {
    /// Pushed on the live alert channel.
    Live,
    /// Part of the startup bulk fetch.
    Historical,
    /// Generated locally (channel connected, data reset).
    Notice,
}

/// A single entry in the alert feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Timestamp string exactly as the backend sent it.
    pub timestamp: String,
    pub content: String,
    pub details: Option<String>,
    pub level: Option<AlertLevel>,
    pub image_url: Option<String>,
    pub origin: AlertOrigin,
}

impl Alert {
    /// Locally generated informational entry stamped with the current time.
    pub fn notice(content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            content: content.into(),
            details: None,
            level: Some(AlertLevel::Info),
            image_url: None,
            origin: AlertOrigin::Notice,
        }
    }

    pub fn severity(&self) -> Severity {
        if self.level == Some(AlertLevel::Important) || self.content.contains(IMPORTANT_PHRASE) {
            Severity::Important
        } else if self.level == Some(AlertLevel::Warning) {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// `details` cut to [`DETAILS_PREVIEW_CHARS`] characters with an ellipsis.
    pub fn details_preview(&self) -> Option<String> {
        let details = self.details.as_deref()?;
        if details.is_empty() {
            return None;
        }
        let mut preview: String = details.chars().take(DETAILS_PREVIEW_CHARS).collect();
        preview.push('…');
        Some(preview)
    }

    /// Timestamp rendered in local time when it can be parsed, else verbatim.
    pub fn display_time(&self) -> String {
        parse_timestamp(&self.timestamp).map_or_else(
            || self.timestamp.clone(),
            |t| t.format("%Y/%m/%d %H:%M:%S").to_string(),
        )
    }
}

/// Naive formats tried after RFC 3339, in order.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y年%m月%d日%H点%M分%S秒",
    "%Y年%m月%d日%H点%M分",
];

/// Parse the timestamp formats the backend is known to emit.
///
/// Naive timestamps are interpreted as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Local));
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
    })
}
