// ── Behavior classification ──
//
// Maps one inbound text message from the video channel to exactly one
// behavior code. Strategies are tried in a fixed order and the first
// match wins; anything unparseable falls through to the next strategy
// and finally to `Other`.

use serde_json::{Map, Value};

use crate::model::BehaviorCode;

const CONTENT_MARKER: &str = "检测到行为: ";
const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Classify a raw text message.
pub fn classify(raw: &str) -> BehaviorCode {
    let parsed = serde_json::from_str::<Value>(raw).ok();
    let object = parsed.as_ref().and_then(Value::as_object);

    if let Some(object) = object {
        if let Some(code) = from_details(object)
            .or_else(|| from_content(object))
            .or_else(|| from_fenced_reason(object))
        {
            return code;
        }
    }

    BehaviorCode::match_keyword(raw).unwrap_or(BehaviorCode::Other)
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

/// Keyword in the `details` field.
fn from_details(object: &Map<String, Value>) -> Option<BehaviorCode> {
    string_field(object, "details").and_then(BehaviorCode::match_keyword)
}

/// `检测到行为: <digits>` in the `content` field.
fn from_content(object: &Map<String, Value>) -> Option<BehaviorCode> {
    let content = string_field(object, "content")?;
    let digits = content.match_indices(CONTENT_MARKER).find_map(|(at, _)| {
        let rest = &content[at + CONTENT_MARKER.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })?;
    digits.parse::<u8>().ok().and_then(BehaviorCode::from_digit)
}

/// Keyword in the `reason` of a fenced JSON block inside the `data` field.
fn from_fenced_reason(object: &Map<String, Value>) -> Option<BehaviorCode> {
    let data = string_field(object, "data")?;
    if !data.contains("reason") {
        return None;
    }
    let block = first_fenced_object(data)?;
    let inner: Value = serde_json::from_str(block).ok()?;
    inner
        .get("reason")
        .and_then(Value::as_str)
        .and_then(BehaviorCode::match_keyword)
}

/// First `` ```json {…} ``` `` block, returned as the `{…}` slice. The
/// object ends at its first closing brace, so nested objects never match.
fn first_fenced_object(text: &str) -> Option<&str> {
    text.match_indices(FENCE_OPEN).find_map(|(at, _)| {
        let after = &text[at + FENCE_OPEN.len()..];
        let body = after.trim_start();
        if !body.starts_with('{') {
            return None;
        }
        let close = body.find('}')?;
        if close == 1 {
            return None;
        }
        let object = &body[..=close];
        body[close + 1..]
            .trim_start()
            .starts_with(FENCE_CLOSE)
            .then_some(object)
    })
}
