//! Common utilities and helper functions
//!
//! Time-of-day formatting and KST helpers shared across the application.

pub mod error;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Korea Standard Time (UTC+9), the reservation service's reference zone
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("UTC+9 is a valid offset")
}

/// Current instant expressed in KST
pub fn now_kst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

/// Convert `HH:MM`, `HHMM` or `HMM` into the canonical 4-digit `HHMM` form
///
/// Returns `None` for anything that is not 3 or 4 digits once colons and
/// surrounding whitespace are removed.
pub fn to_api_time(time: &str) -> Option<String> {
    static TIME_RE: OnceLock<Regex> = OnceLock::new();

    let re = TIME_RE.get_or_init(|| Regex::new(r"^\d{3,4}$").expect("Invalid regex pattern"));

    let compact = time.trim().replace(':', "");
    if !re.is_match(&compact) {
        return None;
    }

    Some(format!("{compact:0>4}"))
}

/// Convert a canonical `HHMM` time into `HH:MM` for display
///
/// Values that are not 4 digits are returned unchanged.
pub fn to_display_time(time: &str) -> String {
    let compact = time.trim().replace(':', "");
    if compact.len() == 4 && compact.chars().all(|c| c.is_ascii_digit()) {
        format!("{}:{}", &compact[..2], &compact[2..])
    } else {
        time.trim().to_string()
    }
}

/// Format an instant the way the service logs and payloads expect it
/// (`HH:MM:SS.mmm` in KST)
pub fn format_clock(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&kst()).format("%H:%M:%S%.3f").to_string()
}

/// Render a JSON string or number as text; other values yield `None`
pub fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
