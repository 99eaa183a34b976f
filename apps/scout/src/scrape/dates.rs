use chrono::{Duration, NaiveDate};
use tracing::debug;

/// Stored when a listing card carries no posting-date element at all.
pub const DATE_NOT_AVAILABLE: &str = "Not available";

/// Turns the board's relative posting text into an ISO date.
///
/// "Posted 3 days ago" → today − 3, "Just posted" / "Today" → today. Anything else,
/// including a day count that falls outside the calendar range, falls back to today;
/// that fallback is logged but never surfaces as an error.
pub fn normalize_posting_date(text: &str, today: NaiveDate) -> String {
    let date = match days_ago(text) {
        Some(days) => match Duration::try_days(days).and_then(|d| today.checked_sub_signed(d)) {
            Some(date) => date,
            None => {
                debug!("Posting date {text:?} is out of range; defaulting to today");
                today
            }
        },
        None => {
            let lower = text.to_lowercase();
            if !(lower.contains("just posted") || lower.contains("today")) {
                debug!("Unrecognised posting date {text:?}; defaulting to today");
            }
            today
        }
    };
    date.format("%Y-%m-%d").to_string()
}

/// First whitespace-separated number in the text.
///
/// "30+" (the board's cap) counts as 30 days, not as unparseable text.
fn days_ago(text: &str) -> Option<i64> {
    text.split_whitespace()
        .map(|token| token.trim_end_matches('+'))
        .find(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}
