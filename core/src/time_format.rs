use chrono::DateTime;
use chrono::Utc;

/// `Jan 5, 2025, 03:04 PM`.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// Age of `at` relative to `now`: "just now", "5m ago", "3h ago", "2d ago",
/// then a calendar date once a week has passed.
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds();
    match seconds {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 604_800 => format!("{}d ago", s / 86_400),
        _ => format_date(at),
    }
}
