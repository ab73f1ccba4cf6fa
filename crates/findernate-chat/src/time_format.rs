use chrono::{DateTime, Datelike, Utc};

/// Compact timestamp for the chat list, relative to `now`.
pub fn format_chat_timestamp(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(ts);

    if elapsed.num_seconds() < 60 {
        return "Just now".to_string();
    }
    if elapsed.num_minutes() < 60 {
        return format!("{}m", elapsed.num_minutes());
    }
    if elapsed.num_hours() < 24 {
        return format!("{}h", elapsed.num_hours());
    }

    let days = (now.date_naive() - ts.date_naive()).num_days();
    match days {
        1 => "Yesterday".to_string(),
        2..=6 => ts.format("%A").to_string(),
        _ if ts.year() == now.year() => ts.format("%b %d").to_string(),
        _ => ts.format("%b %d, %Y").to_string(),
    }
}
