// Text helpers for terminal output.

use chrono::{DateTime, TimeZone, Utc};

/// Shorten `input` to at most `width` characters, marking the cut with `…`.
pub fn truncate(input: &str, width: usize) -> String {
    if input.chars().count() <= width {
        return input.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = input.chars().take(width - 1).collect();
    out.push('…');
    out
}

/// Human-friendly age of a unix timestamp, relative to `now`.
pub fn relative_date(unix_time: i64, now: DateTime<Utc>) -> String {
    let Some(then) = Utc.timestamp_opt(unix_time, 0).single() else {
        return "at an unknown time".to_string();
    };

    let since = now.signed_duration_since(then);
    let seconds = since.num_seconds();
    if seconds < 0 {
        return "from the future!".to_string();
    }

    match since.num_days() {
        0 => match seconds {
            0..=59 => "few seconds ago".to_string(),
            60..=119 => "a minute ago".to_string(),
            120..=3599 => format!("{} minutes ago", seconds / 60),
            3600..=7199 => "an hour ago".to_string(),
            _ => format!("{} hours ago", seconds / 3600),
        },
        1 => "yesterday".to_string(),
        days @ 2..=6 => format!("{days} days ago"),
        days @ 7..=30 => plural(days / 7, "week"),
        days @ 31..=364 => plural(days / 30, "month"),
        days => plural(days / 365, "year"),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("a {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
