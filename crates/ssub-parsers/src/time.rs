//! Duration parsing and formatting for throttle deadlines and progress messages.

use std::time::Duration;

/// Parse a duration in Slurm-like formats.
///
/// Supports:
/// - D-HH:MM:SS
/// - HH:MM:SS
/// - MM:SS
/// - Seconds as integer
///
/// Returns None for empty or malformed strings.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (days, time_part) = match s.split_once('-') {
        Some((days, rest)) => (days.parse::<u64>().ok()?, rest),
        None => (0, s),
    };

    let time_parts = time_part
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;

    let (h, m, s) = match time_parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        [s] => (0, 0, *s),
        _ => return None,
    };

    let seconds = days
        .checked_mul(86400)?
        .checked_add(h.checked_mul(3600)?)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)?;
    Some(Duration::from_secs(seconds))
}

/// Format a duration for humans (e.g., "1d 02:30:00", "01:30:00", "05:30").
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours >= 24 {
        format!("{}d {:02}:{:02}:{:02}", hours / 24, hours % 24, mins, secs)
    } else if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}
