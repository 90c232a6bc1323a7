// SPDX-License-Identifier: MIT

//! Shared helpers for date and duration formatting.

use chrono::NaiveDate;

/// Format a calendar day as its storage key (`YYYY-MM-DD`).
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Format minutes as a compact hours/minutes string ("45m", "2h", "2h 30m").
pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours == 0 {
        return format!("{}m", mins);
    }
    if mins == 0 {
        return format!("{}h", hours);
    }
    format!("{}h {}m", hours, mins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_key() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(day_key(day), "2024-03-07");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(150), "2h 30m");
        assert_eq!(format_minutes(1440), "24h");
    }
}
