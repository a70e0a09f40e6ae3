//! Timestamp helpers shared by stores, captions and the CLI.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DISPLAY_FORMAT: &str = "%H:%M:%S, %d/%m/%Y";

/// Render a wall-clock time the way the backend stores it: `YYYY-MM-DD HH:MM:SS`.
pub fn to_storage_timestamp(value: &NaiveDateTime) -> String {
    value.format(STORAGE_FORMAT).to_string()
}

/// Parse storage timestamps, `T`-separated local times, RFC 3339 strings or bare dates.
///
/// RFC 3339 values keep their wall-clock reading; the offset is dropped.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    let normalized = trimmed.replacen(' ', "T", 1);
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// `HH:MM:SS, DD/MM/YYYY`; empty input yields an empty string and anything
/// unparseable is echoed back.
pub fn format_date_time_display(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }
    parse_timestamp(input).map_or_else(
        || input.to_string(),
        |dt| dt.with_nanosecond(0).unwrap_or(dt).format(DISPLAY_FORMAT).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn storage_timestamp_is_zero_padded() {
        assert_eq!(to_storage_timestamp(&at(2024, 3, 7, 8, 5, 9)), "2024-03-07 08:05:09");
    }

    #[test]
    fn parses_supported_shapes() {
        let expected = at(2024, 3, 7, 8, 5, 9);
        assert_eq!(parse_timestamp("2024-03-07 08:05:09"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-07T08:05:09"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-07T08:05:09+05:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-07T08:05:09.250Z").map(|d| d.second()), Some(9));
        assert_eq!(parse_timestamp("2024-03-07"), Some(at(2024, 3, 7, 0, 0, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("   "), None);
    }

    #[test]
    fn display_uses_day_first_24h() {
        assert_eq!(format_date_time_display("2024-03-07 18:05:09"), "18:05:09, 07/03/2024");
    }

    #[test]
    fn display_passes_through_garbage() {
        assert_eq!(format_date_time_display(""), "");
        assert_eq!(format_date_time_display("pending"), "pending");
    }
}
