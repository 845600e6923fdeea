//! Date and timestamp conversion between ISO input and HL7 DT/DTM forms

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const HL7_DATE: &str = "%Y%m%d";
const HL7_TIMESTAMP: &str = "%Y%m%d%H%M%S";
const ISO_DATE: &str = "%Y-%m-%d";
const ISO_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a date given as `YYYY-MM-DD` or `YYYYMMDD`
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    match value.len() {
        10 => NaiveDate::parse_from_str(value, ISO_DATE).ok(),
        8 if value.bytes().all(|b| b.is_ascii_digit()) => {
            NaiveDate::parse_from_str(value, HL7_DATE).ok()
        }
        _ => None,
    }
}

/// Parses a timestamp given as RFC 3339, `YYYY-MM-DDTHH:MM:SS` or
/// 14-digit `YYYYMMDDHHMMSS`
///
/// RFC 3339 values keep their local wall-clock time; the offset is dropped.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.len() == 14 && value.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDateTime::parse_from_str(value, HL7_TIMESTAMP).ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(value, ISO_TIMESTAMP)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Formats a date as HL7 `YYYYMMDD`
pub fn to_hl7_date(date: NaiveDate) -> String {
    date.format(HL7_DATE).to_string()
}

/// Formats a timestamp as HL7 `YYYYMMDDHHMMSS`
pub fn to_hl7_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(HL7_TIMESTAMP).to_string()
}

/// Current UTC time as HL7 `YYYYMMDDHHMMSS`
pub fn now_hl7() -> String {
    to_hl7_timestamp(Utc::now().naive_utc())
}

/// Converts an HL7 date back to `YYYY-MM-DD`; other text is returned as-is
pub fn from_hl7_date(value: &str) -> String {
    let digits = value.get(..8).unwrap_or(value);
    match NaiveDate::parse_from_str(digits, HL7_DATE) {
        Ok(date) if digits.bytes().all(|b| b.is_ascii_digit()) => {
            date.format(ISO_DATE).to_string()
        }
        _ => value.to_string(),
    }
}

/// Converts an HL7 timestamp back to `YYYY-MM-DDTHH:MM:SS`
///
/// Accepts 8, 12 or 14 digit precision; other text is returned as-is.
pub fn from_hl7_timestamp(value: &str) -> String {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }
    let padded = match value.len() {
        8 => format!("{value}000000"),
        12 => format!("{value}00"),
        14 => value.to_string(),
        _ => return value.to_string(),
    };
    NaiveDateTime::parse_from_str(&padded, HL7_TIMESTAMP)
        .map(|ts| ts.format(ISO_TIMESTAMP).to_string())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(1990, 1, 15);
        assert_eq!(parse_date("1990-01-15"), expected);
        assert_eq!(parse_date("19900115"), expected);
        assert_eq!(parse_date("1990-02-30"), None);
        assert_eq!(parse_date("15/01/1990"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0);
        assert_eq!(parse_timestamp("20240115083000"), expected);
        assert_eq!(parse_timestamp("2024-01-15T08:30:00"), expected);
        assert_eq!(parse_timestamp("2024-01-15T08:30:00+02:00"), expected);
        assert_eq!(parse_timestamp("2024-01-15T08:30:00Z"), expected);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_hl7_round_trips() {
        let date = parse_date("1990-01-15").unwrap();
        assert_eq!(to_hl7_date(date), "19900115");
        assert_eq!(from_hl7_date("19900115"), "1990-01-15");

        let ts = parse_timestamp("2024-01-15T08:30:00").unwrap();
        assert_eq!(to_hl7_timestamp(ts), "20240115083000");
        assert_eq!(from_hl7_timestamp("20240115083000"), "2024-01-15T08:30:00");
    }

    #[test]
    fn test_from_hl7_passthrough() {
        assert_eq!(from_hl7_date("unknown"), "unknown");
        assert_eq!(from_hl7_timestamp("202401150830"), "2024-01-15T08:30:00");
        assert_eq!(from_hl7_timestamp("2024-01-15"), "2024-01-15");
    }

    #[test]
    fn test_now_hl7_shape() {
        let now = now_hl7();
        assert_eq!(now.len(), 14);
        assert!(now.bytes().all(|b| b.is_ascii_digit()));
    }
}
