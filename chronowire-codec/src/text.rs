//! PostgreSQL text-format rendering and parsing of dates, times and timestamps.
//!
//! Years are rendered with at least four digits; years at or before zero use
//! the ` BC` suffix (proleptic year 0 is 1 BC). Fractional seconds carry up
//! to six digits with trailing zeros dropped.

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chronowire_core::{CodecError, CodecResult, PgType, Zone};
use once_cell::sync::Lazy;
use regex::Regex;

static TIMESTAMP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4,})-(\d{2})-(\d{2})(?:[ T](\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?)?\s*([+-]\d{2}(?::?\d{2}(?::?\d{2})?)?)?( BC)?$",
    )
    .expect("Invalid timestamp regex")
});

static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?$").expect("Invalid time regex")
});

pub const INFINITY: &str = "infinity";
pub const NEG_INFINITY: &str = "-infinity";

/// A parsed `date`, `timestamp` or `timestamptz` literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTimestamp {
    pub local: NaiveDateTime,
    /// Present only when the text carried an offset.
    pub offset: Option<FixedOffset>,
    /// Whether the text carried a time-of-day part.
    pub has_time: bool,
}

fn malformed(pg_type: PgType, text: &str, reason: impl Into<String>) -> CodecError {
    CodecError::Malformed {
        pg_type,
        text: text.to_string(),
        reason: reason.into(),
    }
}

fn era(year: i32) -> (i32, &'static str) {
    if year <= 0 {
        (1 - year, " BC")
    } else {
        (year, "")
    }
}

/// `YYYY-MM-DD`, with ` BC` when needed.
pub fn format_date(date: &NaiveDate) -> String {
    let (year, suffix) = era(date.year());
    format!(
        "{:04}-{:02}-{:02}{}",
        year,
        date.month(),
        date.day(),
        suffix
    )
}

/// `HH:MM:SS[.ffffff]`.
pub fn format_time(time: &NaiveTime) -> String {
    let mut out = format!(
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second()
    );
    let micros = time.nanosecond() % 1_000_000_000 / 1_000;
    if micros != 0 {
        let frac = format!("{micros:06}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Offset as PostgreSQL prints it: `+08`, `-05:30`, `+00:09:21`.
pub fn format_pg_offset(offset: &FixedOffset) -> String {
    let total = offset.local_minus_utc();
    let sign = if total < 0 { '-' } else { '+' };
    let abs = total.abs();
    let (h, m, s) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    match (m, s) {
        (0, 0) => format!("{sign}{h:02}"),
        (_, 0) => format!("{sign}{h:02}:{m:02}"),
        _ => format!("{sign}{h:02}:{m:02}:{s:02}"),
    }
}

/// `YYYY-MM-DD HH:MM:SS[.ffffff]±HH[:MM[:SS]][ BC]`.
pub fn format_timestamp(local: &NaiveDateTime, offset: &FixedOffset) -> String {
    let (year, suffix) = era(local.year());
    format!(
        "{:04}-{:02}-{:02} {}{}{}",
        year,
        local.month(),
        local.day(),
        format_time(&local.time()),
        format_pg_offset(offset),
        suffix
    )
}

fn parse_fraction(digits: Option<&str>) -> u32 {
    match digits {
        Some(d) => {
            let padded = format!("{d:0<9}");
            padded.parse().unwrap_or(0)
        }
        None => 0,
    }
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    match Zone::parse(text).ok()? {
        Zone::Fixed(offset) => Some(offset),
        Zone::Named(_) => None,
    }
}

/// Parse `date`, `timestamp` or `timestamptz` text.
pub fn parse_timestamp(pg_type: PgType, text: &str) -> CodecResult<ParsedTimestamp> {
    let caps = TIMESTAMP_PATTERN
        .captures(text.trim())
        .ok_or_else(|| malformed(pg_type, text, "unrecognized layout"))?;

    let number = |i: usize| -> CodecResult<u32> {
        caps.get(i)
            .map(|m| m.as_str())
            .unwrap_or("0")
            .parse()
            .map_err(|_| malformed(pg_type, text, "numeric field out of range"))
    };

    let raw_year: i32 = caps[1]
        .parse()
        .map_err(|_| malformed(pg_type, text, "year out of range"))?;
    let year = if caps.get(9).is_some() {
        1 - raw_year
    } else {
        raw_year
    };

    let date = NaiveDate::from_ymd_opt(year, number(2)?, number(3)?)
        .ok_or_else(|| malformed(pg_type, text, "date field out of range"))?;

    let has_time = caps.get(4).is_some();
    let time = NaiveTime::from_hms_nano_opt(
        number(4)?,
        number(5)?,
        number(6)?,
        parse_fraction(caps.get(7).map(|m| m.as_str())),
    )
    .ok_or_else(|| malformed(pg_type, text, "time field out of range"))?;

    let offset = match caps.get(8) {
        Some(m) => Some(
            parse_offset(m.as_str())
                .ok_or_else(|| malformed(pg_type, text, "offset out of range"))?,
        ),
        None => None,
    };

    Ok(ParsedTimestamp {
        local: date.and_time(time),
        offset,
        has_time,
    })
}

/// Parse `time` text as a wall clock on `date`. The server's `24:00:00`
/// is midnight of the following day.
pub fn parse_time(date: NaiveDate, text: &str) -> CodecResult<NaiveDateTime> {
    let caps = TIME_PATTERN
        .captures(text.trim())
        .ok_or_else(|| malformed(PgType::Time, text, "unrecognized layout"))?;
    let field = |i: usize| -> u32 { caps[i].parse().unwrap_or(u32::MAX) };
    let nanos = parse_fraction(caps.get(4).map(|m| m.as_str()));

    if (field(1), field(2), field(3), nanos) == (24, 0, 0, 0) {
        return date
            .succ_opt()
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .ok_or_else(|| malformed(PgType::Time, text, "date out of range"));
    }

    NaiveTime::from_hms_nano_opt(field(1), field(2), field(3), nanos)
        .map(|time| date.and_time(time))
        .ok_or_else(|| malformed(PgType::Time, text, "time field out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_format_date_bc() {
        let date = NaiveDate::from_ymd_opt(-43, 3, 15).unwrap();
        assert_eq!(format_date(&date), "0044-03-15 BC");
        let date = NaiveDate::from_ymd_opt(2016, 1, 31).unwrap();
        assert_eq!(format_date(&date), "2016-01-31");
    }

    #[test]
    fn test_format_time_fraction() {
        let time = NaiveTime::from_hms_micro_opt(13, 5, 9, 120_000).unwrap();
        assert_eq!(format_time(&time), "13:05:09.12");
        let time = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(format_time(&time), "00:00:00");
    }

    #[test]
    fn test_format_pg_offset() {
        let east = FixedOffset::east_opt(8 * 3600).unwrap();
        let west = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
        let odd = FixedOffset::east_opt(9 * 60 + 21).unwrap();
        assert_eq!(format_pg_offset(&east), "+08");
        assert_eq!(format_pg_offset(&west), "-05:30");
        assert_eq!(format_pg_offset(&odd), "+00:09:21");
    }

    #[test]
    fn test_parse_plain_timestamp() {
        let parsed = parse_timestamp(PgType::Timestamp, "2016-01-31 03:00:00").unwrap();
        assert_eq!(parsed.local, ymd_hms(2016, 1, 31, 3, 0, 0));
        assert_eq!(parsed.offset, None);
        assert!(parsed.has_time);
    }

    #[test]
    fn test_parse_timestamptz() {
        let parsed =
            parse_timestamp(PgType::TimestampTz, "2016-01-31 03:00:00.5-02").unwrap();
        assert_eq!(parsed.local.and_utc().timestamp_subsec_millis(), 500);
        assert_eq!(parsed.offset, FixedOffset::west_opt(2 * 3600));
    }

    #[test]
    fn test_parse_date_only() {
        let parsed = parse_timestamp(PgType::Date, "0044-03-15 BC").unwrap();
        assert_eq!(parsed.local, ymd_hms(-43, 3, 15, 0, 0, 0));
        assert!(!parsed.has_time);
    }

    #[test]
    fn test_parse_rejects_bad_fields() {
        assert!(parse_timestamp(PgType::Date, "2016-13-01").is_err());
        assert!(parse_timestamp(PgType::Timestamp, "yesterday").is_err());
        let date = NaiveDate::default();
        assert!(parse_time(date, "25:00:00").is_err());
        assert!(parse_time(date, "24:00:01").is_err());
        assert!(parse_time(date, "24:00:00.5").is_err());
        assert!(parse_time(date, "1:2:3").is_err());
    }

    #[test]
    fn test_parse_time_fraction() {
        let time = parse_time(NaiveDate::default(), "23:59:59.000001").unwrap();
        assert_eq!(time.nanosecond(), 1_000);
    }

    #[test]
    fn test_parse_time_end_of_day() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(parse_time(date, "24:00:00").unwrap(), ymd_hms(1970, 1, 2, 0, 0, 0));
        assert_eq!(parse_time(date, "24:00:00.000").unwrap(), ymd_hms(1970, 1, 2, 0, 0, 0));
        assert!(parse_time(NaiveDate::MAX, "24:00:00").is_err());
    }
}
