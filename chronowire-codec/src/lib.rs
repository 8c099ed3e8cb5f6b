//! chronowire codec - PostgreSQL text format for temporal values
//!
//! [`TextTemporalCodec`] turns an instant plus a resolved [`Zone`] into the
//! text a server parses, and back. Which zone to use is decided upstream;
//! this crate never consults a provider.
//!
//! | Kind | Parameter text | Parameter type |
//! |---|---|---|
//! | Date | `2016-01-31` | `date` |
//! | Time | `13:05:09.12` | `time` |
//! | Timestamp | `2016-01-31 00:00:00+08` | unspecified |
//!
//! Timestamps go out untyped so the server can coerce them into either
//! `timestamp` or `timestamptz` columns.

pub mod text;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use chronowire_core::{
    CodecError, CodecResult, PgType, TemporalCodec, TemporalKind, WireParam, Zone,
};

use text::{
    format_date, format_time, format_timestamp, parse_time, parse_timestamp, ParsedTimestamp,
    INFINITY, NEG_INFINITY,
};

/// Stateless text-format codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTemporalCodec;

impl TextTemporalCodec {
    pub fn new() -> Self {
        Self
    }
}

/// The date local times are pinned to when only a time of day is known.
fn epoch_date() -> NaiveDate {
    // NaiveDate's default is 1970-01-01.
    NaiveDate::default()
}

/// Map a wall clock in `zone` to an instant; the earlier instant wins in a fold.
fn localize(local: &NaiveDateTime, zone: &Zone) -> CodecResult<DateTime<Utc>> {
    match zone.from_local(local) {
        LocalResult::Single(instant) => Ok(instant),
        LocalResult::Ambiguous(a, b) => Ok(a.min(b)),
        LocalResult::None => Err(CodecError::NonexistentLocalTime {
            local: local.to_string(),
            zone: zone.to_string(),
        }),
    }
}

/// Round to the microsecond, the server's resolution.
fn round_to_micros(instant: &DateTime<Utc>) -> CodecResult<DateTime<Utc>> {
    let bumped = instant
        .checked_add_signed(TimeDelta::nanoseconds(500))
        .ok_or_else(|| CodecError::OutOfRange {
            reason: format!("{instant} cannot be rounded to microseconds"),
        })?;
    let nanos = bumped.nanosecond() / 1_000 * 1_000;
    bumped
        .with_nanosecond(nanos)
        .ok_or_else(|| CodecError::OutOfRange {
            reason: format!("{instant} cannot be rounded to microseconds"),
        })
}

fn local_of(instant: &DateTime<Utc>, zone: &Zone) -> CodecResult<NaiveDateTime> {
    zone.to_local(instant).ok_or_else(|| CodecError::OutOfRange {
        reason: format!("{instant} has no wall clock in {zone}"),
    })
}

fn infinity_text(instant: &DateTime<Utc>) -> Option<&'static str> {
    if *instant == DateTime::<Utc>::MAX_UTC {
        Some(INFINITY)
    } else if *instant == DateTime::<Utc>::MIN_UTC {
        Some(NEG_INFINITY)
    } else {
        None
    }
}

fn infinity_instant(text: &str) -> Option<DateTime<Utc>> {
    match text.trim() {
        INFINITY => Some(DateTime::<Utc>::MAX_UTC),
        NEG_INFINITY => Some(DateTime::<Utc>::MIN_UTC),
        _ => None,
    }
}

impl TemporalCodec for TextTemporalCodec {
    fn encode(
        &self,
        kind: TemporalKind,
        instant: &DateTime<Utc>,
        zone: &Zone,
    ) -> CodecResult<WireParam> {
        let pg_type = match kind {
            TemporalKind::Timestamp => PgType::Unspecified,
            TemporalKind::Date => PgType::Date,
            TemporalKind::Time => PgType::Time,
        };

        if let Some(text) = infinity_text(instant) {
            if kind == TemporalKind::Time {
                return Err(CodecError::OutOfRange {
                    reason: format!("{text} has no time of day"),
                });
            }
            return Ok(WireParam::new(pg_type, text));
        }

        let text = match kind {
            TemporalKind::Date => format_date(&local_of(instant, zone)?.date()),
            TemporalKind::Time => {
                format_time(&local_of(&round_to_micros(instant)?, zone)?.time())
            }
            TemporalKind::Timestamp => {
                let rounded = round_to_micros(instant)?;
                let local = local_of(&rounded, zone)?;
                format_timestamp(&local, &zone.offset_at(&rounded))
            }
        };
        Ok(WireParam::new(pg_type, text))
    }

    fn decode(
        &self,
        kind: TemporalKind,
        column_type: PgType,
        bytes: &[u8],
        zone: &Zone,
    ) -> CodecResult<DateTime<Utc>> {
        let text = std::str::from_utf8(bytes).map_err(|e| CodecError::Malformed {
            pg_type: column_type,
            text: String::from_utf8_lossy(bytes).into_owned(),
            reason: e.to_string(),
        })?;

        let unsupported = || CodecError::UnsupportedConversion {
            kind,
            pg_type: column_type,
        };

        match column_type {
            PgType::Date | PgType::Timestamp | PgType::TimestampTz => {
                if let Some(instant) = infinity_instant(text) {
                    return match kind {
                        TemporalKind::Time => Err(unsupported()),
                        _ => Ok(instant),
                    };
                }
                let parsed = parse_timestamp(column_type, text)?;
                decode_dated(kind, column_type, parsed, zone).ok_or_else(unsupported)?
            }
            PgType::Time => match kind {
                TemporalKind::Date => Err(unsupported()),
                TemporalKind::Time | TemporalKind::Timestamp => {
                    let local = parse_time(epoch_date(), text)?;
                    localize(&local, zone)
                }
            },
            _ => Err(unsupported()),
        }
    }
}

/// Decode a value from a column that carries a date. `None` means the
/// kind/column pairing is unsupported.
fn decode_dated(
    kind: TemporalKind,
    column_type: PgType,
    parsed: ParsedTimestamp,
    zone: &Zone,
) -> Option<CodecResult<DateTime<Utc>>> {
    // A timestamptz literal pins its own instant; the zone only shapes the
    // wall clock derived from it.
    let local = match (column_type, parsed.offset) {
        (PgType::TimestampTz, Some(offset)) => {
            let instant = match localize(&parsed.local, &Zone::Fixed(offset)) {
                Ok(instant) => instant,
                Err(e) => return Some(Err(e)),
            };
            if kind == TemporalKind::Timestamp {
                return Some(Ok(instant));
            }
            match local_of(&instant, zone) {
                Ok(local) => local,
                Err(e) => return Some(Err(e)),
            }
        }
        _ => parsed.local,
    };

    let wall = match kind {
        TemporalKind::Timestamp => local,
        TemporalKind::Date => local.date().and_time(NaiveTime::MIN),
        TemporalKind::Time => {
            if column_type == PgType::Date {
                return None;
            }
            epoch_date().and_time(local.time())
        }
    };
    Some(localize(&wall, zone))
}
