//! Timezone identifiers.
//!
//! A [`Zone`] is either a fixed UTC offset or an IANA rule set. It is the
//! value the resolution cache stores and the codec consumes; offset arithmetic
//! itself is delegated to `chrono` / `chrono-tz`.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ProviderError, ProviderResult};

/// Largest accepted offset, in hours, for `GMT+h` style identifiers.
const MAX_OFFSET_HOURS: i32 = 18;

static OFFSET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:GMT|UTC)\s*)?([+-])(\d{1,2})(?::?(\d{2}))?(?::?(\d{2}))?$")
        .expect("Invalid offset regex")
});

/// An immutable, comparable timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Zone {
    /// A constant offset east of UTC.
    Fixed(FixedOffset),
    /// An IANA zone with historical and DST rules.
    Named(Tz),
}

impl Zone {
    /// UTC as a zero fixed offset.
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// A fixed offset of `seconds` east of UTC.
    pub fn from_offset_seconds(seconds: i32) -> ProviderResult<Self> {
        FixedOffset::east_opt(seconds)
            .map(Zone::Fixed)
            .ok_or_else(|| ProviderError::UnknownZone {
                identifier: format!("offset {seconds}s"),
            })
    }

    /// The offset in force at `instant`.
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        match self {
            Zone::Fixed(offset) => *offset,
            Zone::Named(tz) => tz.offset_from_utc_datetime(&instant.naive_utc()).fix(),
        }
    }

    /// Wall clock of `instant` in this zone, or `None` if it leaves chrono's range.
    pub fn to_local(&self, instant: &DateTime<Utc>) -> Option<NaiveDateTime> {
        instant.naive_utc().checked_add_offset(self.offset_at(instant))
    }

    /// Instants whose wall clock in this zone is `local`.
    pub fn from_local(&self, local: &NaiveDateTime) -> LocalResult<DateTime<Utc>> {
        match self {
            Zone::Fixed(offset) => offset
                .from_local_datetime(local)
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Named(tz) => tz
                .from_local_datetime(local)
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// IANA name, or `None` for fixed offsets.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Zone::Fixed(_) => None,
            Zone::Named(tz) => Some(tz.name()),
        }
    }

    /// Parse a zone identifier.
    ///
    /// Accepts `Z`, ISO offsets (`+05:30`, `-0800`), `GMT`/`UTC` prefixed
    /// offsets (`GMT+8:00`, `UTC-2`, east positive) and IANA names.
    pub fn parse(identifier: &str) -> ProviderResult<Self> {
        let trimmed = identifier.trim();
        let unknown = || ProviderError::UnknownZone {
            identifier: identifier.to_string(),
        };

        if trimmed.is_empty() {
            return Err(unknown());
        }
        if trimmed == "Z" {
            return Ok(Zone::utc());
        }

        if let Some(caps) = OFFSET_PATTERN.captures(trimmed) {
            let sign = if &caps[1] == "-" { -1 } else { 1 };
            let field = |i: usize| -> i32 {
                caps.get(i)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0)
            };
            let (hours, minutes, seconds) = (field(2), field(3), field(4));
            if hours > MAX_OFFSET_HOURS || minutes > 59 || seconds > 59 {
                return Err(unknown());
            }
            return Zone::from_offset_seconds(sign * (hours * 3600 + minutes * 60 + seconds))
                .map_err(|_| unknown());
        }

        trimmed.parse::<Tz>().map(Zone::Named).map_err(|_| unknown())
    }
}

/// Formats an offset as `+HH:MM`, adding `:SS` only when needed.
pub fn format_offset(offset: &FixedOffset) -> String {
    let total = offset.local_minus_utc();
    let sign = if total < 0 { '-' } else { '+' };
    let abs = total.abs();
    let (h, m, s) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    if s == 0 {
        format!("{sign}{h:02}:{m:02}")
    } else {
        format!("{sign}{h:02}:{m:02}:{s:02}")
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Fixed(offset) => f.write_str(&format_offset(offset)),
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for Zone {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::parse(s)
    }
}

impl TryFrom<String> for Zone {
    type Error = ProviderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Zone::parse(&value)
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> Self {
        zone.to_string()
    }
}

impl From<Tz> for Zone {
    fn from(tz: Tz) -> Self {
        Zone::Named(tz)
    }
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Zone::Fixed(offset)
    }
}
