//! Wire-level type tags and value carriers shared by the codec and the driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// POSTGRES TYPE TAGS
// ============================================================================

/// PostgreSQL type of a parameter or result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PgType {
    Int4,
    Int8,
    Text,
    Bool,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    /// Let the server infer the type from context.
    Unspecified,
}

impl PgType {
    /// Type OID as sent in a Parse message. `Unspecified` is 0.
    pub fn oid(&self) -> u32 {
        match self {
            PgType::Int4 => 23,
            PgType::Int8 => 20,
            PgType::Text => 25,
            PgType::Bool => 16,
            PgType::Date => 1082,
            PgType::Time => 1083,
            PgType::Timestamp => 1114,
            PgType::TimestampTz => 1184,
            PgType::Unspecified => 0,
        }
    }

    /// Catalog name of the type.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PgType::Int4 => "int4",
            PgType::Int8 => "int8",
            PgType::Text => "text",
            PgType::Bool => "bool",
            PgType::Date => "date",
            PgType::Time => "time",
            PgType::Timestamp => "timestamp",
            PgType::TimestampTz => "timestamptz",
            PgType::Unspecified => "unspecified",
        }
    }

    /// Whether values of this type go through the temporal codec.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            PgType::Date | PgType::Time | PgType::Timestamp | PgType::TimestampTz
        )
    }
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Which wall-clock fields of an instant a temporal operation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalKind {
    /// Calendar date; the instant is local midnight.
    Date,
    /// Time of day; the instant falls on 1970-01-01 local.
    Time,
    /// Date and time of day.
    Timestamp,
}

impl TemporalKind {
    /// The natural column type for this kind.
    pub fn pg_type(&self) -> PgType {
        match self {
            TemporalKind::Date => PgType::Date,
            TemporalKind::Time => PgType::Time,
            TemporalKind::Timestamp => PgType::Timestamp,
        }
    }

    /// Kind used when a temporal column is read without a requested kind.
    pub fn for_column(pg_type: PgType) -> Option<Self> {
        match pg_type {
            PgType::Date => Some(TemporalKind::Date),
            PgType::Time => Some(TemporalKind::Time),
            PgType::Timestamp | PgType::TimestampTz => Some(TemporalKind::Timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemporalKind::Date => "Date",
            TemporalKind::Time => "Time",
            TemporalKind::Timestamp => "Timestamp",
        };
        f.write_str(name)
    }
}

// ============================================================================
// WIRE CARRIERS
// ============================================================================

/// An encoded parameter ready for the Bind message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireParam {
    pub pg_type: PgType,
    /// Text-format bytes, `None` for SQL NULL.
    pub bytes: Option<Vec<u8>>,
}

impl WireParam {
    pub fn new(pg_type: PgType, text: impl Into<String>) -> Self {
        Self {
            pg_type,
            bytes: Some(text.into().into_bytes()),
        }
    }

    pub fn null(pg_type: PgType) -> Self {
        Self {
            pg_type,
            bytes: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.bytes.is_none()
    }

    /// The payload as UTF-8, if present and valid.
    pub fn as_text(&self) -> Option<&str> {
        self.bytes
            .as_deref()
            .and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Result column metadata from a RowDescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDesc {
    pub name: String,
    pub pg_type: PgType,
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>, pg_type: PgType) -> Self {
        Self {
            name: name.into(),
            pg_type,
        }
    }
}

/// One result row: raw text bytes per column, `None` for NULL.
pub type RawRow = Vec<Option<Vec<u8>>>;

/// A decoded column value as returned by the untyped getter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int4(i32),
    Int8(i64),
    Text(String),
    Bool(bool),
    Temporal(TemporalKind, DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Temporal(_, instant) => Some(*instant),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_types() {
        assert!(PgType::Date.is_temporal());
        assert!(PgType::TimestampTz.is_temporal());
        assert!(!PgType::Int4.is_temporal());
        assert!(!PgType::Unspecified.is_temporal());
    }

    #[test]
    fn test_kind_for_column() {
        assert_eq!(TemporalKind::for_column(PgType::Date), Some(TemporalKind::Date));
        assert_eq!(
            TemporalKind::for_column(PgType::TimestampTz),
            Some(TemporalKind::Timestamp)
        );
        assert_eq!(TemporalKind::for_column(PgType::Text), None);
    }

    #[test]
    fn test_wire_param_text() {
        let param = WireParam::new(PgType::Int4, "42");
        assert_eq!(param.as_text(), Some("42"));
        assert!(!param.is_null());
        assert!(WireParam::null(PgType::Date).is_null());
    }

    #[test]
    fn test_oids() {
        assert_eq!(PgType::Timestamp.oid(), 1114);
        assert_eq!(PgType::Unspecified.oid(), 0);
    }
}
