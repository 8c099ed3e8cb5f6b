//! Forward-only row cursor.
//!
//! Temporal getters without an explicit zone sample the default zone once
//! and reuse it for the rest of the cursor's life.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chronowire_core::{
    ColumnDesc, CursorError, DriverResult, PgType, RawRow, TemporalKind, Value, Zone,
};

use crate::connection::Session;
use crate::executor::ResultSetData;
use crate::policy::{CursorScope, HandleEvent};
use crate::resolver::ZoneResolver;

/// Type and raw bytes of one cell of the current row.
fn cell<'a>(
    columns: &[ColumnDesc],
    current: Option<&'a RawRow>,
    col: usize,
) -> Result<(PgType, Option<&'a [u8]>), CursorError> {
    let count = columns.len();
    let desc = col
        .checked_sub(1)
        .and_then(|i| columns.get(i))
        .ok_or(CursorError::InvalidColumnIndex { index: col, count })?;
    let row = current.ok_or(CursorError::NoCurrentRow)?;
    let bytes = row.get(col - 1).and_then(|b| b.as_deref());
    Ok((desc.pg_type, bytes))
}

fn utf8(col: usize, bytes: &[u8]) -> Result<&str, CursorError> {
    std::str::from_utf8(bytes).map_err(|e| CursorError::BadValue {
        index: col,
        reason: e.to_string(),
    })
}

fn mismatch(col: usize, expected: impl ToString, actual: PgType) -> CursorError {
    CursorError::TypeMismatch {
        index: col,
        expected: expected.to_string(),
        actual,
    }
}

/// Rows of one result set, read one at a time. Columns are indexed from 1.
pub struct RowCursor {
    session: Arc<Session>,
    columns: Vec<ColumnDesc>,
    rows: std::vec::IntoIter<RawRow>,
    current: Option<RawRow>,
    zones: ZoneResolver<CursorScope>,
}

impl RowCursor {
    pub(crate) fn new(session: Arc<Session>, data: ResultSetData) -> Self {
        let zones = ZoneResolver::new(
            Arc::clone(&session.provider),
            session.capabilities.bypass_zone_cache(),
        );
        tracing::trace!(
            columns = data.columns.len(),
            rows = data.rows.len(),
            "Cursor opened"
        );
        Self {
            session,
            columns: data.columns,
            rows: data.rows.into_iter(),
            current: None,
            zones,
        }
    }

    /// Advance to the next row. Returns `false` once the rows run out.
    pub fn next(&mut self) -> bool {
        self.current = self.rows.next();
        self.zones.notify(HandleEvent::RowAdvanced);
        self.current.is_some()
    }

    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    /// 1-based index of the column called `name`, ignoring case.
    pub fn column_index(&self, name: &str) -> Result<usize, CursorError> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .map(|i| i + 1)
            .ok_or_else(|| CursorError::UnknownColumn {
                name: name.to_string(),
            })
    }

    // ========================================================================
    // NON-TEMPORAL GETTERS
    // ========================================================================

    fn text_cell(
        &mut self,
        col: usize,
        accepts: &[PgType],
        expected: &str,
    ) -> DriverResult<Option<&str>> {
        self.zones.notify(HandleEvent::ColumnRead);
        let (pg_type, bytes) = cell(&self.columns, self.current.as_ref(), col)?;
        if !accepts.is_empty() && !accepts.contains(&pg_type) {
            return Err(mismatch(col, expected, pg_type).into());
        }
        match bytes {
            Some(bytes) => Ok(Some(utf8(col, bytes)?)),
            None => Ok(None),
        }
    }

    fn parsed<T: std::str::FromStr>(
        &mut self,
        col: usize,
        accepts: &[PgType],
        expected: &str,
    ) -> DriverResult<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        match self.text_cell(col, accepts, expected)? {
            Some(text) => text.trim().parse().map(Some).map_err(|e: T::Err| {
                CursorError::BadValue {
                    index: col,
                    reason: e.to_string(),
                }
                .into()
            }),
            None => Ok(None),
        }
    }

    pub fn get_int(&mut self, col: usize) -> DriverResult<Option<i32>> {
        self.parsed(col, &[PgType::Int4], "int4")
    }

    pub fn get_long(&mut self, col: usize) -> DriverResult<Option<i64>> {
        self.parsed(col, &[PgType::Int4, PgType::Int8], "int8")
    }

    /// Raw text of any column.
    pub fn get_text(&mut self, col: usize) -> DriverResult<Option<String>> {
        Ok(self.text_cell(col, &[], "text")?.map(str::to_string))
    }

    pub fn get_bool(&mut self, col: usize) -> DriverResult<Option<bool>> {
        match self.text_cell(col, &[PgType::Bool], "bool")? {
            Some("t" | "true" | "1") => Ok(Some(true)),
            Some("f" | "false" | "0") => Ok(Some(false)),
            Some(other) => Err(CursorError::BadValue {
                index: col,
                reason: format!("not a boolean: {other:?}"),
            }
            .into()),
            None => Ok(None),
        }
    }

    // ========================================================================
    // TEMPORAL GETTERS
    // ========================================================================

    /// Read a temporal column as `kind`, in `zone` or in the default zone.
    ///
    /// NULL yields `None` without touching the default zone.
    pub fn get_temporal(
        &mut self,
        col: usize,
        kind: TemporalKind,
        zone: Option<&Zone>,
    ) -> DriverResult<Option<DateTime<Utc>>> {
        let (pg_type, bytes) = cell(&self.columns, self.current.as_ref(), col)?;
        if !pg_type.is_temporal() {
            return Err(mismatch(col, kind, pg_type).into());
        }
        let Some(bytes) = bytes else {
            self.zones.notify(HandleEvent::ColumnRead);
            return Ok(None);
        };

        let zone = self.zones.resolve(zone)?;
        let instant = self.session.codec.decode(kind, pg_type, bytes, &zone)?;
        self.zones.notify(HandleEvent::ColumnRead);
        Ok(Some(instant))
    }

    pub fn get_date(&mut self, col: usize) -> DriverResult<Option<DateTime<Utc>>> {
        self.get_temporal(col, TemporalKind::Date, None)
    }

    pub fn get_date_in(&mut self, col: usize, zone: &Zone) -> DriverResult<Option<DateTime<Utc>>> {
        self.get_temporal(col, TemporalKind::Date, Some(zone))
    }

    pub fn get_time(&mut self, col: usize) -> DriverResult<Option<DateTime<Utc>>> {
        self.get_temporal(col, TemporalKind::Time, None)
    }

    pub fn get_time_in(&mut self, col: usize, zone: &Zone) -> DriverResult<Option<DateTime<Utc>>> {
        self.get_temporal(col, TemporalKind::Time, Some(zone))
    }

    pub fn get_timestamp(&mut self, col: usize) -> DriverResult<Option<DateTime<Utc>>> {
        self.get_temporal(col, TemporalKind::Timestamp, None)
    }

    pub fn get_timestamp_in(
        &mut self,
        col: usize,
        zone: &Zone,
    ) -> DriverResult<Option<DateTime<Utc>>> {
        self.get_temporal(col, TemporalKind::Timestamp, Some(zone))
    }

    /// Untyped read. Temporal columns decode in the default zone.
    pub fn get_value(&mut self, col: usize) -> DriverResult<Value> {
        let (pg_type, bytes) = cell(&self.columns, self.current.as_ref(), col)?;
        if bytes.is_none() {
            self.zones.notify(HandleEvent::ColumnRead);
            return Ok(Value::Null);
        }

        if let Some(kind) = TemporalKind::for_column(pg_type) {
            return Ok(self
                .get_temporal(col, kind, None)?
                .map_or(Value::Null, |instant| Value::Temporal(kind, instant)));
        }

        let value = match pg_type {
            PgType::Int4 => self.get_int(col)?.map(Value::Int4),
            PgType::Int8 => self.get_long(col)?.map(Value::Int8),
            PgType::Bool => self.get_bool(col)?.map(Value::Bool),
            _ => self.get_text(col)?.map(Value::Text),
        };
        Ok(value.unwrap_or(Value::Null))
    }

    pub fn close(self) {
        tracing::trace!("Cursor closed");
    }

    /// The cached default zone. Exposed for tests only.
    #[cfg(any(test, feature = "inspect"))]
    pub fn cached_zone(&self) -> Option<Zone> {
        self.zones.cached_zone()
    }
}

impl std::fmt::Debug for RowCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCursor")
            .field("columns", &self.columns)
            .field("remaining", &self.rows.len())
            .field("on_row", &self.current.is_some())
            .field("zones", &self.zones)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::executor::{ExecuteRequest, ExecuteResponse, QueryExecutor};
    use chrono::TimeZone;
    use chronowire_codec::TextTemporalCodec;
    use chronowire_core::{DriverConfig, DriverError, FixedTimezoneProvider};

    struct OneRow;

    impl QueryExecutor for OneRow {
        fn execute(&self, _request: &ExecuteRequest<'_>) -> DriverResult<ExecuteResponse> {
            let text = |s: &str| Some(s.as_bytes().to_vec());
            Ok(ExecuteResponse::Rows(ResultSetData::new(
                vec![
                    ColumnDesc::new("id", PgType::Int4),
                    ColumnDesc::new("Name", PgType::Text),
                    ColumnDesc::new("ok", PgType::Bool),
                    ColumnDesc::new("ts", PgType::Timestamp),
                    ColumnDesc::new("d", PgType::Date),
                    ColumnDesc::new("gone", PgType::Timestamp),
                ],
                vec![vec![
                    text("42"),
                    text("x"),
                    text("t"),
                    text("2016-01-31 03:00:00"),
                    text("2016-01-31"),
                    None,
                ]],
            )))
        }
    }

    fn cursor() -> RowCursor {
        let conn = Connection::open(
            DriverConfig::default(),
            Arc::new(FixedTimezoneProvider::new(Zone::parse("GMT-2:00").unwrap())),
            Arc::new(TextTemporalCodec::new()),
            Arc::new(OneRow),
        )
        .unwrap();
        conn.query("SELECT * FROM t").unwrap()
    }

    #[test]
    fn test_read_before_next_fails() {
        let mut rows = cursor();
        assert_eq!(rows.get_int(1), Err(CursorError::NoCurrentRow.into()));
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut rows = cursor();
        assert!(rows.next());
        assert!(!rows.next());
        assert_eq!(rows.get_timestamp(4), Err(CursorError::NoCurrentRow.into()));
    }

    #[test]
    fn test_column_bounds() {
        let mut rows = cursor();
        rows.next();
        assert_eq!(
            rows.get_int(0),
            Err(CursorError::InvalidColumnIndex { index: 0, count: 6 }.into())
        );
        assert_eq!(
            rows.get_int(7),
            Err(CursorError::InvalidColumnIndex { index: 7, count: 6 }.into())
        );
    }

    #[test]
    fn test_typed_getters() {
        let mut rows = cursor();
        rows.next();
        assert_eq!(rows.get_int(1).unwrap(), Some(42));
        assert_eq!(rows.get_long(1).unwrap(), Some(42));
        assert_eq!(rows.get_text(2).unwrap().as_deref(), Some("x"));
        assert_eq!(rows.get_bool(3).unwrap(), Some(true));
        assert_eq!(rows.column_index("name").unwrap(), 2);
        assert!(matches!(
            rows.column_index("missing"),
            Err(CursorError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_temporal_in_default_zone() {
        let mut rows = cursor();
        rows.next();
        assert_eq!(
            rows.get_timestamp(4).unwrap(),
            Some(Utc.with_ymd_and_hms(2016, 1, 31, 5, 0, 0).unwrap())
        );
        assert_eq!(
            rows.get_value(5).unwrap(),
            Value::Temporal(
                TemporalKind::Date,
                Utc.with_ymd_and_hms(2016, 1, 31, 2, 0, 0).unwrap()
            )
        );
    }

    #[test]
    fn test_temporal_getter_rejects_non_temporal_column() {
        let mut rows = cursor();
        rows.next();
        assert!(matches!(
            rows.get_timestamp(1),
            Err(DriverError::Cursor(CursorError::TypeMismatch { index: 1, .. }))
        ));
        assert!(matches!(
            rows.get_int(4),
            Err(DriverError::Cursor(CursorError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_null_temporal() {
        let mut rows = cursor();
        rows.next();
        assert_eq!(rows.get_timestamp(6).unwrap(), None);
        assert_eq!(rows.get_value(6).unwrap(), Value::Null);
    }
}
