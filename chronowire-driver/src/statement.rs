//! Bound statements.
//!
//! Temporal setters without an explicit zone share one default-zone sample
//! until the statement next executes. Parameters survive execution; the
//! pending batch does not.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chronowire_core::{
    DriverError, DriverResult, ExecutionError, PgType, StatementError, TemporalKind, WireParam,
    Zone,
};

use crate::connection::Session;
use crate::cursor::RowCursor;
use crate::executor::{ExecuteKind, ExecuteRequest, ExecuteResponse, ResultSetData};
use crate::policy::{HandleEvent, StatementScope};
use crate::resolver::ZoneResolver;

/// Bind carries its parameter count as a 16-bit field.
const MAX_PARAMETERS: usize = u16::MAX as usize;

/// Result of [`PreparedStatement::execute`].
#[derive(Debug)]
pub enum ExecuteOutcome {
    UpdateCount(u64),
    ResultSet(RowCursor),
}

impl ExecuteOutcome {
    pub fn update_count(&self) -> Option<u64> {
        match self {
            ExecuteOutcome::UpdateCount(count) => Some(*count),
            ExecuteOutcome::ResultSet(_) => None,
        }
    }

    pub fn into_cursor(self) -> Option<RowCursor> {
        match self {
            ExecuteOutcome::ResultSet(cursor) => Some(cursor),
            ExecuteOutcome::UpdateCount(_) => None,
        }
    }
}

/// A statement with positional parameters (`$1`, `$2`, ...), indexed from 1.
pub struct PreparedStatement {
    session: Arc<Session>,
    sql: String,
    params: Vec<Option<WireParam>>,
    batch: Vec<Vec<WireParam>>,
    zones: ZoneResolver<StatementScope>,
}

impl PreparedStatement {
    pub(crate) fn new(session: Arc<Session>, sql: String) -> Self {
        let zones = ZoneResolver::new(
            Arc::clone(&session.provider),
            session.capabilities.bypass_zone_cache(),
        );
        Self {
            session,
            sql,
            params: Vec::new(),
            batch: Vec::new(),
            zones,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    // ========================================================================
    // BINDING
    // ========================================================================

    fn slot(index: usize) -> Result<usize, StatementError> {
        if index > MAX_PARAMETERS {
            return Err(StatementError::InvalidParameterIndex { index });
        }
        index
            .checked_sub(1)
            .ok_or(StatementError::InvalidParameterIndex { index })
    }

    fn store(&mut self, slot: usize, param: WireParam) {
        if self.params.len() <= slot {
            self.params.resize(slot + 1, None);
        }
        self.params[slot] = Some(param);
    }

    fn bind(&mut self, index: usize, param: WireParam) -> DriverResult<()> {
        let slot = Self::slot(index)?;
        self.store(slot, param);
        self.zones.notify(HandleEvent::NonTemporalBound);
        Ok(())
    }

    pub fn set_int(&mut self, index: usize, value: i32) -> DriverResult<()> {
        self.bind(index, WireParam::new(PgType::Int4, value.to_string()))
    }

    pub fn set_long(&mut self, index: usize, value: i64) -> DriverResult<()> {
        self.bind(index, WireParam::new(PgType::Int8, value.to_string()))
    }

    pub fn set_text(&mut self, index: usize, value: &str) -> DriverResult<()> {
        self.bind(index, WireParam::new(PgType::Text, value))
    }

    pub fn set_bool(&mut self, index: usize, value: bool) -> DriverResult<()> {
        let text = if value { "t" } else { "f" };
        self.bind(index, WireParam::new(PgType::Bool, text))
    }

    /// Bind SQL NULL. Never consults the default zone, even for temporal types.
    pub fn set_null(&mut self, index: usize, pg_type: PgType) -> DriverResult<()> {
        let slot = Self::slot(index)?;
        self.store(slot, WireParam::null(pg_type));
        self.zones.notify(HandleEvent::NullBound);
        Ok(())
    }

    /// Bind a temporal value, rendered in `zone` or in the default zone.
    pub fn set_temporal(
        &mut self,
        index: usize,
        kind: TemporalKind,
        instant: &DateTime<Utc>,
        zone: Option<&Zone>,
    ) -> DriverResult<()> {
        let slot = Self::slot(index)?;
        let zone = self.zones.resolve(zone)?;
        let param = self.session.codec.encode(kind, instant, &zone)?;
        self.store(slot, param);
        self.zones.notify(HandleEvent::TemporalBound);
        Ok(())
    }

    pub fn set_date(&mut self, index: usize, instant: &DateTime<Utc>) -> DriverResult<()> {
        self.set_temporal(index, TemporalKind::Date, instant, None)
    }

    pub fn set_date_in(
        &mut self,
        index: usize,
        instant: &DateTime<Utc>,
        zone: &Zone,
    ) -> DriverResult<()> {
        self.set_temporal(index, TemporalKind::Date, instant, Some(zone))
    }

    pub fn set_time(&mut self, index: usize, instant: &DateTime<Utc>) -> DriverResult<()> {
        self.set_temporal(index, TemporalKind::Time, instant, None)
    }

    pub fn set_time_in(
        &mut self,
        index: usize,
        instant: &DateTime<Utc>,
        zone: &Zone,
    ) -> DriverResult<()> {
        self.set_temporal(index, TemporalKind::Time, instant, Some(zone))
    }

    pub fn set_timestamp(&mut self, index: usize, instant: &DateTime<Utc>) -> DriverResult<()> {
        self.set_temporal(index, TemporalKind::Timestamp, instant, None)
    }

    pub fn set_timestamp_in(
        &mut self,
        index: usize,
        instant: &DateTime<Utc>,
        zone: &Zone,
    ) -> DriverResult<()> {
        self.set_temporal(index, TemporalKind::Timestamp, instant, Some(zone))
    }

    /// The bound parameters, or the first unset index.
    fn bound_params(&self) -> Result<Vec<WireParam>, StatementError> {
        self.params
            .iter()
            .enumerate()
            .map(|(slot, param)| {
                param
                    .clone()
                    .ok_or(StatementError::ParameterNotSet { index: slot + 1 })
            })
            .collect()
    }

    /// Append the current parameters to the pending batch. They stay bound.
    pub fn add_batch(&mut self) -> DriverResult<()> {
        let params = self.bound_params()?;
        self.batch.push(params);
        self.zones.notify(HandleEvent::BatchAdded);
        Ok(())
    }

    pub fn clear_parameters(&mut self) {
        self.params.clear();
        self.zones.notify(HandleEvent::ParametersCleared);
    }

    pub fn pending_batch_len(&self) -> usize {
        self.batch.len()
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    fn run(&mut self, kind: ExecuteKind) -> DriverResult<ExecuteResponse> {
        let result = self
            .bound_params()
            .map_err(DriverError::from)
            .and_then(|params| {
                let sets = [params];
                self.session.executor.execute(&ExecuteRequest {
                    sql: &self.sql,
                    kind,
                    parameter_sets: &sets,
                })
            });

        self.zones.notify(HandleEvent::Executed);

        match &result {
            Ok(_) => tracing::debug!(sql = %self.sql, ?kind, "Statement executed"),
            Err(err) => tracing::warn!(sql = %self.sql, ?kind, error = %err, "Statement failed"),
        }
        result
    }

    fn cursor(&self, data: ResultSetData) -> RowCursor {
        RowCursor::new(Arc::clone(&self.session), data)
    }

    /// Execute once; the outcome is whatever the statement produced.
    pub fn execute(&mut self) -> DriverResult<ExecuteOutcome> {
        match self.run(ExecuteKind::Execute)? {
            ExecuteResponse::Rows(data) => Ok(ExecuteOutcome::ResultSet(self.cursor(data))),
            ExecuteResponse::UpdateCounts(counts) => Ok(ExecuteOutcome::UpdateCount(
                counts.first().copied().unwrap_or(0),
            )),
        }
    }

    /// Execute once and return the affected row count.
    pub fn execute_update(&mut self) -> DriverResult<u64> {
        match self.run(ExecuteKind::Update)? {
            ExecuteResponse::UpdateCounts(counts) => Ok(counts.first().copied().unwrap_or(0)),
            ExecuteResponse::Rows(_) => Err(StatementError::UnexpectedResultSet {
                sql: self.sql.clone(),
            }
            .into()),
        }
    }

    /// Execute once and return a fresh cursor over the rows.
    pub fn execute_query(&mut self) -> DriverResult<RowCursor> {
        match self.run(ExecuteKind::Query)? {
            ExecuteResponse::Rows(data) => Ok(self.cursor(data)),
            ExecuteResponse::UpdateCounts(_) => Err(StatementError::NoResultSet {
                sql: self.sql.clone(),
            }
            .into()),
        }
    }

    fn flush_batch(&self, batch: &[Vec<WireParam>]) -> DriverResult<Vec<u64>> {
        let chunk_size = self.session.config.max_batch_size;
        let mut counts = Vec::with_capacity(batch.len());

        for (n, chunk) in batch.chunks(chunk_size).enumerate() {
            let offset = n * chunk_size;
            let request = ExecuteRequest {
                sql: &self.sql,
                kind: ExecuteKind::Batch,
                parameter_sets: chunk,
            };
            match self.session.executor.execute(&request) {
                Ok(ExecuteResponse::UpdateCounts(chunk_counts)) => counts.extend(chunk_counts),
                Ok(ExecuteResponse::Rows(_)) => {
                    return Err(StatementError::UnexpectedResultSet {
                        sql: self.sql.clone(),
                    }
                    .into())
                }
                Err(DriverError::Execution(ExecutionError::BatchEntryFailed { index, reason })) => {
                    return Err(ExecutionError::BatchEntryFailed {
                        index: index + offset,
                        reason,
                    }
                    .into())
                }
                Err(err) => return Err(err),
            }
        }
        Ok(counts)
    }

    /// Execute every pending parameter set and clear the batch.
    ///
    /// Sets are sent in requests of at most `max_batch_size`. The batch is
    /// cleared even when a request fails.
    pub fn execute_batch(&mut self) -> DriverResult<Vec<u64>> {
        let batch = std::mem::take(&mut self.batch);
        let result = self.flush_batch(&batch);

        self.zones.notify(HandleEvent::BatchExecuted);

        match &result {
            Ok(counts) => {
                tracing::debug!(sql = %self.sql, entries = counts.len(), "Batch executed")
            }
            Err(err) => {
                tracing::warn!(sql = %self.sql, entries = batch.len(), error = %err, "Batch failed")
            }
        }
        result
    }

    pub fn close(self) {
        tracing::trace!(sql = %self.sql, "Statement closed");
    }

    /// The cached default zone. Exposed for tests only.
    #[cfg(any(test, feature = "inspect"))]
    pub fn cached_zone(&self) -> Option<Zone> {
        self.zones.cached_zone()
    }
}

impl std::fmt::Debug for PreparedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("sql", &self.sql)
            .field("params", &self.params)
            .field("batch", &self.batch.len())
            .field("zones", &self.zones)
            .finish()
    }
}
