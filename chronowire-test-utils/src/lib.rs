//! chronowire Test Utilities
//!
//! Shared test infrastructure for the chronowire workspace:
//! - A default-zone provider tests can change mid-run
//! - A scripted executor that records requests
//! - Proptest generators for zones and instants
//! - Fixtures and assertions for handle-level scenarios

pub use chronowire_codec::TextTemporalCodec;
pub use chronowire_core::{
    ColumnDesc, CursorError, DriverConfig, DriverError, DriverResult, ExecutionError, PgType,
    ProviderError, ProviderResult, RawRow, StatementError, TemporalKind, TimezoneProvider, Value,
    WireParam, Zone, ZoneCacheMode,
};
pub use chronowire_driver::{
    Connection, ExecuteKind, ExecuteRequest, ExecuteResponse, PreparedStatement, QueryExecutor,
    ResultSetData, RowCursor,
};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-writer subscriber once. Honors `RUST_LOG`.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chronowire_driver=trace,warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// MOCK PROVIDER
// ============================================================================

/// Stand-in for the process default zone.
///
/// Clones share state, so a test can keep one handle and change the default
/// under a connection that holds another. Each test gets its own instance,
/// which keeps parallel tests from racing on a real process setting.
#[derive(Debug, Clone)]
pub struct SettableTimezoneProvider {
    zone: Arc<RwLock<Option<Zone>>>,
    samples: Arc<AtomicUsize>,
    fast: bool,
}

impl SettableTimezoneProvider {
    /// A slow provider, as the system one is.
    pub fn new(zone: Zone) -> Self {
        Self {
            zone: Arc::new(RwLock::new(Some(zone))),
            samples: Arc::new(AtomicUsize::new(0)),
            fast: false,
        }
    }

    /// A provider that reports cheap lookups.
    pub fn fast(zone: Zone) -> Self {
        Self {
            fast: true,
            ..Self::new(zone)
        }
    }

    /// Change the default zone seen by later samples.
    pub fn set_default(&self, zone: Zone) {
        if let Ok(mut slot) = self.zone.write() {
            *slot = Some(zone);
        }
    }

    /// Make later samples fail with `ProviderError::Unavailable`.
    pub fn set_unavailable(&self) {
        if let Ok(mut slot) = self.zone.write() {
            *slot = None;
        }
    }

    /// Number of times `current()` has been called.
    pub fn sample_count(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }
}

impl TimezoneProvider for SettableTimezoneProvider {
    fn current(&self) -> ProviderResult<Zone> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        let slot = self.zone.read().map_err(|_| ProviderError::LockPoisoned)?;
        (*slot).ok_or_else(|| ProviderError::Unavailable {
            reason: "default zone unset by test".to_string(),
        })
    }

    fn is_fast(&self) -> bool {
        self.fast
    }
}

// ============================================================================
// MOCK EXECUTOR
// ============================================================================

/// A request as seen by [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub sql: String,
    pub kind: ExecuteKind,
    pub parameter_sets: Vec<Vec<WireParam>>,
}

/// Executor that records every request and answers from a script.
///
/// Queries, and plain executions of `SELECT`, return the configured rows.
/// Everything else returns one update count per parameter set.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    requests: Mutex<Vec<RecordedRequest>>,
    rows: Mutex<ResultSetData>,
    failures: Mutex<VecDeque<DriverError>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(data: ResultSetData) -> Self {
        Self {
            rows: Mutex::new(data),
            ..Self::default()
        }
    }

    /// Fail the next request with `error`. Queued failures apply in order.
    pub fn fail_next(&self, error: DriverError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Text of each parameter of the most recent single execution.
    pub fn last_params(&self) -> Vec<Option<String>> {
        self.requests()
            .last()
            .and_then(|r| r.parameter_sets.last().cloned())
            .unwrap_or_default()
            .iter()
            .map(|p| p.as_text().map(str::to_string))
            .collect()
    }
}

impl QueryExecutor for ScriptedExecutor {
    fn execute(&self, request: &ExecuteRequest<'_>) -> DriverResult<ExecuteResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                sql: request.sql.to_string(),
                kind: request.kind,
                parameter_sets: request.parameter_sets.to_vec(),
            });
        }

        if let Some(error) = self.failures.lock().ok().and_then(|mut f| f.pop_front()) {
            return Err(error);
        }

        let returns_rows = match request.kind {
            ExecuteKind::Query => true,
            ExecuteKind::Execute => request
                .sql
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("select"),
            ExecuteKind::Update | ExecuteKind::Batch => false,
        };

        if returns_rows {
            let data = self
                .rows
                .lock()
                .map(|d| d.clone())
                .map_err(|_| ExecutionError::ConnectionLost {
                    reason: "scripted rows poisoned".to_string(),
                })?;
            Ok(ExecuteResponse::Rows(data))
        } else {
            let counts = vec![1; request.parameter_sets.len()];
            Ok(ExecuteResponse::UpdateCounts(counts))
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for zones and instants.

    use super::*;
    use chrono::{DateTime, Utc};
    use chrono_tz::Tz;
    use proptest::prelude::*;

    /// Named zones with DST, odd offsets, and southern-hemisphere rules.
    pub const NAMED_ZONES: &[Tz] = &[
        Tz::UTC,
        Tz::Europe__Berlin,
        Tz::Europe__London,
        Tz::America__New_York,
        Tz::America__Sao_Paulo,
        Tz::Asia__Kolkata,
        Tz::Asia__Kathmandu,
        Tz::Australia__Lord_Howe,
        Tz::Pacific__Chatham,
        Tz::Pacific__Kiritimati,
    ];

    /// Fixed offsets at minute resolution within +-15h.
    pub fn arb_fixed_zone() -> impl Strategy<Value = Zone> {
        (-15 * 60..=15 * 60i32).prop_filter_map("offset in range", |minutes| {
            Zone::from_offset_seconds(minutes * 60).ok()
        })
    }

    pub fn arb_named_zone() -> impl Strategy<Value = Zone> {
        prop::sample::select(NAMED_ZONES).prop_map(Zone::Named)
    }

    pub fn arb_zone() -> impl Strategy<Value = Zone> {
        prop_oneof![arb_fixed_zone(), arb_named_zone()]
    }

    /// Instants between 1900 and 2100 at microsecond precision.
    pub fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
        (-2_208_988_800i64..4_102_444_800i64, 0u32..1_000_000).prop_filter_map(
            "representable instant",
            |(secs, micros)| DateTime::from_timestamp(secs, micros * 1_000),
        )
    }

    pub fn arb_temporal_kind() -> impl Strategy<Value = TemporalKind> {
        prop_oneof![
            Just(TemporalKind::Date),
            Just(TemporalKind::Time),
            Just(TemporalKind::Timestamp),
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made connections, zones and result sets.

    use super::*;

    /// Parse a zone identifier, panicking on typos in test code.
    pub fn zone(identifier: &str) -> Zone {
        Zone::parse(identifier).unwrap_or_else(|e| panic!("bad test zone {identifier}: {e}"))
    }

    /// Connection over the text codec with default config.
    pub fn connection(
        provider: &SettableTimezoneProvider,
        executor: &Arc<ScriptedExecutor>,
    ) -> Connection {
        connection_with(DriverConfig::default(), provider, executor)
    }

    pub fn connection_with(
        config: DriverConfig,
        provider: &SettableTimezoneProvider,
        executor: &Arc<ScriptedExecutor>,
    ) -> Connection {
        Connection::open(
            config,
            Arc::new(provider.clone()),
            Arc::new(TextTemporalCodec::new()),
            executor.clone(),
        )
        .unwrap_or_else(|e| panic!("fixture connection failed: {e}"))
    }

    fn text(s: &str) -> Option<Vec<u8>> {
        Some(s.as_bytes().to_vec())
    }

    /// One row: `ts timestamp`, `d date`, `t time`, `tstz timestamptz`,
    /// `n int4`, `missing timestamp` (NULL).
    pub fn temporal_rows() -> ResultSetData {
        ResultSetData::new(
            vec![
                ColumnDesc::new("ts", PgType::Timestamp),
                ColumnDesc::new("d", PgType::Date),
                ColumnDesc::new("t", PgType::Time),
                ColumnDesc::new("tstz", PgType::TimestampTz),
                ColumnDesc::new("n", PgType::Int4),
                ColumnDesc::new("missing", PgType::Timestamp),
            ],
            vec![vec![
                text("2016-01-31 03:00:00"),
                text("2016-01-31"),
                text("03:00:00"),
                text("2016-01-31 03:00:00+00"),
                text("7"),
                None,
            ]],
        )
    }

    /// `temporal_rows` repeated `count` times.
    pub fn repeated_rows(count: usize) -> ResultSetData {
        let mut data = temporal_rows();
        let row = data.rows[0].clone();
        data.rows = vec![row; count];
        data
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over handle caches and driver errors.

    use super::*;

    /// Assert that a statement's zone cache holds `expected`.
    #[track_caller]
    pub fn assert_statement_cached(stmt: &PreparedStatement, expected: &Zone) {
        assert_eq!(
            stmt.cached_zone().as_ref(),
            Some(expected),
            "statement cache mismatch"
        );
    }

    /// Assert that a statement's zone cache is empty.
    #[track_caller]
    pub fn assert_statement_empty(stmt: &PreparedStatement) {
        assert_eq!(stmt.cached_zone(), None, "statement cache should be empty");
    }

    /// Assert that a cursor's zone cache holds `expected`.
    #[track_caller]
    pub fn assert_cursor_cached(cursor: &RowCursor, expected: &Zone) {
        assert_eq!(
            cursor.cached_zone().as_ref(),
            Some(expected),
            "cursor cache mismatch"
        );
    }

    /// Assert that a cursor's zone cache is empty.
    #[track_caller]
    pub fn assert_cursor_empty(cursor: &RowCursor) {
        assert_eq!(cursor.cached_zone(), None, "cursor cache should be empty");
    }

    /// Assert that a DriverResult is a Statement error.
    #[track_caller]
    pub fn assert_statement_error<T: std::fmt::Debug>(result: &DriverResult<T>) {
        match result {
            Err(DriverError::Statement(_)) => {}
            other => panic!("Expected Statement error, got: {:?}", other),
        }
    }

    /// Assert that a DriverResult is a Cursor error.
    #[track_caller]
    pub fn assert_cursor_error<T: std::fmt::Debug>(result: &DriverResult<T>) {
        match result {
            Err(DriverError::Cursor(_)) => {}
            other => panic!("Expected Cursor error, got: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::zone;
    use super::*;

    #[test]
    fn test_settable_provider_shares_state() {
        let provider = SettableTimezoneProvider::new(zone("GMT+8:00"));
        let handle = provider.clone();
        handle.set_default(zone("GMT-2:00"));
        assert_eq!(provider.current().unwrap(), zone("GMT-2:00"));
        assert_eq!(handle.sample_count(), 1);
        assert!(!provider.is_fast());
        assert!(SettableTimezoneProvider::fast(zone("UTC")).is_fast());
    }

    #[test]
    fn test_settable_provider_unavailable() {
        let provider = SettableTimezoneProvider::new(zone("UTC"));
        provider.set_unavailable();
        assert!(matches!(
            provider.current(),
            Err(ProviderError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_scripted_executor_failures_in_order() {
        let executor = ScriptedExecutor::new();
        executor.fail_next(
            ExecutionError::Rejected {
                reason: "first".to_string(),
            }
            .into(),
        );
        let sets: [Vec<WireParam>; 1] = [Vec::new()];
        let request = ExecuteRequest {
            sql: "DELETE FROM t",
            kind: ExecuteKind::Update,
            parameter_sets: &sets,
        };
        assert!(executor.execute(&request).is_err());
        assert_eq!(
            executor.execute(&request).unwrap(),
            ExecuteResponse::UpdateCounts(vec![1])
        );
        assert_eq!(executor.requests().len(), 2);
    }
}
