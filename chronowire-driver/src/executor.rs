//! Seam between the handles and whatever talks to the server.

use chronowire_core::{ColumnDesc, DriverResult, RawRow, WireParam};

/// How the caller intends to consume the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecuteKind {
    /// Result set or update count, whichever the statement yields.
    Execute,
    /// Update count expected.
    Update,
    /// Result set expected.
    Query,
    /// Several parameter sets; one update count each.
    Batch,
}

/// One round-trip to the server.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteRequest<'a> {
    pub sql: &'a str,
    pub kind: ExecuteKind,
    /// One entry per execution; a single entry for non-batch kinds.
    pub parameter_sets: &'a [Vec<WireParam>],
}

/// Columns and raw rows of a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSetData {
    pub columns: Vec<ColumnDesc>,
    pub rows: Vec<RawRow>,
}

impl ResultSetData {
    pub fn new(columns: Vec<ColumnDesc>, rows: Vec<RawRow>) -> Self {
        Self { columns, rows }
    }
}

/// What the server sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteResponse {
    /// One count per parameter set.
    UpdateCounts(Vec<u64>),
    Rows(ResultSetData),
}

/// Runs statements against a server.
///
/// Wire protocol and transport live behind this trait. Errors should be
/// `DriverError::Execution`; batch failures report the failing entry's
/// index within `parameter_sets`.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, request: &ExecuteRequest<'_>) -> DriverResult<ExecuteResponse>;
}
