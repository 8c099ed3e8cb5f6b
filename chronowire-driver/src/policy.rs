//! Lifecycle events and which of them reset a handle's zone cache.

use std::fmt;

/// Something that happened on a statement or cursor handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleEvent {
    /// A date/time/timestamp parameter was bound (implicit or explicit zone).
    TemporalBound,
    /// A non-temporal parameter was bound.
    NonTemporalBound,
    /// A NULL parameter was bound, temporal or not.
    NullBound,
    /// The current parameter set was appended to the pending batch.
    BatchAdded,
    /// All bound parameters were cleared.
    ParametersCleared,
    /// A single execution finished (execute, update or query), either way.
    Executed,
    /// A batch execution finished, either way.
    BatchExecuted,
    /// The cursor moved to another row.
    RowAdvanced,
    /// A column was read (temporal or not).
    ColumnRead,
}

impl fmt::Display for HandleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Decides which handle events empty the zone cache.
pub trait InvalidationPolicy {
    /// Handle kind, for logs.
    const HANDLE: &'static str;

    fn invalidates_on(event: HandleEvent) -> bool;
}

/// Bound statements: reset at every execution boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementScope;

impl InvalidationPolicy for StatementScope {
    const HANDLE: &'static str = "statement";

    fn invalidates_on(event: HandleEvent) -> bool {
        matches!(event, HandleEvent::Executed | HandleEvent::BatchExecuted)
    }
}

/// Row cursors: never reset. A new execution yields a new cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorScope;

impl InvalidationPolicy for CursorScope {
    const HANDLE: &'static str = "cursor";

    fn invalidates_on(_event: HandleEvent) -> bool {
        false
    }
}
