//! Error types for chronowire operations

use crate::{PgType, TemporalKind};
use thiserror::Error;

/// Timezone provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Unknown timezone identifier: {identifier}")]
    UnknownZone { identifier: String },

    #[error("Default timezone unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Process default timezone lock poisoned")]
    LockPoisoned,
}

/// Temporal codec errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed {pg_type} value {text:?}: {reason}")]
    Malformed {
        pg_type: PgType,
        text: String,
        reason: String,
    },

    #[error("Local time {local} does not exist in zone {zone}")]
    NonexistentLocalTime { local: String, zone: String },

    #[error("Cannot convert {pg_type} column to {kind}")]
    UnsupportedConversion { kind: TemporalKind, pg_type: PgType },

    #[error("Value out of range: {reason}")]
    OutOfRange { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Bound-statement errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatementError {
    #[error("Invalid parameter index {index}: indices start at 1")]
    InvalidParameterIndex { index: usize },

    #[error("No value specified for parameter {index}")]
    ParameterNotSet { index: usize },

    #[error("Statement did not return a result set: {sql}")]
    NoResultSet { sql: String },

    #[error("Statement returned a result set where an update count was expected: {sql}")]
    UnexpectedResultSet { sql: String },
}

/// Row-cursor errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("Cursor is not positioned on a row")]
    NoCurrentRow,

    #[error("Invalid column index {index}: cursor has {count} columns")]
    InvalidColumnIndex { index: usize, count: usize },

    #[error("Unknown column: {name}")]
    UnknownColumn { name: String },

    #[error("Column {index} has type {actual}, cannot read as {expected}")]
    TypeMismatch {
        index: usize,
        expected: String,
        actual: PgType,
    },

    #[error("Bad value in column {index}: {reason}")]
    BadValue { index: usize, reason: String },
}

/// Errors reported by the execution engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Server rejected statement: {reason}")]
    Rejected { reason: String },

    #[error("Batch entry {index} failed: {reason}")]
    BatchEntryFailed { index: usize, reason: String },

    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },
}

/// Master error type for all chronowire errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Statement error: {0}")]
    Statement(#[from] StatementError),

    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Result type alias for provider lookups.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for codec conversions.
pub type CodecResult<T> = Result<T, CodecError>;

// =============================================================================
// TESTS
// =============================================================================
