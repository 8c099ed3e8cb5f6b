//! chronowire driver - connection, bound statements and row cursors
//!
//! Each statement and cursor keeps its own memo of the default timezone so
//! that a run of temporal binds or reads costs one provider lookup:
//!
//! - statements forget the memo whenever they execute (single or batch,
//!   success or failure);
//! - cursors keep it for their whole life;
//! - an explicit zone is used as given and never touches the memo;
//! - with a fast provider, or `ZoneCacheMode::Disabled`, nothing is memoized.

pub mod cache;
pub mod connection;
pub mod cursor;
pub mod executor;
pub mod policy;
pub mod resolver;
pub mod statement;

pub use cache::ResolutionCache;
pub use connection::{Capabilities, Connection};
pub use cursor::RowCursor;
pub use executor::{ExecuteKind, ExecuteRequest, ExecuteResponse, QueryExecutor, ResultSetData};
pub use policy::{CursorScope, HandleEvent, InvalidationPolicy, StatementScope};
pub use resolver::ZoneResolver;
pub use statement::{ExecuteOutcome, PreparedStatement};
