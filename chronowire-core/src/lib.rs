//! chronowire core - temporal types and seams
//!
//! Types shared by the codec and the driver: timezones, wire type tags,
//! the provider and codec traits, configuration, and errors. No handle
//! state lives here.

pub mod codec;
pub mod config;
pub mod error;
pub mod provider;
pub mod types;
pub mod zone;

pub use codec::TemporalCodec;
pub use config::{DriverConfig, ZoneCacheMode};
pub use error::{
    CodecError, CodecResult, ConfigError, CursorError, DriverError, DriverResult, ExecutionError,
    ProviderError, ProviderResult, StatementError,
};
pub use provider::{
    process_default_zone, set_process_default_zone, FixedTimezoneProvider,
    SystemTimezoneProvider, TimezoneProvider, TZ_ENV_VAR,
};
pub use types::{ColumnDesc, PgType, RawRow, TemporalKind, Value, WireParam};
pub use zone::{format_offset, Zone};
