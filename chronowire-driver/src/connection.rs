//! Connection: owns the shared collaborators and creates handles.

use std::sync::Arc;

use chronowire_codec::TextTemporalCodec;
use chronowire_core::{
    DriverConfig, DriverResult, StatementError, SystemTimezoneProvider, TemporalCodec,
    TimezoneProvider, WireParam, ZoneCacheMode,
};

use crate::cursor::RowCursor;
use crate::executor::{ExecuteKind, ExecuteRequest, ExecuteResponse, QueryExecutor};
use crate::statement::PreparedStatement;

/// Facts fixed when the connection is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The provider answers cheaply; handles skip their zone cache.
    pub fast_default_zone: bool,
    /// Config allows per-handle zone caching.
    pub zone_cache_enabled: bool,
}

impl Capabilities {
    /// Whether handles read the provider on every implicit operation.
    pub fn bypass_zone_cache(&self) -> bool {
        self.fast_default_zone || !self.zone_cache_enabled
    }
}

/// Collaborators shared by the connection and all of its handles.
pub(crate) struct Session {
    pub(crate) config: DriverConfig,
    pub(crate) capabilities: Capabilities,
    pub(crate) provider: Arc<dyn TimezoneProvider>,
    pub(crate) codec: Arc<dyn TemporalCodec>,
    pub(crate) executor: Arc<dyn QueryExecutor>,
}

/// A logical connection to one server.
pub struct Connection {
    session: Arc<Session>,
}

impl Connection {
    /// Open a connection over the given collaborators.
    ///
    /// The provider's speed is sampled here once and never again.
    pub fn open(
        config: DriverConfig,
        provider: Arc<dyn TimezoneProvider>,
        codec: Arc<dyn TemporalCodec>,
        executor: Arc<dyn QueryExecutor>,
    ) -> DriverResult<Self> {
        config.validate()?;

        let capabilities = Capabilities {
            fast_default_zone: provider.is_fast(),
            zone_cache_enabled: config.zone_cache == ZoneCacheMode::Auto,
        };

        tracing::debug!(
            fast_default_zone = capabilities.fast_default_zone,
            zone_cache = %config.zone_cache,
            max_batch_size = config.max_batch_size,
            "Connection opened"
        );

        Ok(Self {
            session: Arc::new(Session {
                config,
                capabilities,
                provider,
                codec,
                executor,
            }),
        })
    }

    /// Environment config, system provider and the text codec.
    pub fn with_defaults(executor: Arc<dyn QueryExecutor>) -> DriverResult<Self> {
        Self::open(
            DriverConfig::from_env(),
            Arc::new(SystemTimezoneProvider::new()),
            Arc::new(TextTemporalCodec::new()),
            executor,
        )
    }

    pub fn capabilities(&self) -> Capabilities {
        self.session.capabilities
    }

    pub fn config(&self) -> &DriverConfig {
        &self.session.config
    }

    /// A bound statement for `sql`.
    pub fn prepare(&self, sql: impl Into<String>) -> PreparedStatement {
        PreparedStatement::new(Arc::clone(&self.session), sql.into())
    }

    /// Run a parameterless query and return a fresh cursor over its rows.
    pub fn query(&self, sql: &str) -> DriverResult<RowCursor> {
        let no_params: [Vec<WireParam>; 1] = [Vec::new()];
        let request = ExecuteRequest {
            sql,
            kind: ExecuteKind::Query,
            parameter_sets: &no_params,
        };
        match self.session.executor.execute(&request) {
            Ok(ExecuteResponse::Rows(data)) => Ok(RowCursor::new(Arc::clone(&self.session), data)),
            Ok(ExecuteResponse::UpdateCounts(_)) => Err(StatementError::NoResultSet {
                sql: sql.to_string(),
            }
            .into()),
            Err(err) => {
                tracing::warn!(sql, error = %err, "Query failed");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.session.config)
            .field("capabilities", &self.session.capabilities)
            .finish()
    }
}
