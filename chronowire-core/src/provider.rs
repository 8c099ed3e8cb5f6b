//! Sources of "the current default timezone".
//!
//! The default zone is process-wide mutable state: any thread may change it at
//! any time. Providers are the only way the driver observes it.

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::{ProviderError, ProviderResult, Zone};

/// Environment variable consulted before the OS zone.
pub const TZ_ENV_VAR: &str = "TZ";

static PROCESS_DEFAULT_ZONE: Lazy<RwLock<Option<Zone>>> = Lazy::new(|| RwLock::new(None));

/// Source of the current default timezone.
pub trait TimezoneProvider: Send + Sync {
    /// The default zone right now.
    fn current(&self) -> ProviderResult<Zone>;

    /// Whether `current()` is cheap enough that memoizing it is pointless.
    fn is_fast(&self) -> bool;
}

/// Override the process-wide default zone. `None` restores the platform default.
pub fn set_process_default_zone(zone: Option<Zone>) -> ProviderResult<()> {
    let mut guard = PROCESS_DEFAULT_ZONE
        .write()
        .map_err(|_| ProviderError::LockPoisoned)?;
    *guard = zone;
    Ok(())
}

/// The process-wide override, if one is set.
pub fn process_default_zone() -> ProviderResult<Option<Zone>> {
    PROCESS_DEFAULT_ZONE
        .read()
        .map(|guard| *guard)
        .map_err(|_| ProviderError::LockPoisoned)
}

/// Reads the process default: override, then `TZ`, then the OS zone.
///
/// Every call walks that chain, including an OS lookup when nothing earlier
/// answers, so this provider is not fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimezoneProvider;

impl SystemTimezoneProvider {
    pub fn new() -> Self {
        Self
    }

    fn from_env() -> ProviderResult<Option<Zone>> {
        match std::env::var(TZ_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => {
                // POSIX allows a leading ':' before a zoneinfo path.
                Zone::parse(value.trim_start_matches(':')).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn from_os() -> ProviderResult<Zone> {
        let name = iana_time_zone::get_timezone().map_err(|e| ProviderError::Unavailable {
            reason: e.to_string(),
        })?;
        Zone::parse(&name)
    }
}

impl TimezoneProvider for SystemTimezoneProvider {
    fn current(&self) -> ProviderResult<Zone> {
        if let Some(zone) = process_default_zone()? {
            return Ok(zone);
        }
        if let Some(zone) = Self::from_env()? {
            return Ok(zone);
        }
        let zone = Self::from_os()?;
        tracing::trace!(zone = %zone, "Default timezone read from OS");
        Ok(zone)
    }

    fn is_fast(&self) -> bool {
        false
    }
}

/// Always answers the same zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimezoneProvider {
    zone: Zone,
}

impl FixedTimezoneProvider {
    pub fn new(zone: Zone) -> Self {
        Self { zone }
    }

    pub fn utc() -> Self {
        Self::new(Zone::utc())
    }
}

impl TimezoneProvider for FixedTimezoneProvider {
    fn current(&self) -> ProviderResult<Zone> {
        Ok(self.zone)
    }

    fn is_fast(&self) -> bool {
        true
    }
}
