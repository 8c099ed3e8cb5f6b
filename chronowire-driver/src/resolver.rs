//! Zone resolution for one handle: cache, bypass and invalidation policy.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chronowire_core::{ProviderResult, TimezoneProvider, Zone};

use crate::cache::ResolutionCache;
use crate::policy::{HandleEvent, InvalidationPolicy};

/// Resolves the zone for temporal operations on one handle.
///
/// With `bypass` set (fast provider, or caching disabled by config) every
/// implicit operation asks the provider and the cache stays empty. The flag
/// is fixed when the owning connection is opened.
pub struct ZoneResolver<S: InvalidationPolicy> {
    provider: Arc<dyn TimezoneProvider>,
    cache: ResolutionCache,
    bypass: bool,
    _scope: PhantomData<S>,
}

impl<S: InvalidationPolicy> ZoneResolver<S> {
    pub fn new(provider: Arc<dyn TimezoneProvider>, bypass: bool) -> Self {
        Self {
            provider,
            cache: ResolutionCache::new(),
            bypass,
            _scope: PhantomData,
        }
    }

    /// Zone for one temporal operation; `explicit` wins when given.
    pub fn resolve(&mut self, explicit: Option<&Zone>) -> ProviderResult<Zone> {
        if let Some(zone) = explicit {
            return Ok(*zone);
        }

        if self.bypass {
            let zone = self.provider.current()?;
            tracing::trace!(handle = S::HANDLE, zone = %zone, "Default zone read (cache bypassed)");
            return Ok(zone);
        }

        let provider = &self.provider;
        self.cache.resolve_with(None, || {
            let zone = provider.current()?;
            tracing::trace!(handle = S::HANDLE, zone = %zone, "Default zone sampled");
            Ok(zone)
        })
    }

    /// Apply the policy for `event`.
    pub fn notify(&mut self, event: HandleEvent) {
        if S::invalidates_on(event) && self.cache.is_populated() {
            self.cache.invalidate();
            tracing::trace!(handle = S::HANDLE, %event, "Default zone cache invalidated");
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// The cached zone. Exposed for tests only.
    #[cfg(any(test, feature = "inspect"))]
    pub fn cached_zone(&self) -> Option<Zone> {
        self.cache.cached()
    }
}

impl<S: InvalidationPolicy> fmt::Debug for ZoneResolver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneResolver")
            .field("handle", &S::HANDLE)
            .field("cache", &self.cache)
            .field("bypass", &self.bypass)
            .finish()
    }
}
