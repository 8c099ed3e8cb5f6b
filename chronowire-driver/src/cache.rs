//! Per-handle memo of the default timezone.
//!
//! # State Transition Diagram
//!
//! ```text
//!            resolve(None) / sample once
//! (empty) ──────────────────────────────→ (zone)
//!    ↑                                      │
//!    └───────────── invalidate() ───────────┘
//!
//! resolve(Some(z)) returns z in either state without touching the slot.
//! resolve(None) in (zone) returns the stored zone.
//! ```
//!
//! A populated slot never changes to a different zone without passing
//! through empty.

use chronowire_core::Zone;

/// Slot holding the last sampled default zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionCache {
    slot: Option<Zone>,
}

impl ResolutionCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Pick the zone for one temporal operation.
    ///
    /// An explicit zone is returned as is. Otherwise the stored zone is
    /// returned, or `sample` is called once and its result stored. Sampling
    /// errors propagate and leave the slot empty.
    pub fn resolve_with<E, F>(&mut self, explicit: Option<&Zone>, sample: F) -> Result<Zone, E>
    where
        F: FnOnce() -> Result<Zone, E>,
    {
        if let Some(zone) = explicit {
            return Ok(*zone);
        }
        if let Some(zone) = self.slot {
            return Ok(zone);
        }
        let zone = sample()?;
        self.slot = Some(zone);
        Ok(zone)
    }

    /// Forget the stored zone. No-op when already empty.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub(crate) fn is_populated(&self) -> bool {
        self.slot.is_some()
    }

    /// The stored zone. Exposed for tests only.
    #[cfg(any(test, feature = "inspect"))]
    pub fn cached(&self) -> Option<Zone> {
        self.slot
    }
}
