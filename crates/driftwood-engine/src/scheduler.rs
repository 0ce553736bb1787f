//! Millisecond tick scheduler.
//!
//! The host reports elapsed wall time to [`TickScheduler::advance`]; every
//! registration whose delay has run out since it last fired is returned,
//! in registration order, with the time it accumulated. A delay of `0`
//! fires on every advance.
//!
//! Registrations are keyed by [`TickTarget`] rather than by callback, so
//! registering the same target twice updates it in place.
//!
//! # Example
//!
//! ```
//! use driftwood_engine::prelude::*;
//!
//! let hero = EntityId::new(0, 0);
//! let mut scheduler = TickScheduler::new();
//! scheduler.register(TickTarget::Walk(hero), 0);
//! scheduler.register(TickTarget::Animate(hero), 100);
//!
//! let due = scheduler.advance(60);
//! assert_eq!(due.len(), 1);
//! let due = scheduler.advance(60);
//! assert_eq!(due.len(), 2);
//! assert_eq!(due[1].elapsed_ms, 120);
//! ```

use driftwood_entity::prelude::EntityId;
use tracing::trace;

// ---------------------------------------------------------------------------
// TickTarget
// ---------------------------------------------------------------------------

/// What a registration drives when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickTarget {
    /// One tile-mode walk step for the entity.
    Walk(EntityId),
    /// One animation frame advance for the entity.
    Animate(EntityId),
}

impl TickTarget {
    pub fn entity(self) -> EntityId {
        match self {
            TickTarget::Walk(id) | TickTarget::Animate(id) => id,
        }
    }
}

/// A registration that came due during [`TickScheduler::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueCallback {
    pub target: TickTarget,
    /// Milliseconds since this registration last fired (or was registered).
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
struct Registration {
    target: TickTarget,
    delay_ms: u64,
    pending_ms: u64,
}

// ---------------------------------------------------------------------------
// TickScheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TickScheduler {
    registrations: Vec<Registration>,
    /// Number of `advance` calls so far.
    tick_count: u64,
    /// Total milliseconds advanced.
    elapsed_ms: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `target` every `delay_ms` milliseconds. Registering an
    /// existing target updates its delay and keeps its place in the order.
    pub fn register(&mut self, target: TickTarget, delay_ms: u64) {
        if let Some(existing) = self.registrations.iter_mut().find(|r| r.target == target) {
            existing.delay_ms = delay_ms;
            return;
        }
        trace!(?target, delay_ms, "registered tick target");
        self.registrations.push(Registration {
            target,
            delay_ms,
            pending_ms: 0,
        });
    }

    /// Remove a registration. Returns whether it existed.
    pub fn unregister(&mut self, target: TickTarget) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.target != target);
        let removed = self.registrations.len() != before;
        if removed {
            trace!(?target, "unregistered tick target");
        }
        removed
    }

    /// Remove every registration driving `entity`.
    pub fn unregister_entity(&mut self, entity: EntityId) {
        self.registrations.retain(|r| r.target.entity() != entity);
    }

    pub fn is_registered(&self, target: TickTarget) -> bool {
        self.registrations.iter().any(|r| r.target == target)
    }

    /// Registered targets in firing order.
    pub fn targets(&self) -> Vec<TickTarget> {
        self.registrations.iter().map(|r| r.target).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Advance time and collect the registrations that came due.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<DueCallback> {
        self.tick_count += 1;
        self.elapsed_ms += elapsed_ms;

        let mut due = Vec::new();
        for reg in &mut self.registrations {
            reg.pending_ms += elapsed_ms;
            if reg.pending_ms >= reg.delay_ms {
                due.push(DueCallback {
                    target: reg.target,
                    elapsed_ms: reg.pending_ms,
                });
                // Whole periods missed during a long advance are dropped; the
                // remainder keeps the phase.
                reg.pending_ms = match reg.delay_ms {
                    0 => 0,
                    delay => reg.pending_ms % delay,
                };
            }
        }
        due
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (EntityId, EntityId) {
        (EntityId::new(0, 0), EntityId::new(1, 0))
    }

    // -- 1. Delay 0 fires every advance ---------------------------------------

    #[test]
    fn zero_delay_fires_every_advance() {
        let (a, _) = ids();
        let mut s = TickScheduler::new();
        s.register(TickTarget::Walk(a), 0);
        for _ in 0..3 {
            let due = s.advance(16);
            assert_eq!(due, vec![DueCallback { target: TickTarget::Walk(a), elapsed_ms: 16 }]);
        }
        assert_eq!(s.tick_count(), 3);
        assert_eq!(s.elapsed_ms(), 48);
    }

    // -- 2. Delayed registrations accumulate ----------------------------------

    #[test]
    fn delayed_registration_accumulates_time() {
        let (a, _) = ids();
        let mut s = TickScheduler::new();
        s.register(TickTarget::Animate(a), 250);
        assert!(s.advance(100).is_empty());
        assert!(s.advance(100).is_empty());
        let due = s.advance(100);
        assert_eq!(due[0].elapsed_ms, 300);
        // 50 ms carried over from the last firing.
        assert!(s.advance(100).is_empty());
        assert_eq!(s.advance(100).len(), 1);
    }

    #[test]
    fn remainder_carries_into_the_next_period() {
        let (a, _) = ids();
        let mut s = TickScheduler::new();
        s.register(TickTarget::Animate(a), 100);
        let fired: usize = (0..125).map(|_| s.advance(16).len()).sum();
        assert_eq!(fired, 20);
    }

    #[test]
    fn long_advance_fires_once_and_keeps_phase() {
        let (a, _) = ids();
        let mut s = TickScheduler::new();
        s.register(TickTarget::Animate(a), 100);
        assert_eq!(s.advance(1030).len(), 1);
        assert!(s.advance(60).is_empty());
        assert_eq!(s.advance(10).len(), 1);
    }

    // -- 3. Registration order is firing order --------------------------------

    #[test]
    fn due_targets_follow_registration_order() {
        let (a, b) = ids();
        let mut s = TickScheduler::new();
        s.register(TickTarget::Walk(b), 0);
        s.register(TickTarget::Walk(a), 0);
        s.register(TickTarget::Walk(b), 5);
        let due: Vec<_> = s.advance(10).into_iter().map(|d| d.target).collect();
        assert_eq!(due, vec![TickTarget::Walk(b), TickTarget::Walk(a)]);
        assert_eq!(s.len(), 2);
    }

    // -- 4. Unregister ---------------------------------------------------------

    #[test]
    fn unregister_removes_only_that_target() {
        let (a, b) = ids();
        let mut s = TickScheduler::new();
        s.register(TickTarget::Walk(a), 0);
        s.register(TickTarget::Animate(a), 0);
        s.register(TickTarget::Walk(b), 0);

        assert!(s.unregister(TickTarget::Walk(a)));
        assert!(!s.unregister(TickTarget::Walk(a)));
        assert_eq!(s.targets(), vec![TickTarget::Animate(a), TickTarget::Walk(b)]);

        s.unregister_entity(a);
        assert_eq!(s.targets(), vec![TickTarget::Walk(b)]);
        assert!(!s.is_registered(TickTarget::Animate(a)));
    }
}
