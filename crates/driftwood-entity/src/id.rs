//! Entity identifiers and their allocation.
//!
//! An [`EntityId`] packs a *generation* in the high 32 bits and a *slot* in
//! the low 32 bits. A slot is handed out again only after its previous holder
//! has been killed, and every reuse bumps the generation, so an id kept by a
//! script or a collision handler past the entity's death never aliases the
//! newcomer in the same slot.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity id.
///
/// Layout: `[generation: u32 | slot: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    #[inline]
    pub fn new(slot: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | slot as u64)
    }

    /// The slot portion (low 32 bits).
    #[inline]
    pub fn slot(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.slot(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Hands out [`EntityId`]s and takes them back when entities are killed.
///
/// Freed slots wait in a FIFO queue, so the slot of a freshly killed entity
/// is the last one to be reused.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    live: Vec<bool>,
    free: VecDeque<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id, reusing the oldest freed slot when there is one.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(slot) = self.free.pop_front() {
            self.live[slot as usize] = true;
            EntityId::new(slot, self.generations[slot as usize])
        } else {
            let slot = self.generations.len() as u32;
            self.generations.push(0);
            self.live.push(true);
            EntityId::new(slot, 0)
        }
    }

    /// Release a live id. Returns `false` for stale or already released ids.
    pub fn release(&mut self, id: EntityId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        let slot = id.slot() as usize;
        self.live[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push_back(id.slot());
        true
    }

    /// Whether `id` names a currently live entity.
    pub fn is_live(&self, id: EntityId) -> bool {
        let slot = id.slot() as usize;
        slot < self.generations.len() && self.live[slot] && self.generations[slot] == id.generation()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
