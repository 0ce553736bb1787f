//! The [`EntityRegistry`]: sole owner of all live entities and of the
//! spritesheets they share.
//!
//! Entities are stored by id slot and iterated in insertion order, which is
//! also the order collision checks observe them in. One entity may be designated the player; the
//! designation is cleared when that entity is killed.

use tracing::debug;

use crate::descriptor::EntityDescriptor;
use crate::entity::Entity;
use crate::id::{EntityAllocator, EntityId};
use crate::spritesheet::{Spritesheet, SpritesheetId};
use crate::EntityError;

#[derive(Debug, Default)]
pub struct EntityRegistry {
    allocator: EntityAllocator,
    /// Indexed by [`EntityId::slot`].
    slots: Vec<Option<Entity>>,
    order: Vec<EntityId>,
    spritesheets: Vec<Spritesheet>,
    player: Option<EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- entities -----------------------------------------------------------

    /// Create an entity from its descriptor. The entity starts unplaced
    /// (no tile) at pixel `(0, 0)` on layer 0.
    pub fn spawn(
        &mut self,
        filename: &str,
        desc: EntityDescriptor,
        spritesheet: SpritesheetId,
    ) -> EntityId {
        let id = self.allocator.allocate();
        let slot = id.slot() as usize;
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot] = Some(Entity::from_descriptor(id, filename, desc, spritesheet));
        self.order.push(id);
        debug!(entity = %id, filename, "spawned entity");
        id
    }

    /// Remove an entity, returning it. The player designation is cleared if
    /// it pointed at this entity.
    pub fn kill(&mut self, id: EntityId) -> Option<Entity> {
        self.get(id)?;
        let entity = self.slots[id.slot() as usize].take()?;
        self.order.retain(|&other| other != id);
        self.allocator.release(id);
        if self.player == Some(id) {
            self.player = None;
        }
        debug!(entity = %id, "killed entity");
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.slot() as usize)?
            .as_ref()
            .filter(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.slot() as usize)?
            .as_mut()
            .filter(|e| e.id == id)
    }

    /// Like [`get`](Self::get), but an error for unknown ids.
    pub fn require(&self, id: EntityId) -> Result<&Entity, EntityError> {
        self.get(id).ok_or(EntityError::UnknownEntity { entity: id })
    }

    /// Like [`get_mut`](Self::get_mut), but an error for unknown ids.
    pub fn require_mut(&mut self, id: EntityId) -> Result<&mut Entity, EntityError> {
        self.get_mut(id).ok_or(EntityError::UnknownEntity { entity: id })
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.allocator.is_live(id)
    }

    /// Live entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|&id| self.get(id))
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // -- player ---------------------------------------------------------------

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn set_player(&mut self, id: EntityId) -> Result<(), EntityError> {
        self.require(id)?;
        self.player = Some(id);
        Ok(())
    }

    pub fn is_player(&self, id: EntityId) -> bool {
        self.player == Some(id)
    }

    // -- spritesheets ---------------------------------------------------------

    /// The sheet already loaded for `filename`, if any.
    pub fn spritesheet_id(&self, filename: &str) -> Option<SpritesheetId> {
        self.spritesheets
            .iter()
            .position(|s| s.filename == filename)
            .map(SpritesheetId)
    }

    /// Add a sheet, or return the existing one with the same filename.
    pub fn add_spritesheet(&mut self, sheet: Spritesheet) -> SpritesheetId {
        if let Some(existing) = self.spritesheet_id(&sheet.filename) {
            return existing;
        }
        self.spritesheets.push(sheet);
        SpritesheetId(self.spritesheets.len() - 1)
    }

    pub fn spritesheet(&self, id: SpritesheetId) -> Option<&Spritesheet> {
        self.spritesheets.get(id.0)
    }

    pub fn spritesheets(&self) -> &[Spritesheet] {
        &self.spritesheets
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(image: &str) -> EntityDescriptor {
        EntityDescriptor::from_json(serde_json::json!({
            "collision": true, "width": 16, "height": 16, "speed": 32,
            "members": [0], "afps": 0, "image": image
        }))
        .unwrap()
    }

    #[test]
    fn spawn_and_kill() {
        let mut reg = EntityRegistry::new();
        let sheet = reg.add_spritesheet(Spritesheet::new("a.png", 32, 32));
        let a = reg.spawn("a.json", descriptor("a.png"), sheet);
        let b = reg.spawn("b.json", descriptor("a.png"), sheet);
        assert_eq!(reg.ids(), vec![a, b]);

        assert!(reg.kill(a).is_some());
        assert!(reg.kill(a).is_none());
        assert!(!reg.contains(a));
        assert_eq!(reg.len(), 1);
        assert!(matches!(
            reg.require(a),
            Err(EntityError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn killed_slot_is_reused_with_new_generation() {
        let mut reg = EntityRegistry::new();
        let sheet = reg.add_spritesheet(Spritesheet::new("a.png", 32, 32));
        let a = reg.spawn("a.json", descriptor("a.png"), sheet);
        reg.kill(a);
        let c = reg.spawn("c.json", descriptor("a.png"), sheet);
        assert_eq!(c.slot(), a.slot());
        assert_ne!(c, a);
        assert!(reg.get(a).is_none());
        assert!(reg.get_mut(a).is_none());
        assert!(reg.kill(a).is_none());
        assert_eq!(reg.get(c).map(|e| e.id), Some(c));
    }

    #[test]
    fn iteration_keeps_insertion_order_across_slot_reuse() {
        let mut reg = EntityRegistry::new();
        let sheet = reg.add_spritesheet(Spritesheet::new("a.png", 32, 32));
        let a = reg.spawn("a.json", descriptor("a.png"), sheet);
        let b = reg.spawn("b.json", descriptor("a.png"), sheet);
        reg.kill(a);
        let c = reg.spawn("c.json", descriptor("a.png"), sheet);
        assert_eq!(c.slot(), a.slot());

        let seen: Vec<EntityId> = reg.iter().map(|e| e.id).collect();
        assert_eq!(seen, vec![b, c]);
        assert_eq!(reg.ids(), seen);
    }

    #[test]
    fn spritesheets_are_shared_by_filename() {
        let mut reg = EntityRegistry::new();
        let first = reg.add_spritesheet(Spritesheet::new("npc.png", 64, 32));
        let again = reg.add_spritesheet(Spritesheet::new("npc.png", 64, 32));
        let other = reg.add_spritesheet(Spritesheet::new("hero.png", 64, 32));
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(reg.spritesheets().len(), 2);
        assert_eq!(reg.spritesheet_id("hero.png"), Some(other));
    }

    #[test]
    fn killing_the_player_clears_the_designation() {
        let mut reg = EntityRegistry::new();
        let sheet = reg.add_spritesheet(Spritesheet::new("a.png", 32, 32));
        let hero = reg.spawn("hero.json", descriptor("a.png"), sheet);
        reg.set_player(hero).unwrap();
        assert!(reg.is_player(hero));
        reg.kill(hero);
        assert_eq!(reg.player(), None);
    }
}
