//! Frame animation scheduling and source rectangles.

use driftwood_entity::prelude::{EntityId, SourceRect};
use tracing::trace;

use crate::engine::Engine;
use crate::scheduler::TickTarget;

impl Engine {
    /// Register the entity's animation callback. Zero `afps` registers
    /// nothing.
    pub(crate) fn schedule_animation(&mut self, id: EntityId) {
        let Some(interval) = self
            .entities
            .get(id)
            .and_then(|entity| entity.animation.interval_ms())
        else {
            return;
        };
        self.scheduler.register(TickTarget::Animate(id), interval);
    }

    pub(crate) fn advance_animation(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        if entity.animation.advance() {
            trace!(entity = %id, frame = entity.animation.current_index(), "animation frame");
            self.frame.redraw = true;
        }
    }

    /// Spritesheet rectangle of the entity's current frame.
    pub fn source_rect(&self, id: EntityId) -> Option<SourceRect> {
        let entity = self.entities.get(id)?;
        let sheet = self.entities.spritesheet(entity.spritesheet)?;
        entity.source_rect(sheet)
    }
}
