//! Engine state snapshots with BLAKE3 integrity hashes.
//!
//! An [`EngineSnapshot`] captures the focused area, the scheduler clock and
//! every entity's movement state. The hash covers all of it, so two engines
//! fed the same resources and the same sequence of requests and tick
//! lengths produce identical hashes.
//!
//! # Example
//!
//! ```
//! use driftwood_engine::prelude::*;
//! use serde_json::json;
//!
//! let resources = MemoryResources::new().with_json("room.json", json!({
//!     "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
//!     "layers": [{ "type": "tilelayer", "visible": true, "data": [1] }],
//!     "tilesets": []
//! }));
//! let mut engine = Engine::new(EngineConfig::default(), resources, NullScripts);
//! engine.focus("room.json");
//!
//! let snapshot = engine.snapshot().unwrap();
//! assert_eq!(snapshot.area.as_deref(), Some("room.json"));
//! assert_eq!(snapshot.hash.len(), 64);
//! assert!(snapshot.verify().unwrap());
//! ```
//!
//! # What Is NOT Captured
//!
//! - **Tile graph** -- rebuilt from the area's descriptor on focus.
//! - **Spritesheets** -- immutable after loading.
//! - **Collision handler and script bridge** -- host-supplied callbacks.

use driftwood_entity::prelude::{Entity, EntityId, MovementMode, Velocity};
use driftwood_map::prelude::{ExitTarget, TilePos};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::EngineError;

// ---------------------------------------------------------------------------
// EntityState
// ---------------------------------------------------------------------------

/// Movement-relevant state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: EntityId,
    pub filename: String,
    pub layer: usize,
    pub x: i64,
    pub y: i64,
    pub tile: Option<TilePos>,
    pub velocity: Velocity,
    pub next_velocity: Velocity,
    pub mode: MovementMode,
    pub frame: usize,
    pub next_area: Option<ExitTarget>,
}

impl From<&Entity> for EntityState {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            filename: entity.filename.clone(),
            layer: entity.layer,
            x: entity.x,
            y: entity.y,
            tile: entity.tile,
            velocity: entity.velocity,
            next_velocity: entity.next_velocity,
            mode: entity.mode.clone(),
            frame: entity.animation.current_index(),
            next_area: entity.next_area.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineSnapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Resource name of the focused area.
    pub area: Option<String>,
    pub player: Option<EntityId>,
    /// Scheduler advances so far.
    pub tick_count: u64,
    /// Scheduler milliseconds so far.
    pub elapsed_ms: u64,
    /// Entities in registry order.
    pub entities: Vec<EntityState>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of everything above.
    pub hash: String,
}

impl EngineSnapshot {
    /// Recompute the hash and compare it to the stored one.
    pub fn verify(&self) -> Result<bool, EngineError> {
        let expected = compute_hash(
            self.area.as_deref(),
            self.player,
            self.tick_count,
            self.elapsed_ms,
            &self.entities,
        )?;
        Ok(expected == self.hash)
    }
}

/// BLAKE3 hex digest over a canonical JSON rendering of the state.
fn compute_hash(
    area: Option<&str>,
    player: Option<EntityId>,
    tick_count: u64,
    elapsed_ms: u64,
    entities: &[EntityState],
) -> Result<String, EngineError> {
    #[derive(Serialize)]
    struct HashableState<'a> {
        area: Option<&'a str>,
        player: Option<EntityId>,
        tick_count: u64,
        elapsed_ms: u64,
        entities: &'a [EntityState],
    }

    let json_bytes = serde_json::to_vec(&HashableState {
        area,
        player,
        tick_count,
        elapsed_ms,
        entities,
    })?;
    Ok(blake3::hash(&json_bytes).to_hex().to_string())
}

impl Engine {
    pub fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let area = self.area.current().map(str::to_owned);
        let player = self.entities.player();
        let tick_count = self.scheduler.tick_count();
        let elapsed_ms = self.scheduler.elapsed_ms();
        let entities: Vec<EntityState> = self.entities.iter().map(EntityState::from).collect();
        let hash = compute_hash(area.as_deref(), player, tick_count, elapsed_ms, &entities)?;
        Ok(EngineSnapshot {
            area,
            player,
            tick_count,
            elapsed_ms,
            entities,
            hash,
        })
    }

    pub fn state_hash(&self) -> Result<String, EngineError> {
        Ok(self.snapshot()?.hash)
    }
}
