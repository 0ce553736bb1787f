//! The [`Engine`]: owner of the active area, the entities on it and the
//! tick scheduler that drives them.
//!
//! Each call to [`Engine::tick`]:
//!
//! 1. Advances the [`TickScheduler`] by the elapsed milliseconds.
//! 2. Runs every due walk or animation callback in registration order. A
//!    callback whose entity was killed earlier in the same tick is skipped.
//! 3. Returns a [`TickReport`] summarising what changed, and resets the
//!    per-tick accumulator.
//!
//! Walk errors never escape `tick`: the failing entity is halted and the
//! error is logged. Operations called directly by the host (`insert_entity`,
//! `teleport`, `request_move`) return their errors instead.

use driftwood_entity::prelude::*;
use driftwood_map::prelude::{TileGraph, TilePos};
use tracing::{debug, error, info, warn};

use crate::area::AreaManager;
use crate::config::EngineConfig;
use crate::resource::ResourceLoader;
use crate::scheduler::{DueCallback, TickScheduler, TickTarget};
use crate::script::{self, ScriptBridge};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Obstacle
// ---------------------------------------------------------------------------

/// What a refused move ran into, as reported to the collision handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obstacle {
    /// A blocking tile, or `None` when the move would leave the map.
    Tile(Option<TilePos>),
    /// Another entity overlapping the mover.
    Entity(EntityId),
}

/// Notification sink for refused moves.
pub type CollisionHandler = Box<dyn FnMut(EntityId, &Obstacle)>;

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// What happened during one [`Engine::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Milliseconds this report covers.
    pub elapsed_ms: u64,
    /// Callbacks dispatched.
    pub callbacks: usize,
    /// Something visible changed (an entity moved, stopped, was killed, or
    /// changed animation frame).
    pub redraw: bool,
    /// Entities removed during the tick.
    pub removed: Vec<EntityId>,
    /// Area focused by a player exit during the tick.
    pub entered_area: Option<String>,
}

impl TickReport {
    /// Fold a later report into this one.
    pub fn absorb(&mut self, later: TickReport) {
        self.elapsed_ms += later.elapsed_ms;
        self.callbacks += later.callbacks;
        self.redraw |= later.redraw;
        self.removed.extend(later.removed);
        if later.entered_area.is_some() {
            self.entered_area = later.entered_area;
        }
    }
}

/// Changes accumulated between two reports.
#[derive(Debug, Default)]
pub(crate) struct FrameState {
    pub(crate) redraw: bool,
    pub(crate) removed: Vec<EntityId>,
    pub(crate) entered_area: Option<String>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) area: AreaManager,
    pub(crate) entities: EntityRegistry,
    pub(crate) scheduler: TickScheduler,
    pub(crate) scripts: Box<dyn ScriptBridge>,
    pub(crate) resources: Box<dyn ResourceLoader>,
    pub(crate) collision_handler: Option<CollisionHandler>,
    pub(crate) frame: FrameState,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        resources: impl ResourceLoader + 'static,
        scripts: impl ScriptBridge + 'static,
    ) -> Self {
        Self {
            config,
            area: AreaManager::new(),
            entities: EntityRegistry::new(),
            scheduler: TickScheduler::new(),
            scripts: Box::new(scripts),
            resources: Box::new(resources),
            collision_handler: None,
            frame: FrameState::default(),
        }
    }

    // -- accessors ------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn area(&self) -> &AreaManager {
        &self.area
    }

    /// Tile graph of the focused area.
    pub fn tilemap(&self) -> Option<&TileGraph> {
        self.area.tilemap()
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn player(&self) -> Option<EntityId> {
        self.entities.player()
    }

    pub fn set_player(&mut self, id: EntityId) -> Result<(), EngineError> {
        self.entities.set_player(id)?;
        Ok(())
    }

    /// Install the handler notified of every refused move.
    pub fn set_collision_handler(&mut self, handler: impl FnMut(EntityId, &Obstacle) + 'static) {
        self.collision_handler = Some(Box::new(handler));
    }

    pub fn clear_collision_handler(&mut self) {
        self.collision_handler = None;
    }

    // -- areas ------------------------------------------------------------------

    /// Focus an area by resource name. Returns `false` (keeping the current
    /// area) if it cannot be loaded.
    pub fn focus(&mut self, name: &str) -> bool {
        match self
            .area
            .focus(name, self.resources.as_mut(), self.scripts.as_mut())
        {
            Ok(()) => {
                self.frame.redraw = true;
                true
            }
            Err(err) => {
                warn!(area = name, %err, "failed to focus area");
                false
            }
        }
    }

    // -- entity lifecycle --------------------------------------------------------

    /// Load an entity descriptor and place the new entity at tile `(x, y)`
    /// on `layer` of the focused area.
    pub fn insert_entity(
        &mut self,
        filename: &str,
        layer: usize,
        x: i64,
        y: i64,
    ) -> Result<EntityId, EngineError> {
        self.area.require_tilemap()?;
        let raw = self.resources.request_json(filename)?;
        let desc = EntityDescriptor::from_json(raw).map_err(|source| EntityError::Descriptor {
            filename: filename.to_owned(),
            source,
        })?;

        let sheet = match self.entities.spritesheet_id(&desc.image) {
            Some(sheet) => sheet,
            None => {
                let info = self.resources.request_image(&desc.image)?;
                self.entities.add_spritesheet(Spritesheet::new(
                    desc.image.as_str(),
                    info.width,
                    info.height,
                ))
            }
        };

        let id = self.entities.spawn(filename, desc, sheet);
        if let Err(err) = self.teleport(id, layer, x, y) {
            self.entities.kill(id);
            return Err(err);
        }
        self.schedule_animation(id);
        info!(entity = %id, filename, layer, x, y, "inserted entity");
        Ok(id)
    }

    /// Remove an entity and every callback driving it. Returns whether it
    /// was alive.
    pub fn kill(&mut self, id: EntityId) -> bool {
        self.scheduler.unregister_entity(id);
        if self.entities.kill(id).is_none() {
            return false;
        }
        self.frame.removed.push(id);
        self.frame.redraw = true;
        true
    }

    /// Move an entity to tile `(x, y)` on `layer` of the focused area.
    ///
    /// Sub-tile progress is discarded and the destination's `on_tile` hook
    /// fires, followed by the layer's `on_layer` hook when the layer
    /// changed. Out-of-range targets leave the entity untouched.
    pub fn teleport(&mut self, id: EntityId, layer: usize, x: i64, y: i64) -> Result<(), EngineError> {
        let previous_layer = self.entities.require(id)?.layer;
        if let Err(err) = self.place(id, layer, TilePos::new(x, y)) {
            error!(entity = %id, %err, "teleport rejected");
            return Err(err);
        }
        self.fire_on_tile(id)?;
        if layer != previous_layer {
            self.fire_on_layer(id)?;
        }
        Ok(())
    }

    // -- movement requests ----------------------------------------------------

    /// Ask an entity to walk in direction `(dx, dy)`; `(0, 0)` asks it to
    /// stop at the next tile boundary. Components outside `{-1, 0, 1}` are
    /// treated as `0`.
    pub fn request_move(&mut self, id: EntityId, dx: i64, dy: i64) -> Result<(), EngineError> {
        let velocity = Velocity::new(dx, dy);
        let entity = self.entities.require_mut(id)?;
        if entity.tile_walk().is_none() {
            return Err(EngineError::UnsupportedMode {
                entity: id,
                mode: entity.mode.kind(),
            });
        }
        entity.next_velocity = velocity;
        let idle = entity.velocity.is_zero();

        if !velocity.is_zero() {
            self.scheduler.register(TickTarget::Walk(id), 0);
        } else if idle {
            self.scheduler.unregister(TickTarget::Walk(id));
        }
        debug!(entity = %id, dx = velocity.dx, dy = velocity.dy, "move requested");
        Ok(())
    }

    // -- ticking ----------------------------------------------------------------

    /// Advance the simulation by `elapsed_ms` milliseconds.
    pub fn tick(&mut self, elapsed_ms: u64) -> TickReport {
        let due = self.scheduler.advance(elapsed_ms);
        let mut callbacks = 0;

        for DueCallback { target, elapsed_ms: since_last } in due {
            if !self.entities.contains(target.entity()) {
                continue;
            }
            callbacks += 1;
            match target {
                TickTarget::Walk(id) => {
                    if let Err(err) = self.process_walk(id, since_last) {
                        error!(entity = %id, %err, "walk failed, halting entity");
                        self.halt(id);
                    }
                }
                TickTarget::Animate(id) => self.advance_animation(id),
            }
        }

        let frame = std::mem::take(&mut self.frame);
        TickReport {
            elapsed_ms,
            callbacks,
            redraw: frame.redraw,
            removed: frame.removed,
            entered_area: frame.entered_area,
        }
    }

    /// Run `ticks` ticks of `elapsed_ms` each and fold their reports.
    pub fn run_ticks(&mut self, ticks: u64, elapsed_ms: u64) -> TickReport {
        let mut report = TickReport::default();
        for _ in 0..ticks {
            report.absorb(self.tick(elapsed_ms));
        }
        report
    }

    /// Run `ticks` ticks at the configured tick rate.
    pub fn run_frames(&mut self, ticks: u64) -> TickReport {
        let frame_ms = self.config.tick.frame_ms();
        self.run_ticks(ticks, frame_ms)
    }

    // -- internals ----------------------------------------------------------------

    /// Set position, tile and layer directly, discarding sub-tile progress
    /// and any exit armed from the previous position.
    pub(crate) fn place(&mut self, id: EntityId, layer: usize, pos: TilePos) -> Result<(), EngineError> {
        let graph = self.area.require_tilemap()?;
        if graph.tile(layer, pos).is_none() {
            return Err(EngineError::MalformedTeleport {
                entity: id,
                layer,
                x: pos.x,
                y: pos.y,
            });
        }
        let (x, y) = graph.tile_origin(pos);

        let entity = self.entities.require_mut(id)?;
        entity.layer = layer;
        entity.tile = Some(pos);
        entity.x = x;
        entity.y = y;
        entity.next_area = None;
        if let Some(walk) = entity.tile_walk_mut() {
            walk.partial = (0.0, 0.0);
        }
        self.frame.redraw = true;
        Ok(())
    }

    /// Stop an entity in place and cancel its pending request.
    pub(crate) fn halt(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.next_velocity = Velocity::ZERO;
        }
        if let Err(err) = self.change_velocity(id, Velocity::ZERO) {
            debug!(entity = %id, %err, "halt found no entity");
        }
        self.scheduler.unregister(TickTarget::Walk(id));
    }

    pub(crate) fn fire_on_tile(&mut self, id: EntityId) -> Result<(), EngineError> {
        let graph = self.area.require_tilemap()?;
        let entity = self.entities.require(id)?;
        let hook = entity
            .tile
            .and_then(|pos| graph.tile(entity.layer, pos))
            .and_then(|tile| tile.on_tile())
            .map(str::to_owned);
        if let Some(raw) = hook {
            script::dispatch(self.scripts.as_mut(), "on_tile", &raw);
        }
        Ok(())
    }

    pub(crate) fn fire_on_layer(&mut self, id: EntityId) -> Result<(), EngineError> {
        let graph = self.area.require_tilemap()?;
        let entity = self.entities.require(id)?;
        let hook = graph
            .layer(entity.layer)
            .and_then(|layer| layer.on_layer())
            .map(str::to_owned);
        if let Some(raw) = hook {
            script::dispatch(self.scripts.as_mut(), "on_layer", &raw);
        }
        Ok(())
    }

    pub(crate) fn notify_collision(&mut self, id: EntityId, obstacle: Obstacle) {
        debug!(entity = %id, ?obstacle, "move refused");
        if let Some(handler) = self.collision_handler.as_mut() {
            handler(id, &obstacle);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResources;
    use crate::script::{NullScripts, RecordingScripts};
    use serde_json::json;

    fn resources() -> MemoryResources {
        MemoryResources::new()
            .with_json(
                "field.json",
                json!({
                    "width": 3, "height": 3, "tilewidth": 16, "tileheight": 16,
                    "layers": [
                        { "type": "tilelayer", "name": "ground", "visible": true,
                          "data": [1, 1, 1, 1, 1, 1, 1, 1, 1] },
                        { "type": "tilelayer", "name": "bridge", "visible": true,
                          "data": [1, 1, 1, 1, 1, 1, 1, 1, 1],
                          "properties": { "on_layer": "events:bridge" } },
                        { "type": "objectgroup", "visible": true, "objects": [
                            { "x": 16, "y": 16, "width": 16, "height": 16,
                              "properties": { "on_tile": "events:middle" } }
                        ]}
                    ],
                    "tilesets": []
                }),
            )
            .with_json(
                "npc.json",
                json!({
                    "collision": true, "width": 16, "height": 16, "speed": 16,
                    "members": [0, 1], "afps": 4, "image": "npc.png"
                }),
            )
            .with_json(
                "ghost.json",
                json!({
                    "collision": false, "width": 16, "height": 16, "speed": 16,
                    "members": [0], "afps": 0, "image": "npc.png", "mode": "pixel"
                }),
            )
            .with_image("npc.png", 32, 16)
    }

    fn engine() -> (Engine, RecordingScripts) {
        let recorder = RecordingScripts::new();
        let mut engine = Engine::new(EngineConfig::default(), resources(), recorder.clone());
        assert!(engine.focus("field.json"));
        (engine, recorder)
    }

    // -- 1. Insertion ----------------------------------------------------------

    #[test]
    fn insert_places_on_tile_origin() {
        let (mut engine, _) = engine();
        let id = engine.insert_entity("npc.json", 0, 2, 1).unwrap();
        let npc = engine.entities().get(id).unwrap();
        assert_eq!((npc.x, npc.y), (32, 16));
        assert_eq!(npc.tile, Some(TilePos::new(2, 1)));
        assert!(engine.scheduler().is_registered(TickTarget::Animate(id)));
    }

    #[test]
    fn insert_requires_a_focused_area() {
        let mut engine = Engine::new(EngineConfig::default(), resources(), NullScripts);
        assert!(matches!(
            engine.insert_entity("npc.json", 0, 0, 0),
            Err(EngineError::NoArea)
        ));
    }

    #[test]
    fn insert_out_of_bounds_leaves_no_entity() {
        let (mut engine, _) = engine();
        let err = engine.insert_entity("npc.json", 0, 5, 0).unwrap_err();
        assert!(matches!(err, EngineError::MalformedTeleport { .. }));
        assert!(engine.entities().is_empty());
    }

    #[test]
    fn spritesheets_are_loaded_once() {
        let (mut engine, _) = engine();
        engine.insert_entity("npc.json", 0, 0, 0).unwrap();
        engine.insert_entity("npc.json", 0, 2, 2).unwrap();
        assert_eq!(engine.entities().spritesheets().len(), 1);
    }

    // -- 2. Teleport -------------------------------------------------------------

    #[test]
    fn teleport_fires_tile_and_layer_hooks() {
        let (mut engine, scripts) = engine();
        let id = engine.insert_entity("npc.json", 0, 0, 0).unwrap();
        scripts.clear();

        engine.teleport(id, 1, 1, 1).unwrap();
        assert_eq!(scripts.rendered(), vec!["events:middle", "events:bridge"]);

        scripts.clear();
        engine.teleport(id, 1, 2, 2).unwrap();
        assert!(scripts.rendered().is_empty());
    }

    #[test]
    fn malformed_teleport_changes_nothing() {
        let (mut engine, _) = engine();
        let id = engine.insert_entity("npc.json", 0, 1, 0).unwrap();
        let before = engine.entities().get(id).unwrap().clone();
        assert!(engine.teleport(id, 7, 0, 0).is_err());
        assert!(engine.teleport(id, 0, -1, 0).is_err());
        assert_eq!(engine.entities().get(id).unwrap(), &before);
    }

    // -- 3. Requests ----------------------------------------------------------------

    #[test]
    fn stop_request_while_idle_is_a_no_op() {
        let (mut engine, _) = engine();
        let id = engine.insert_entity("npc.json", 0, 0, 0).unwrap();
        engine.request_move(id, 0, 0).unwrap();
        engine.request_move(id, 0, 0).unwrap();
        assert!(!engine.scheduler().is_registered(TickTarget::Walk(id)));
        assert!(engine.entities().get(id).unwrap().is_settled());
    }

    #[test]
    fn non_tile_modes_are_rejected() {
        let (mut engine, _) = engine();
        let id = engine.insert_entity("ghost.json", 0, 0, 0).unwrap();
        assert!(matches!(
            engine.request_move(id, 1, 0),
            Err(EngineError::UnsupportedMode { mode: MovementModeKind::Pixel, .. })
        ));
    }

    // -- 4. Kill and ticking -------------------------------------------------------

    #[test]
    fn kill_unregisters_and_reports() {
        let (mut engine, _) = engine();
        let id = engine.insert_entity("npc.json", 0, 0, 0).unwrap();
        engine.request_move(id, 1, 0).unwrap();
        assert!(engine.kill(id));
        assert!(!engine.kill(id));
        assert!(engine.scheduler().is_empty());

        let report = engine.tick(16);
        assert_eq!(report.removed, vec![id]);
        assert_eq!(report.callbacks, 0);
        assert!(engine.tick(16).removed.is_empty());
    }

    #[test]
    fn animation_ticks_mark_redraw() {
        let (mut engine, _) = engine();
        let id = engine.insert_entity("npc.json", 0, 0, 0).unwrap();
        engine.tick(0);

        assert!(!engine.tick(200).redraw);
        let report = engine.tick(50);
        assert!(report.redraw);
        assert_eq!(report.callbacks, 1);
        assert_eq!(engine.entities().get(id).unwrap().animation.current_index(), 1);
    }

    #[test]
    fn reports_fold_across_ticks() {
        let (mut engine, _) = engine();
        engine.insert_entity("npc.json", 0, 0, 0).unwrap();
        let report = engine.run_ticks(4, 125);
        assert_eq!(report.elapsed_ms, 500);
        assert_eq!(report.callbacks, 2);
        assert!(report.redraw);
    }
}
