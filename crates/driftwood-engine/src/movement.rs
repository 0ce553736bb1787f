//! Tile-mode walking, collision and exits.
//!
//! A walking entity keeps a sub-tile accumulator (`partial`) measured from
//! the origin of its current tile. Every walk tick adds
//! `velocity * speed * dt / 1000` to it and re-derives the pixel position
//! from the tile origin, so position never drifts with the tick rate.
//! Whenever the accumulator covers a full tile on every moving axis, the
//! entity crosses into the next tile:
//!
//! 1. One tile extent is subtracted from the accumulator.
//! 2. If the destination exists the entity arrives there: `on_tile` fires
//!    and `layermod` shifts are followed, each landing firing `on_layer`
//!    and `on_tile` again.
//! 3. A pending exit is taken (the player) or removes the entity (anyone
//!    else).
//! 4. The requested direction is re-checked against the map: the
//!    entity turns, keeps going, or stops on the tile origin.
//!
//! Collision is evaluated against the tile graph and against other
//! entities' current positions only; a move is never projected.

use driftwood_entity::prelude::{Entity, EntityId, Velocity};
use driftwood_map::prelude::{Direction, ExitTarget, Layermod, TileGraph, TilePos};
use tracing::{debug, error, info, warn};

use crate::engine::{Engine, Obstacle};
use crate::scheduler::TickTarget;
use crate::script;
use crate::EngineError;

/// Outcome of evaluating a move before any side effects are applied.
#[derive(Debug)]
enum Verdict {
    /// The move is allowed, possibly arming an exit.
    Permit(Option<ExitTarget>),
    /// The move is refused and the collision handler is told why.
    Block(Obstacle),
    /// The move is refused without a collision (entity not placed).
    Refuse,
}

#[derive(Debug, PartialEq, Eq)]
enum Crossing {
    Continue,
    Removed,
}

impl Engine {
    /// Whether entity `id` may move one tile in direction `v` from where it
    /// stands. Nothing is armed and no collision is reported.
    pub fn is_walkable(&self, id: EntityId, v: Velocity) -> Result<bool, EngineError> {
        Ok(matches!(self.judge(id, v)?, Verdict::Permit(_)))
    }

    /// Like [`is_walkable`](Self::is_walkable), for a move about to be
    /// committed: a permitted move onto an exit arms that exit; a refused
    /// move notifies the collision handler.
    pub(crate) fn can_walk(&mut self, id: EntityId, v: Velocity) -> Result<bool, EngineError> {
        match self.judge(id, v)? {
            Verdict::Permit(exit) => {
                if let Some(exit) = exit {
                    debug!(entity = %id, %exit, "exit armed");
                    self.entities.require_mut(id)?.next_area = Some(exit);
                }
                Ok(true)
            }
            Verdict::Block(obstacle) => {
                self.notify_collision(id, obstacle);
                Ok(false)
            }
            Verdict::Refuse => Ok(false),
        }
    }

    fn judge(&self, id: EntityId, v: Velocity) -> Result<Verdict, EngineError> {
        let graph = self.area.require_tilemap()?;
        let entity = self.entities.require(id)?;
        if !entity.collision {
            return Ok(Verdict::Permit(None));
        }
        let Some(current) = entity.tile else {
            warn!(entity = %id, "movement evaluated without a current tile, treating as blocked");
            return Ok(Verdict::Refuse);
        };
        if v.is_zero() {
            return Ok(Verdict::Permit(None));
        }

        let (dx, dy) = (v.dx as i64, v.dy as i64);
        let dest = current.offset(dx, dy);
        let mut exit = None;

        match graph.tile(entity.layer, dest) {
            Some(tile) => {
                if tile.nowalk.blocks(self.entities.is_player(id)) {
                    return Ok(Verdict::Block(Obstacle::Tile(Some(dest))));
                }
                if entity.next_area.is_none() {
                    if let Some(raw) = tile.exit() {
                        match ExitTarget::parse(raw) {
                            Ok(target) => exit = Some(target),
                            Err(err) => warn!(entity = %id, tile = %dest, %err, "ignoring exit"),
                        }
                    }
                }
            }
            None => {
                let lazy = graph.tile(entity.layer, current).and_then(|here| {
                    Direction::from_components(dx, dy)
                        .into_iter()
                        .find_map(|direction| here.lazy_exit(direction))
                });
                let Some(raw) = lazy else {
                    return Ok(Verdict::Block(Obstacle::Tile(None)));
                };
                match ExitTarget::parse(raw) {
                    Ok(target) => exit = Some(target),
                    Err(err) => {
                        warn!(entity = %id, tile = %current, %err, "ignoring lazy exit");
                        return Ok(Verdict::Block(Obstacle::Tile(None)));
                    }
                }
            }
        }

        if let Some(other) = self.overlapping_entity(entity, graph) {
            return Ok(Verdict::Block(Obstacle::Entity(other)));
        }
        Ok(Verdict::Permit(exit))
    }

    /// First other entity on the mover's layer whose box intersects the
    /// mover's tile-sized box.
    fn overlapping_entity(&self, mover: &Entity, graph: &TileGraph) -> Option<EntityId> {
        let (tw, th) = (graph.tile_width as i64, graph.tile_height as i64);
        self.entities
            .iter()
            .filter(|other| other.id != mover.id && other.layer == mover.layer)
            .find(|other| {
                mover.x < other.x + other.width as i64
                    && other.x < mover.x + tw
                    && mover.y < other.y + other.height as i64
                    && other.y < mover.y + th
            })
            .map(|other| other.id)
    }

    // -- walk tick --------------------------------------------------------------

    /// One walk callback for `id`, `elapsed_ms` after the previous one.
    pub(crate) fn process_walk(&mut self, id: EntityId, elapsed_ms: u64) -> Result<(), EngineError> {
        let (velocity, next) = self.velocities(id)?;
        if velocity.is_zero() {
            if next.is_zero() {
                self.scheduler.unregister(TickTarget::Walk(id));
                return Ok(());
            }
            if !self.can_walk(id, next)? {
                return Ok(());
            }
            self.change_velocity(id, next)?;
        }

        let (tw, th) = self.tile_extent()?;
        {
            let entity = self.entities.require_mut(id)?;
            let (v, speed, mode) = (entity.velocity, entity.speed, entity.mode.kind());
            let walk = entity
                .tile_walk_mut()
                .ok_or(EngineError::UnsupportedMode { entity: id, mode })?;
            let step = speed * elapsed_ms as f64 / 1000.0;
            walk.partial.0 += v.dx as f64 * step;
            walk.partial.1 += v.dy as f64 * step;
        }
        self.frame.redraw = true;

        loop {
            let Some(entity) = self.entities.get(id) else {
                return Ok(());
            };
            let v = entity.velocity;
            let partial = entity.tile_walk().map(|w| w.partial).unwrap_or_default();
            if v.is_zero() || !reached_boundary(v, partial, tw, th) {
                break;
            }
            if self.cross_tile(id, v, tw, th)? == Crossing::Removed {
                return Ok(());
            }
        }
        self.sync_position(id)
    }

    fn cross_tile(&mut self, id: EntityId, v: Velocity, tw: f64, th: f64) -> Result<Crossing, EngineError> {
        let graph = self.area.require_tilemap()?;
        let entity = self.entities.require_mut(id)?;
        if let Some(walk) = entity.tile_walk_mut() {
            walk.partial.0 -= v.dx as f64 * tw;
            walk.partial.1 -= v.dy as f64 * th;
        }
        let Some(current) = entity.tile else {
            warn!(entity = %id, "walking entity has no tile, stopping");
            self.change_velocity(id, Velocity::ZERO)?;
            return Ok(Crossing::Continue);
        };

        let dest = current.offset(v.dx as i64, v.dy as i64);
        let arrived = graph.tile(entity.layer, dest).is_some();
        if arrived {
            entity.tile = Some(dest);
        }

        if arrived {
            self.sync_position(id)?;
            self.arrive(id)?;
        }

        if self.entities.require(id)?.next_area.is_some() {
            if !self.entities.is_player(id) {
                info!(entity = %id, "non-player entity reached an exit, removing");
                self.kill(id);
                return Ok(Crossing::Removed);
            }
            if !self.perform_exit(id)? {
                self.halt(id);
                return Ok(Crossing::Continue);
            }
            let next = self.entities.require(id)?.next_velocity;
            self.change_velocity(id, next)?;
        } else if !arrived {
            warn!(entity = %id, tile = %dest, "walked off the map with no exit, stopping");
            self.halt(id);
            return Ok(Crossing::Continue);
        }

        let (v, next) = self.velocities(id)?;
        if v != next {
            let to = if self.can_walk(id, next)? {
                next
            } else {
                Velocity::ZERO
            };
            self.change_velocity(id, to)?;
        } else if !self.can_walk(id, v)? {
            self.change_velocity(id, Velocity::ZERO)?;
        }
        Ok(Crossing::Continue)
    }

    /// Tile-arrival handling: `on_tile`, then any chain of `layermod` shifts.
    fn arrive(&mut self, id: EntityId) -> Result<(), EngineError> {
        self.fire_on_tile(id)?;

        let limit = self.config.movement.max_layermod_chain;
        let mut visited = vec![self.entities.require(id)?.layer];
        loop {
            let graph = self.area.require_tilemap()?;
            let entity = self.entities.require(id)?;
            let layer = entity.layer;
            let Some(raw) = entity
                .tile
                .and_then(|pos| graph.tile(layer, pos))
                .and_then(|tile| tile.layermod())
            else {
                return Ok(());
            };
            let layermod = match Layermod::parse(raw) {
                Ok(layermod) => layermod,
                Err(err) => {
                    warn!(entity = %id, %err, "ignoring layermod");
                    return Ok(());
                }
            };
            let Some(target) = layermod.apply(layer).filter(|&l| graph.layer(l).is_some()) else {
                warn!(entity = %id, layer, ?layermod, "layermod leaves the layer stack, ignoring");
                return Ok(());
            };
            if visited.contains(&target) || visited.len() > limit {
                error!(entity = %id, limit, ?visited, target, "layermod chain does not settle");
                return Err(EngineError::LayermodChain { entity: id, limit });
            }

            visited.push(target);
            self.entities.require_mut(id)?.layer = target;
            self.frame.redraw = true;
            debug!(entity = %id, from = layer, to = target, "layer shifted");
            self.fire_on_layer(id)?;
            self.fire_on_tile(id)?;
        }
    }

    /// Take the armed exit: run the old map's `on_exit`, focus the target
    /// area and place the entity there. Returns whether the entity arrived.
    fn perform_exit(&mut self, id: EntityId) -> Result<bool, EngineError> {
        let Some(target) = self.entities.require_mut(id)?.next_area.take() else {
            return Ok(false);
        };

        let on_exit = self.area.require_tilemap()?.on_exit().map(str::to_owned);
        if let Some(raw) = on_exit {
            script::dispatch(self.scripts.as_mut(), "on_exit", &raw);
        }

        if let Err(err) = self
            .area
            .focus(&target.area, self.resources.as_mut(), self.scripts.as_mut())
        {
            warn!(entity = %id, exit = %target, %err, "area transition failed, exit discarded");
            return Ok(false);
        }
        self.frame.entered_area = Some(target.area.clone());
        self.frame.redraw = true;

        if let Err(err) = self.place(id, target.layer, TilePos::new(target.x, target.y)) {
            error!(entity = %id, exit = %target, %err, "exit destination lies outside the new area");
            return Ok(false);
        }
        self.fire_on_tile(id)?;
        info!(entity = %id, exit = %target, "took exit");
        Ok(true)
    }

    // -- state helpers ------------------------------------------------------------

    /// Commit a new direction. The accumulator restarts from the tile
    /// origin; stopping snaps the pixel position onto it.
    pub(crate) fn change_velocity(&mut self, id: EntityId, v: Velocity) -> Result<(), EngineError> {
        let graph = self.area.require_tilemap()?;
        let entity = self.entities.require_mut(id)?;
        entity.velocity = v;
        if let Some(walk) = entity.tile_walk_mut() {
            walk.partial = (0.0, 0.0);
        }
        if v.is_zero() {
            if let Some(pos) = entity.tile {
                (entity.x, entity.y) = graph.tile_origin(pos);
            }
            if entity.next_velocity.is_zero() {
                self.scheduler.unregister(TickTarget::Walk(id));
            }
        }
        self.frame.redraw = true;
        Ok(())
    }

    /// Re-derive the pixel position from the tile origin and accumulator.
    fn sync_position(&mut self, id: EntityId) -> Result<(), EngineError> {
        let graph = self.area.require_tilemap()?;
        let entity = self.entities.require_mut(id)?;
        let Some(pos) = entity.tile else {
            return Ok(());
        };
        let (ox, oy) = graph.tile_origin(pos);
        let (px, py) = entity.tile_walk().map(|w| w.partial).unwrap_or_default();
        entity.x = ox + px.floor() as i64;
        entity.y = oy + py.floor() as i64;
        Ok(())
    }

    fn velocities(&self, id: EntityId) -> Result<(Velocity, Velocity), EngineError> {
        let entity = self.entities.require(id)?;
        Ok((entity.velocity, entity.next_velocity))
    }

    fn tile_extent(&self) -> Result<(f64, f64), EngineError> {
        let graph = self.area.require_tilemap()?;
        Ok((graph.tile_width as f64, graph.tile_height as f64))
    }
}

/// The accumulator covers a whole tile, in the direction of travel, on every
/// axis the entity moves along.
fn reached_boundary(v: Velocity, partial: (f64, f64), tw: f64, th: f64) -> bool {
    (v.dx == 0 || partial.0 * v.dx as f64 >= tw) && (v.dy == 0 || partial.1 * v.dy as f64 >= th)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_needs_every_moving_axis() {
        let right = Velocity::new(1, 0);
        assert!(!reached_boundary(right, (15.9, 0.0), 16.0, 16.0));
        assert!(reached_boundary(right, (16.0, 0.0), 16.0, 16.0));

        let up_left = Velocity::new(-1, -1);
        assert!(!reached_boundary(up_left, (-16.0, -8.0), 16.0, 16.0));
        assert!(reached_boundary(up_left, (-16.0, -16.0), 16.0, 16.0));

        assert!(reached_boundary(Velocity::ZERO, (0.0, 0.0), 16.0, 16.0));
    }

    #[test]
    fn progress_against_the_direction_is_not_a_crossing() {
        let right = Velocity::new(1, 0);
        assert!(!reached_boundary(right, (-16.0, 0.0), 16.0, 16.0));
        assert!(!reached_boundary(right, (-40.0, 0.0), 16.0, 16.0));

        let down = Velocity::new(0, 1);
        assert!(!reached_boundary(down, (0.0, -16.0), 16.0, 16.0));
        assert!(reached_boundary(down, (0.0, 16.0), 16.0, 16.0));
    }
}
