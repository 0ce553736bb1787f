//! The [`Entity`] record and its movement and animation state.
//!
//! Movement-mode specific state lives in the [`MovementMode`] payload; the
//! record itself only holds what every mode shares (position, footprint,
//! speed, requested and current direction).

use driftwood_map::prelude::{ExitTarget, Properties, TilePos};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::{EntityDescriptor, MovementModeKind};
use crate::id::EntityId;
use crate::spritesheet::{SourceRect, Spritesheet, SpritesheetId};

// ---------------------------------------------------------------------------
// Velocity
// ---------------------------------------------------------------------------

/// A discrete direction of travel, each component in `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: i8,
    pub dy: i8,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { dx: 0, dy: 0 };

    /// Build a velocity from raw components. A component outside
    /// `{-1, 0, 1}` is treated as `0` and logged.
    pub fn new(dx: i64, dy: i64) -> Self {
        Self {
            dx: clamp_component("dx", dx),
            dy: clamp_component("dy", dy),
        }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

fn clamp_component(axis: &'static str, value: i64) -> i8 {
    match value {
        -1 | 0 | 1 => value as i8,
        other => {
            debug!(axis, value = other, "direction component out of range, treating as 0");
            0
        }
    }
}

// ---------------------------------------------------------------------------
// MovementMode
// ---------------------------------------------------------------------------

/// Sub-tile progress of a tile-mode walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TileWalk {
    /// Fractional pixel offset from the current tile's origin, per axis.
    /// Reset whenever the velocity changes.
    pub partial: (f64, f64),
}

/// Movement mode with its mode-specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MovementMode {
    Tile(TileWalk),
    Pixel,
    Turn,
}

impl MovementMode {
    pub fn kind(&self) -> MovementModeKind {
        match self {
            MovementMode::Tile(_) => MovementModeKind::Tile,
            MovementMode::Pixel => MovementModeKind::Pixel,
            MovementMode::Turn => MovementModeKind::Turn,
        }
    }
}

impl From<MovementModeKind> for MovementMode {
    fn from(kind: MovementModeKind) -> Self {
        match kind {
            MovementModeKind::Tile => MovementMode::Tile(TileWalk::default()),
            MovementModeKind::Pixel => MovementMode::Pixel,
            MovementModeKind::Turn => MovementMode::Turn,
        }
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Looping frame animation over spritesheet members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub members: Vec<u32>,
    /// Frames per second; `0` disables animation.
    pub afps: u32,
    current: usize,
}

impl Animation {
    pub fn new(members: Vec<u32>, afps: u32) -> Self {
        Self {
            members,
            afps,
            current: 0,
        }
    }

    /// Milliseconds between frames, or `None` when animation is disabled.
    pub fn interval_ms(&self) -> Option<u64> {
        (self.afps > 0).then(|| 1000 / self.afps as u64)
    }

    /// Step to the next frame, wrapping. Returns whether the frame changed.
    pub fn advance(&mut self) -> bool {
        if self.members.len() < 2 {
            return false;
        }
        self.current = (self.current + 1) % self.members.len();
        true
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Spritesheet frame index currently shown.
    pub fn current_member(&self) -> Option<u32> {
        self.members.get(self.current).copied()
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A live actor on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    /// Descriptor file the entity was read from.
    pub filename: String,

    /// Index into the active tile graph's layers.
    pub layer: usize,
    /// Pixel position of the top-left corner.
    pub x: i64,
    pub y: i64,
    /// Last resolved tile under the entity. `None` before the first
    /// placement.
    pub tile: Option<TilePos>,
    pub width: u32,
    pub height: u32,

    /// Pixels per second.
    pub speed: f64,
    /// When `false`, tile walkability and entity overlap are not checked.
    pub collision: bool,
    /// Current direction of travel.
    pub velocity: Velocity,
    /// Requested direction of travel.
    pub next_velocity: Velocity,
    pub mode: MovementMode,

    pub animation: Animation,
    pub spritesheet: SpritesheetId,
    pub properties: Properties,

    /// Area transition armed by the last permitted move, taken on the next
    /// tile arrival.
    pub next_area: Option<ExitTarget>,
}

impl Entity {
    pub fn from_descriptor(
        id: EntityId,
        filename: impl Into<String>,
        desc: EntityDescriptor,
        spritesheet: SpritesheetId,
    ) -> Self {
        Self {
            id,
            filename: filename.into(),
            layer: 0,
            x: 0,
            y: 0,
            tile: None,
            width: desc.width,
            height: desc.height,
            speed: desc.speed,
            collision: desc.collision,
            velocity: Velocity::ZERO,
            next_velocity: Velocity::ZERO,
            mode: desc.mode.into(),
            animation: Animation::new(desc.members, desc.afps),
            spritesheet,
            properties: desc.properties,
            next_area: None,
        }
    }

    /// Tile-walk state, when the entity moves in tile mode.
    pub fn tile_walk(&self) -> Option<&TileWalk> {
        match &self.mode {
            MovementMode::Tile(walk) => Some(walk),
            _ => None,
        }
    }

    pub fn tile_walk_mut(&mut self) -> Option<&mut TileWalk> {
        match &mut self.mode {
            MovementMode::Tile(walk) => Some(walk),
            _ => None,
        }
    }

    /// Neither moving nor asked to move.
    pub fn is_settled(&self) -> bool {
        self.velocity.is_zero() && self.next_velocity.is_zero()
    }

    /// Source rectangle of the current animation frame. Frames are the
    /// entity's own width and height.
    pub fn source_rect(&self, sheet: &Spritesheet) -> Option<SourceRect> {
        let member = self.animation.current_member()?;
        SourceRect::for_frame(member, self.width, self.height, sheet.image_width)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
