//! Tiles and the small value types attached to them.
//!
//! A [`Tile`] carries three kinds of data that the movement engine reads:
//!
//! - [`Nowalk`] -- who may not enter the tile.
//! - exits -- `exit` (taken on arrival) and `exit:up|down|left|right` (lazy
//!   exits, taken when walking off the grid edge from this tile), each an
//!   `"area,layer,x,y"` string parsed into an [`ExitTarget`] on use.
//! - properties -- everything else, notably `on_tile` (script to call on
//!   arrival) and `layermod` (see [`Layermod`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::properties::Properties;
use crate::MapError;

// ---------------------------------------------------------------------------
// TilePos
// ---------------------------------------------------------------------------

/// Integer tile coordinate. Signed so that off-grid neighbours of edge tiles
/// can be expressed and looked up (the lookup simply misses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i64,
    pub y: i64,
}

impl TilePos {
    #[inline]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The neighbouring coordinate `(x + dx, y + dy)`.
    #[inline]
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Cardinal direction, used to pick the matching lazy exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The tile exit key that is followed when walking off the grid this way.
    pub fn lazy_exit_key(self) -> &'static str {
        match self {
            Direction::Up => "exit:up",
            Direction::Down => "exit:down",
            Direction::Left => "exit:left",
            Direction::Right => "exit:right",
        }
    }

    /// Directions implied by a movement vector, in lazy-exit priority order
    /// (vertical before horizontal).
    pub fn from_components(dx: i64, dy: i64) -> Vec<Direction> {
        let mut out = Vec::with_capacity(2);
        match dy {
            -1 => out.push(Direction::Up),
            1 => out.push(Direction::Down),
            _ => {}
        }
        match dx {
            -1 => out.push(Direction::Left),
            1 => out.push(Direction::Right),
            _ => {}
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Nowalk
// ---------------------------------------------------------------------------

/// Walkability of a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nowalk {
    /// Anyone may enter.
    #[default]
    Walkable,
    /// Nobody may enter.
    Blocked,
    /// Only the player is kept out.
    Player,
    /// Every entity except the player is kept out.
    Npc,
}

impl Nowalk {
    /// Interpret a `nowalk` property value.
    ///
    /// `""` and `"true"` block unconditionally, `"player"` and `"npc"` block
    /// selectively, `"false"` is walkable. Any other value is treated as an
    /// unconditional block.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "false" => Nowalk::Walkable,
            "player" => Nowalk::Player,
            "npc" => Nowalk::Npc,
            _ => Nowalk::Blocked,
        }
    }

    /// Whether an entity (the player or not) is kept out of the tile.
    pub fn blocks(self, is_player: bool) -> bool {
        match self {
            Nowalk::Walkable => false,
            Nowalk::Blocked => true,
            Nowalk::Player => is_player,
            Nowalk::Npc => !is_player,
        }
    }
}

// ---------------------------------------------------------------------------
// ExitTarget
// ---------------------------------------------------------------------------

/// Destination of an area transition: area name plus a tile-unit position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitTarget {
    pub area: String,
    pub layer: usize,
    pub x: i64,
    pub y: i64,
}

impl ExitTarget {
    /// Parse an `"area,layer,x,y"` exit string.
    pub fn parse(raw: &str) -> Result<Self, MapError> {
        let malformed = || MapError::MalformedExit {
            raw: raw.to_owned(),
        };
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [area, layer, x, y] = parts.as_slice() else {
            return Err(malformed());
        };
        if area.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            area: (*area).to_owned(),
            layer: layer.parse().map_err(|_| malformed())?,
            x: x.parse().map_err(|_| malformed())?,
            y: y.parse().map_err(|_| malformed())?,
        })
    }
}

impl fmt::Display for ExitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.area, self.layer, self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Layermod
// ---------------------------------------------------------------------------

/// The `layermod` tile macro: move an arriving entity to another layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layermod {
    /// `+N` / `-N`: shift by a signed count.
    Relative(i64),
    /// `N`: go to layer N.
    Absolute(usize),
}

impl Layermod {
    pub fn parse(raw: &str) -> Result<Self, MapError> {
        let raw = raw.trim();
        let malformed = || MapError::MalformedLayermod {
            raw: raw.to_owned(),
        };
        if let Some(rest) = raw.strip_prefix('+') {
            rest.parse().map(Layermod::Relative).map_err(|_| malformed())
        } else if let Some(rest) = raw.strip_prefix('-') {
            rest.parse::<i64>()
                .map(|n| Layermod::Relative(-n))
                .map_err(|_| malformed())
        } else {
            raw.parse().map(Layermod::Absolute).map_err(|_| malformed())
        }
    }

    /// Resolve against the current layer. `None` when the result would be
    /// negative.
    pub fn apply(self, current: usize) -> Option<usize> {
        match self {
            Layermod::Absolute(layer) => Some(layer),
            Layermod::Relative(delta) => {
                let target = current as i64 + delta;
                usize::try_from(target).ok()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One grid cell of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Coordinate within the layer.
    pub pos: TilePos,
    /// Global tile id placed at this cell (`0` = empty).
    pub gid: u32,
    /// Who may not walk here.
    pub nowalk: Nowalk,
    /// Exit key (`exit`, `exit:up`, ...) to raw `"area,layer,x,y"` string.
    pub exits: BTreeMap<String, String>,
    /// Remaining properties (`on_tile`, `layermod`, custom keys).
    pub properties: Properties,
}

impl Tile {
    pub(crate) fn new(pos: TilePos, gid: u32) -> Self {
        Self {
            pos,
            gid,
            nowalk: Nowalk::Walkable,
            exits: BTreeMap::new(),
            properties: Properties::new(),
        }
    }

    /// Merge properties into the tile, routing `nowalk` and exit keys to their
    /// dedicated fields. Incoming values replace existing ones with the same
    /// key; the coordinate and gid are never touched.
    pub(crate) fn absorb(&mut self, incoming: &Properties) {
        for (key, value) in incoming {
            if key == "nowalk" {
                self.nowalk = Nowalk::parse(value);
            } else if key == "exit" || key.starts_with("exit:") {
                self.exits.insert(key.clone(), value.clone());
            } else {
                self.properties.insert(key.clone(), value.clone());
            }
        }
    }

    /// Raw regular exit, taken on arrival.
    pub fn exit(&self) -> Option<&str> {
        self.exits.get("exit").map(String::as_str)
    }

    /// Raw lazy exit for walking off the grid in `direction`.
    pub fn lazy_exit(&self, direction: Direction) -> Option<&str> {
        self.exits
            .get(direction.lazy_exit_key())
            .map(String::as_str)
    }

    /// Script to run when an entity arrives.
    pub fn on_tile(&self) -> Option<&str> {
        self.properties.get("on_tile").map(String::as_str)
    }

    /// Raw layermod macro.
    pub fn layermod(&self) -> Option<&str> {
        self.properties.get("layermod").map(String::as_str)
    }
}
