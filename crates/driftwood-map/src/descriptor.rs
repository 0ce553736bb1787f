//! Serde model of the Tiled JSON map format, limited to the fields the
//! movement core consumes.
//!
//! Graphics-only fields (offsets, opacity, tint, etc.) are ignored by serde.
//! Layers of any type other than `tilelayer` and `objectgroup` (image layers,
//! group layers) deserialize to [`LayerDescriptor::Other`] and are skipped
//! during graph construction.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::properties::{self, Properties};

fn default_visible() -> bool {
    true
}

// ---------------------------------------------------------------------------
// MapDescriptor
// ---------------------------------------------------------------------------

/// Top-level map record.
#[derive(Debug, Clone, Deserialize)]
pub struct MapDescriptor {
    /// Width of the map in tiles.
    pub width: u32,
    /// Height of the map in tiles.
    pub height: u32,
    /// Width of one tile in pixels.
    pub tilewidth: u32,
    /// Height of one tile in pixels.
    pub tileheight: u32,
    /// Map-level properties (`title`, `on_enter`, `on_exit`, ...).
    #[serde(default, deserialize_with = "properties::deserialize")]
    pub properties: Properties,
    /// Layers, bottom first.
    #[serde(default)]
    pub layers: Vec<LayerDescriptor>,
    /// Tilesets referenced by tile layer gids.
    #[serde(default)]
    pub tilesets: Vec<TilesetDescriptor>,
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// One entry of the map's layer list, tagged by its Tiled `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum LayerDescriptor {
    /// A grid of tile gids.
    #[serde(rename = "tilelayer")]
    Tiles(TileLayerDescriptor),
    /// Free-floating objects whose properties are stamped onto tiles.
    #[serde(rename = "objectgroup")]
    Objects(ObjectLayerDescriptor),
    /// Any layer kind the movement core has no use for.
    #[serde(other)]
    Other,
}

/// A tile layer: one gid per cell, row-major.
#[derive(Debug, Clone, Deserialize)]
pub struct TileLayerDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Row-major gids; `0` is an empty cell. Flip flags in the high bits are
    /// masked off during construction.
    #[serde(default)]
    pub data: Vec<u32>,
    #[serde(default, deserialize_with = "properties::deserialize")]
    pub properties: Properties,
}

/// An object layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectLayerDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub objects: Vec<ObjectDescriptor>,
}

/// A rectangle in pixel space carrying properties for the tiles it covers.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDescriptor {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, deserialize_with = "properties::deserialize")]
    pub properties: Properties,
}

// ---------------------------------------------------------------------------
// Tilesets
// ---------------------------------------------------------------------------

/// A tileset reference.
#[derive(Debug, Clone, Deserialize)]
pub struct TilesetDescriptor {
    pub firstgid: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub imagewidth: u32,
    #[serde(default)]
    pub imageheight: u32,
    #[serde(default)]
    pub tilewidth: u32,
    #[serde(default)]
    pub tileheight: u32,
    /// Per-tile properties keyed by the local tile id (as a string).
    #[serde(default)]
    pub tileproperties: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}
