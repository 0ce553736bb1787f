//! The [`TileGraph`]: one area's map as the movement engine sees it.
//!
//! # Construction
//!
//! [`TileGraph::build`] walks the descriptor's layer list bottom-up:
//!
//! 1. Invisible layers are skipped and do not take a layer index.
//! 2. Each visible tile layer becomes a [`Layer`]. Every cell starts from the
//!    tileset properties of the gid placed there.
//! 3. Each visible object layer is stamped onto tiles. Object layers seen
//!    before any tile layer form the *global object layer* and are stamped
//!    onto every tile layer once all layers exist; any later object layer is
//!    stamped onto the tile layer immediately below it only.
//!
//! Stamping unions properties, exits and `nowalk` into the covered tiles; a
//! tile's coordinate and gid are never changed.
//!
//! The graph is immutable once built. Focusing another area builds a new
//! graph rather than editing this one.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::descriptor::{
    LayerDescriptor, MapDescriptor, ObjectLayerDescriptor, TileLayerDescriptor,
    TilesetDescriptor,
};
use crate::properties::{self, Properties};
use crate::tile::{Tile, TilePos};
use crate::MapError;

/// Tiled stores flip/rotation flags in the top bits of each gid.
const GID_FLAG_MASK: u32 = 0x1FFF_FFFF;

// ---------------------------------------------------------------------------
// Tileset
// ---------------------------------------------------------------------------

/// A tileset. Only its identity and per-tile properties matter to movement;
/// the image is carried along for the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub firstgid: u32,
    pub name: String,
    pub image: String,
    pub image_width: u32,
    pub image_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Properties keyed by local tile id (`gid - firstgid`).
    pub tile_properties: BTreeMap<u32, Properties>,
}

impl Tileset {
    fn from_descriptor(desc: &TilesetDescriptor) -> Self {
        let mut tile_properties = BTreeMap::new();
        for (local_id, props) in &desc.tileproperties {
            match local_id.parse::<u32>() {
                Ok(id) => {
                    tile_properties.insert(id, properties::normalize(props));
                }
                Err(_) => warn!(
                    tileset = %desc.name,
                    local_id = %local_id,
                    "ignoring tile properties with a non-numeric tile id"
                ),
            }
        }
        Self {
            firstgid: desc.firstgid,
            name: desc.name.clone(),
            image: desc.image.clone(),
            image_width: desc.imagewidth,
            image_height: desc.imageheight,
            tile_width: desc.tilewidth,
            tile_height: desc.tileheight,
            tile_properties,
        }
    }

    /// Properties of a gid that belongs to this tileset.
    pub fn properties_for(&self, gid: u32) -> Option<&Properties> {
        gid.checked_sub(self.firstgid)
            .and_then(|local| self.tile_properties.get(&local))
    }
}

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

/// One tile layer: a `width x height` grid of tiles plus layer properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Position in the graph's layer stack (0 = bottom).
    pub index: usize,
    pub name: String,
    /// Layer-scoped properties (`on_layer`).
    pub properties: Properties,
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Layer {
    fn index_of(&self, pos: TilePos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width as i64 || pos.y >= self.height as i64 {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// The tile at `pos`, or `None` off the grid.
    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.index_of(pos).map(|i| &self.tiles[i])
    }

    fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.index_of(pos).map(|i| &mut self.tiles[i])
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Script to run when an entity lands on this layer.
    pub fn on_layer(&self) -> Option<&str> {
        self.properties.get("on_layer").map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// TileGraph
// ---------------------------------------------------------------------------

/// Immutable tile model of one area.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGraph {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Pixel width of one tile.
    pub tile_width: u32,
    /// Pixel height of one tile.
    pub tile_height: u32,
    /// Map-scoped properties.
    pub properties: Properties,
    layers: Vec<Layer>,
    tilesets: Vec<Tileset>,
}

impl TileGraph {
    /// Build a graph from a parsed descriptor. See the module docs for the
    /// layer and object merging rules.
    pub fn build(desc: &MapDescriptor) -> Result<Self, MapError> {
        if desc.width == 0 || desc.height == 0 || desc.tilewidth == 0 || desc.tileheight == 0 {
            return Err(MapError::InvalidDimensions {
                width: desc.width,
                height: desc.height,
                tile_width: desc.tilewidth,
                tile_height: desc.tileheight,
            });
        }

        let mut tilesets: Vec<Tileset> = desc.tilesets.iter().map(Tileset::from_descriptor).collect();
        tilesets.sort_by_key(|ts| ts.firstgid);

        let mut graph = Self {
            width: desc.width,
            height: desc.height,
            tile_width: desc.tilewidth,
            tile_height: desc.tileheight,
            properties: desc.properties.clone(),
            layers: Vec::new(),
            tilesets,
        };

        let mut global_objects: Vec<&ObjectLayerDescriptor> = Vec::new();

        for (z, layer) in desc.layers.iter().enumerate() {
            match layer {
                LayerDescriptor::Tiles(tiles) if tiles.visible => {
                    let built = graph.build_tile_layer(tiles)?;
                    graph.layers.push(built);
                }
                LayerDescriptor::Objects(objects) if objects.visible => {
                    if graph.layers.is_empty() {
                        global_objects.push(objects);
                    } else {
                        let (tw, th, w, h) = graph.grid();
                        if let Some(below) = graph.layers.last_mut() {
                            stamp_objects(below, objects, tw, th, w, h);
                        }
                    }
                }
                LayerDescriptor::Other => {
                    debug!(z, "skipping layer of unsupported type");
                }
                _ => {
                    debug!(z, "skipping invisible layer");
                }
            }
        }

        let (tw, th, w, h) = graph.grid();
        for objects in global_objects {
            for layer in &mut graph.layers {
                stamp_objects(layer, objects, tw, th, w, h);
            }
        }

        debug!(
            width = graph.width,
            height = graph.height,
            layers = graph.layers.len(),
            tilesets = graph.tilesets.len(),
            "built tile graph"
        );
        Ok(graph)
    }

    /// Parse raw JSON and build.
    pub fn from_json(value: serde_json::Value) -> Result<Self, MapError> {
        let desc: MapDescriptor = serde_json::from_value(value)?;
        Self::build(&desc)
    }

    fn grid(&self) -> (u32, u32, u32, u32) {
        (self.tile_width, self.tile_height, self.width, self.height)
    }

    fn build_tile_layer(&self, desc: &TileLayerDescriptor) -> Result<Layer, MapError> {
        let expected = self.width as usize * self.height as usize;
        if desc.data.len() != expected {
            return Err(MapError::LayerSizeMismatch {
                layer: desc.name.clone(),
                expected,
                actual: desc.data.len(),
            });
        }

        let mut tiles = Vec::with_capacity(expected);
        for (i, raw_gid) in desc.data.iter().enumerate() {
            let gid = raw_gid & GID_FLAG_MASK;
            let pos = TilePos::new(
                (i % self.width as usize) as i64,
                (i / self.width as usize) as i64,
            );
            let mut tile = Tile::new(pos, gid);
            if let Some(props) = self.tileset_for(gid).and_then(|ts| ts.properties_for(gid)) {
                tile.absorb(props);
            }
            tiles.push(tile);
        }

        Ok(Layer {
            index: self.layers.len(),
            name: desc.name.clone(),
            properties: desc.properties.clone(),
            width: self.width,
            height: self.height,
            tiles,
        })
    }

    // -- queries ------------------------------------------------------------

    /// Layer stack, bottom first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    /// The tileset owning `gid` (largest `firstgid` not above it).
    pub fn tileset_for(&self, gid: u32) -> Option<&Tileset> {
        if gid == 0 {
            return None;
        }
        self.tilesets.iter().rev().find(|ts| ts.firstgid <= gid)
    }

    /// Tile lookup by layer and tile coordinate.
    pub fn tile(&self, layer: usize, pos: TilePos) -> Option<&Tile> {
        self.layers.get(layer).and_then(|l| l.tile(pos))
    }

    /// Tile under a pixel coordinate (floored to the containing tile).
    pub fn tile_at_pixel(&self, layer: usize, x: i64, y: i64) -> Option<&Tile> {
        self.tile(layer, self.pixel_to_tile(x, y))
    }

    pub fn pixel_to_tile(&self, x: i64, y: i64) -> TilePos {
        TilePos::new(
            x.div_euclid(self.tile_width as i64),
            y.div_euclid(self.tile_height as i64),
        )
    }

    /// Top-left pixel of a tile coordinate.
    pub fn tile_origin(&self, pos: TilePos) -> (i64, i64) {
        (
            pos.x * self.tile_width as i64,
            pos.y * self.tile_height as i64,
        )
    }

    /// Whether `pos` lies on the grid.
    pub fn contains(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width as i64 && pos.y < self.height as i64
    }

    pub fn title(&self) -> Option<&str> {
        self.properties.get("title").map(String::as_str)
    }

    pub fn on_enter(&self) -> Option<&str> {
        self.properties.get("on_enter").map(String::as_str)
    }

    pub fn on_exit(&self) -> Option<&str> {
        self.properties.get("on_exit").map(String::as_str)
    }
}

/// Stamp every object of `objects` onto the tiles it covers in `layer`.
///
/// Objects are pixel rectangles; a zero-sized (point) object covers the tile
/// containing its origin.
fn stamp_objects(
    layer: &mut Layer,
    objects: &ObjectLayerDescriptor,
    tile_width: u32,
    tile_height: u32,
    width: u32,
    height: u32,
) {
    let (tw, th) = (tile_width as f64, tile_height as f64);
    for object in &objects.objects {
        if object.properties.is_empty() {
            continue;
        }
        let x0 = (object.x / tw).floor() as i64;
        let y0 = (object.y / th).floor() as i64;
        let x1 = (((object.x + object.width) / tw).ceil() as i64).max(x0 + 1);
        let y1 = (((object.y + object.height) / th).ceil() as i64).max(y0 + 1);

        let mut stamped = 0usize;
        for y in y0.max(0)..y1.min(height as i64) {
            for x in x0.max(0)..x1.min(width as i64) {
                if let Some(tile) = layer.tile_mut(TilePos::new(x, y)) {
                    tile.absorb(&object.properties);
                    stamped += 1;
                }
            }
        }
        if stamped == 0 {
            warn!(
                layer = %objects.name,
                x = object.x,
                y = object.y,
                "object lies entirely outside the map"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
