//! Driftwood Map -- tile graph model for the Driftwood movement core.
//!
//! This crate turns a Tiled-style map description into an immutable
//! [`TileGraph`]: map dimensions, tile size, an ordered stack of tile layers,
//! and per-tile walkability, exits, and properties. The movement engine reads
//! the graph on every tick; focusing a new area discards it and builds a new
//! one from scratch.
//!
//! # Quick Start
//!
//! ```
//! use driftwood_map::prelude::*;
//!
//! let descriptor: MapDescriptor = serde_json::from_value(serde_json::json!({
//!     "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
//!     "properties": { "title": "Beach" },
//!     "layers": [
//!         { "type": "tilelayer", "visible": true, "data": [1, 1] }
//!     ],
//!     "tilesets": []
//! })).unwrap();
//!
//! let graph = TileGraph::build(&descriptor).unwrap();
//! assert_eq!(graph.layers().len(), 1);
//! assert_eq!(graph.title(), Some("Beach"));
//! assert!(graph.tile(0, TilePos::new(1, 0)).is_some());
//! assert!(graph.tile(0, TilePos::new(2, 0)).is_none());
//! ```

#![deny(unsafe_code)]

pub mod descriptor;
pub mod graph;
pub mod properties;
pub mod tile;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while building a [`TileGraph`] or parsing tile macros.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The raw JSON did not match the map descriptor layout.
    #[error("malformed map descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),

    /// Map or tile dimensions were zero.
    #[error(
        "map dimensions must be positive, got {width}x{height} tiles of {tile_width}x{tile_height} px"
    )]
    InvalidDimensions {
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
    },

    /// A tile layer's data array does not cover the map grid exactly.
    #[error("tile layer '{layer}' has {actual} cells, expected {expected}")]
    LayerSizeMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },

    /// An exit string was not of the form `area,layer,x,y`.
    #[error("malformed exit '{raw}': expected 'area,layer,x,y'")]
    MalformedExit { raw: String },

    /// A layermod value was not a signed or bare integer.
    #[error("malformed layermod '{raw}': expected '+N', '-N' or 'N'")]
    MalformedLayermod { raw: String },
}

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use graph::{Layer, TileGraph, Tileset};
pub use tile::{Direction, ExitTarget, Layermod, Nowalk, Tile, TilePos};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::descriptor::{
        LayerDescriptor, MapDescriptor, ObjectDescriptor, ObjectLayerDescriptor,
        TileLayerDescriptor, TilesetDescriptor,
    };
    pub use crate::graph::{Layer, TileGraph, Tileset};
    pub use crate::properties::Properties;
    pub use crate::tile::{Direction, ExitTarget, Layermod, Nowalk, Tile, TilePos};
    pub use crate::MapError;
}
