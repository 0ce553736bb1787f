//! Driftwood Engine -- movement, collision and area transitions for tile-mode
//! entities.
//!
//! The [`Engine`](engine::Engine) owns the active area's [`TileGraph`], the
//! [`EntityRegistry`] and a [`TickScheduler`](scheduler::TickScheduler). The
//! host feeds it elapsed milliseconds through [`Engine::tick`]; every due
//! walk or animation callback runs in registration order, and the returned
//! [`TickReport`](engine::TickReport) tells the host what changed.
//!
//! Script hooks (`on_tile`, `on_layer`, `on_enter`, `on_exit`) go out through
//! a [`ScriptBridge`](script::ScriptBridge); map and entity descriptors come
//! in through a [`ResourceLoader`](resource::ResourceLoader).
//!
//! # Quick Start
//!
//! ```
//! use driftwood_engine::prelude::*;
//! use serde_json::json;
//!
//! let resources = MemoryResources::new()
//!     .with_json("beach.json", json!({
//!         "width": 4, "height": 1, "tilewidth": 32, "tileheight": 32,
//!         "properties": { "title": "Beach" },
//!         "layers": [{ "type": "tilelayer", "visible": true, "data": [1, 1, 1, 1] }],
//!         "tilesets": []
//!     }))
//!     .with_json("hero.json", json!({
//!         "collision": true, "width": 32, "height": 32, "speed": 128,
//!         "members": [0], "afps": 0, "image": "hero.png"
//!     }))
//!     .with_image("hero.png", 32, 32);
//!
//! let mut engine = Engine::new(EngineConfig::default(), resources, NullScripts);
//! assert!(engine.focus("beach.json"));
//!
//! let hero = engine.insert_entity("hero.json", 0, 0, 0).unwrap();
//! engine.set_player(hero).unwrap();
//! engine.request_move(hero, 1, 0).unwrap();
//! engine.run_ticks(4, 250);
//! engine.request_move(hero, 0, 0).unwrap();
//! engine.tick(0);
//!
//! let hero = engine.entities().get(hero).unwrap();
//! assert_eq!(hero.tile, Some(TilePos::new(3, 0)));
//! assert_eq!((hero.x, hero.y), (96, 0));
//! ```
//!
//! [`TileGraph`]: driftwood_map::graph::TileGraph
//! [`EntityRegistry`]: driftwood_entity::registry::EntityRegistry
//! [`Engine::tick`]: engine::Engine::tick

#![deny(unsafe_code)]

pub mod animation;
pub mod area;
pub mod config;
pub mod engine;
pub mod logging;
pub mod movement;
pub mod resource;
pub mod scheduler;
pub mod script;
pub mod snapshot;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the map crate for convenience.
pub use driftwood_map;

/// Re-export the entity crate for convenience.
pub use driftwood_entity;

use driftwood_entity::prelude::{EntityError, EntityId, MovementModeKind};
use driftwood_map::prelude::MapError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Resource(#[from] resource::ResourceError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// An operation needed a tile graph before any area was focused.
    #[error("no area is focused")]
    NoArea,

    /// A placement named a layer or tile outside the active graph.
    #[error("cannot place entity {entity} at layer {layer}, tile ({x}, {y}): outside the area")]
    MalformedTeleport {
        entity: EntityId,
        layer: usize,
        x: i64,
        y: i64,
    },

    /// A layermod chain revisited a layer or ran past the configured cap.
    #[error("layermod chain for entity {entity} exceeded {limit} shifts or looped")]
    LayermodChain { entity: EntityId, limit: usize },

    /// The entity's movement mode has no walk implementation.
    #[error("entity {entity} uses the {mode:?} movement mode, which is not supported")]
    UnsupportedMode {
        entity: EntityId,
        mode: MovementModeKind,
    },

    /// A script hook did not have the `module:function` shape.
    #[error("malformed script call '{raw}': expected module:function[:args]")]
    MalformedScriptCall { raw: String },

    /// Engine state could not be serialized for snapshotting.
    #[error("failed to serialize engine state: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use driftwood_entity::prelude::*;
    pub use driftwood_map::prelude::*;

    pub use crate::area::AreaManager;
    pub use crate::config::{ConfigError, EngineConfig, LogConfig, MovementConfig, TickConfig};
    pub use crate::engine::{Engine, Obstacle, TickReport};
    pub use crate::resource::{
        DirectoryResources, ImageInfo, MemoryResources, ResourceError, ResourceLoader,
    };
    pub use crate::scheduler::{DueCallback, TickScheduler, TickTarget};
    pub use crate::script::{NullScripts, RecordingScripts, ScriptBridge, ScriptCall};
    pub use crate::snapshot::{EngineSnapshot, EntityState};
    pub use crate::EngineError;
}
