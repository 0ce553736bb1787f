//! Driftwood Entity -- entity records, ids and the registry that owns them.
//!
//! Entities are plain data. Movement, collision and transitions are driven
//! by `driftwood-engine`, which passes the registry, the active tile graph
//! and the script bridge explicitly to each operation instead of letting
//! entities reach back into their owners.
//!
//! # Quick Start
//!
//! ```
//! use driftwood_entity::prelude::*;
//!
//! let mut registry = EntityRegistry::new();
//! let sheet = registry.add_spritesheet(Spritesheet::new("hero.png", 64, 16));
//! let desc = EntityDescriptor::from_json(serde_json::json!({
//!     "collision": true, "width": 16, "height": 16, "speed": 64,
//!     "members": [0, 1, 2, 3], "afps": 8, "image": "hero.png"
//! })).unwrap();
//!
//! let hero = registry.spawn("hero.json", desc, sheet);
//! registry.set_player(hero).unwrap();
//! assert!(registry.is_player(hero));
//! assert!(registry.get(hero).unwrap().is_settled());
//! ```

#![deny(unsafe_code)]

pub mod descriptor;
pub mod entity;
pub mod id;
pub mod registry;
pub mod spritesheet;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// The id is stale or was never allocated.
    #[error("entity {entity} does not exist (killed or never spawned)")]
    UnknownEntity { entity: id::EntityId },

    /// An entity descriptor did not match the expected layout.
    #[error("malformed entity descriptor '{filename}': {source}")]
    Descriptor {
        filename: String,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::descriptor::{EntityDescriptor, MovementModeKind};
    pub use crate::entity::{Animation, Entity, MovementMode, TileWalk, Velocity};
    pub use crate::id::{EntityAllocator, EntityId};
    pub use crate::registry::EntityRegistry;
    pub use crate::spritesheet::{SourceRect, Spritesheet, SpritesheetId};
    pub use crate::EntityError;
}
