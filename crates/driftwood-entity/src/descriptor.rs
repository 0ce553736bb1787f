//! Serde model of the JSON entity descriptor.

use driftwood_map::prelude::Properties;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// How an entity moves. Only tile mode has a movement implementation; the
/// other modes are accepted so descriptors written for them still load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementModeKind {
    /// Whole-tile steps with sub-tile interpolation.
    #[default]
    Tile,
    /// Free per-pixel movement.
    Pixel,
    /// Turn-based stepping.
    Turn,
}

/// Contents of an entity descriptor file.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDescriptor {
    /// Whether tile walkability and entity overlap are enforced.
    pub collision: bool,
    /// Pixel width of the entity (and of one animation frame).
    pub width: u32,
    /// Pixel height of the entity (and of one animation frame).
    pub height: u32,
    /// Movement speed in pixels per second. Never negative.
    #[serde(deserialize_with = "non_negative_speed")]
    pub speed: f64,
    /// Spritesheet frame indices making up the animation loop.
    pub members: Vec<u32>,
    /// Animation frames per second; `0` disables animation.
    pub afps: u32,
    /// Spritesheet image path.
    pub image: String,
    #[serde(default)]
    pub mode: MovementModeKind,
    #[serde(default, deserialize_with = "driftwood_map::properties::deserialize")]
    pub properties: Properties,
}

impl EntityDescriptor {
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn non_negative_speed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let speed = f64::deserialize(deserializer)?;
    if !speed.is_finite() || speed < 0.0 {
        return Err(D::Error::custom(format!(
            "speed must be a non-negative number, got {speed}"
        )));
    }
    Ok(speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_descriptor_defaults_to_tile_mode() {
        let desc = EntityDescriptor::from_json(serde_json::json!({
            "collision": true, "width": 16, "height": 16, "speed": 64,
            "members": [0, 1], "afps": 4, "image": "hero.png"
        }))
        .unwrap();
        assert_eq!(desc.mode, MovementModeKind::Tile);
        assert!(desc.properties.is_empty());
        assert_eq!(desc.speed, 64.0);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let err = EntityDescriptor::from_json(serde_json::json!({
            "collision": true, "width": 16, "height": 16
        }));
        assert!(err.is_err());
    }

    #[test]
    fn mode_is_read() {
        let desc = EntityDescriptor::from_json(serde_json::json!({
            "collision": false, "width": 8, "height": 8, "speed": 10,
            "members": [], "afps": 0, "image": "bird.png", "mode": "pixel",
            "properties": { "name": "gull" }
        }))
        .unwrap();
        assert_eq!(desc.mode, MovementModeKind::Pixel);
        assert_eq!(desc.properties.get("name").map(String::as_str), Some("gull"));
    }

    #[test]
    fn negative_speed_is_rejected() {
        let err = EntityDescriptor::from_json(serde_json::json!({
            "collision": true, "width": 16, "height": 16, "speed": -16,
            "members": [0], "afps": 0, "image": "hero.png"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }
}
