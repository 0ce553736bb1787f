//! String key/value properties as stored on maps, layers, tiles and objects.
//!
//! Tiled has written custom properties in two shapes over the years: a flat
//! JSON object (`{"on_tile": "events:bell"}`) and a list of typed records
//! (`[{"name": "on_tile", "type": "string", "value": "events:bell"}]`). Both
//! are accepted and normalized to [`Properties`]. Non-string values are
//! stringified (`true` becomes `"true"`, `null` becomes `""`).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Ordered string properties. Ordering keeps iteration deterministic.
pub type Properties = BTreeMap<String, String>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProperties {
    Map(BTreeMap<String, serde_json::Value>),
    List(Vec<RawProperty>),
}

#[derive(Deserialize)]
struct RawProperty {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

fn stringify(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Normalize an already-parsed JSON object into [`Properties`].
pub(crate) fn normalize(map: &BTreeMap<String, serde_json::Value>) -> Properties {
    map.iter()
        .map(|(key, value)| (key.clone(), stringify(value.clone())))
        .collect()
}

/// `deserialize_with` helper accepting either property shape.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawProperties>::deserialize(deserializer)?;
    Ok(match raw {
        None => Properties::new(),
        Some(RawProperties::Map(map)) => map
            .into_iter()
            .map(|(key, value)| (key, stringify(value)))
            .collect(),
        Some(RawProperties::List(list)) => list
            .into_iter()
            .map(|p| (p.name, stringify(p.value)))
            .collect(),
    })
}
