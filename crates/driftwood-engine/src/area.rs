//! The active area: which map is focused and its tile graph.

use driftwood_map::prelude::TileGraph;
use tracing::info;

use crate::resource::ResourceLoader;
use crate::script::{self, ScriptBridge};
use crate::EngineError;

#[derive(Debug, Default)]
pub struct AreaManager {
    current: Option<String>,
    tilemap: Option<TileGraph>,
}

impl AreaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `name`, replace the tile graph and run the new map's `on_enter`
    /// hook. On failure the previous graph stays active.
    pub fn focus(
        &mut self,
        name: &str,
        resources: &mut dyn ResourceLoader,
        scripts: &mut dyn ScriptBridge,
    ) -> Result<(), EngineError> {
        let raw = resources.request_json(name)?;
        let graph = TileGraph::from_json(raw)?;
        info!(
            area = name,
            title = graph.title().unwrap_or_default(),
            layers = graph.layers().len(),
            "focused area"
        );

        let on_enter = graph.on_enter().map(str::to_owned);
        self.current = Some(name.to_owned());
        self.tilemap = Some(graph);

        if let Some(raw) = on_enter {
            script::dispatch(scripts, "on_enter", &raw);
        }
        Ok(())
    }

    /// Name the current area was focused by.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.tilemap.as_ref().and_then(TileGraph::title)
    }

    pub fn tilemap(&self) -> Option<&TileGraph> {
        self.tilemap.as_ref()
    }

    pub(crate) fn require_tilemap(&self) -> Result<&TileGraph, EngineError> {
        self.tilemap.as_ref().ok_or(EngineError::NoArea)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResources;
    use crate::script::RecordingScripts;

    fn map(title: &str, on_enter: Option<&str>) -> serde_json::Value {
        let mut props = serde_json::json!({ "title": title });
        if let Some(hook) = on_enter {
            props["on_enter"] = hook.into();
        }
        serde_json::json!({
            "width": 2, "height": 2, "tilewidth": 16, "tileheight": 16,
            "properties": props,
            "layers": [{ "type": "tilelayer", "visible": true, "data": [1, 1, 1, 1] }],
            "tilesets": []
        })
    }

    #[test]
    fn focus_builds_graph_and_fires_on_enter() {
        let mut res = MemoryResources::new().with_json("cove.json", map("Cove", Some("events:arrive")));
        let recorder = RecordingScripts::new();
        let mut scripts = recorder.clone();
        let mut area = AreaManager::new();

        area.focus("cove.json", &mut res, &mut scripts).unwrap();
        assert_eq!(area.current(), Some("cove.json"));
        assert_eq!(area.title(), Some("Cove"));
        assert_eq!(recorder.rendered(), vec!["events:arrive"]);
    }

    #[test]
    fn failed_focus_keeps_previous_graph() {
        let mut res = MemoryResources::new()
            .with_json("cove.json", map("Cove", None))
            .with_json("broken.json", serde_json::json!({ "width": 0 }));
        let mut scripts = RecordingScripts::new();
        let mut area = AreaManager::new();
        assert!(matches!(area.require_tilemap(), Err(EngineError::NoArea)));

        area.focus("cove.json", &mut res, &mut scripts).unwrap();
        assert!(area.focus("broken.json", &mut res, &mut scripts).is_err());
        assert!(area.focus("missing.json", &mut res, &mut scripts).is_err());
        assert_eq!(area.current(), Some("cove.json"));
        assert!(area.tilemap().is_some());
    }
}
