//! Property tests for tile graph construction.
//!
//! Random grid sizes and object rectangles are generated and the graph's
//! lookup invariants are checked against them.

use driftwood_map::prelude::*;
use proptest::prelude::*;

fn map_json(width: u32, height: u32, tw: u32, th: u32, objects: &[(f64, f64, f64, f64)]) -> serde_json::Value {
    let cells = (width * height) as usize;
    let objs: Vec<serde_json::Value> = objects
        .iter()
        .map(|(x, y, w, h)| {
            serde_json::json!({
                "x": x, "y": y, "width": w, "height": h,
                "properties": { "on_tile": "events:mark" }
            })
        })
        .collect();
    serde_json::json!({
        "width": width, "height": height, "tilewidth": tw, "tileheight": th,
        "layers": [
            { "type": "tilelayer", "data": vec![1u32; cells] },
            { "type": "objectgroup", "objects": objs }
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every on-grid coordinate resolves to a tile that knows its own
    /// position; every off-grid coordinate resolves to nothing.
    #[test]
    fn lookup_matches_bounds(
        width in 1u32..12,
        height in 1u32..12,
        tw in 1u32..33,
        th in 1u32..33,
        x in -3i64..15,
        y in -3i64..15,
    ) {
        let graph = TileGraph::from_json(map_json(width, height, tw, th, &[])).unwrap();
        let pos = TilePos::new(x, y);
        match graph.tile(0, pos) {
            Some(tile) => {
                prop_assert!(graph.contains(pos));
                prop_assert_eq!(tile.pos, pos);
            }
            None => prop_assert!(!graph.contains(pos)),
        }
    }

    /// A tile is marked exactly when some object rectangle overlaps it
    /// (point objects covering the tile under their origin).
    #[test]
    fn objects_mark_covered_tiles(
        width in 1u32..8,
        height in 1u32..8,
        objects in prop::collection::vec((0u32..128, 0u32..128, 0u32..64, 0u32..64), 0..4),
    ) {
        let (tw, th) = (16u32, 16u32);
        let rects: Vec<(f64, f64, f64, f64)> = objects
            .iter()
            .map(|&(x, y, w, h)| (x as f64, y as f64, w as f64, h as f64))
            .collect();
        let graph = TileGraph::from_json(map_json(width, height, tw, th, &rects)).unwrap();

        for tile in graph.layer(0).unwrap().tiles() {
            let covered = rects.iter().any(|&(x, y, w, h)| {
                let x0 = (x / tw as f64).floor() as i64;
                let y0 = (y / th as f64).floor() as i64;
                let x1 = (((x + w) / tw as f64).ceil() as i64).max(x0 + 1);
                let y1 = (((y + h) / th as f64).ceil() as i64).max(y0 + 1);
                (x0..x1).contains(&tile.pos.x) && (y0..y1).contains(&tile.pos.y)
            });
            prop_assert_eq!(tile.on_tile().is_some(), covered, "tile {}", tile.pos);
        }
    }
}
