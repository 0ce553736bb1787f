//! Property tests for the entity registry.
//!
//! Random sequences of spawns, kills and player designations are applied and
//! the registry's bookkeeping is checked after every step.

use driftwood_entity::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum RegistryOp {
    Spawn(u8),
    Kill(usize),
    KillStale(usize),
    MakePlayer(usize),
}

fn op_strategy() -> impl Strategy<Value = RegistryOp> {
    prop_oneof![
        (0u8..3).prop_map(RegistryOp::Spawn),
        (0..64usize).prop_map(RegistryOp::Kill),
        (0..64usize).prop_map(RegistryOp::KillStale),
        (0..64usize).prop_map(RegistryOp::MakePlayer),
    ]
}

fn descriptor(image: &str) -> EntityDescriptor {
    EntityDescriptor::from_json(serde_json::json!({
        "collision": true, "width": 16, "height": 16, "speed": 32,
        "members": [0, 1], "afps": 2, "image": image
    }))
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn registry_bookkeeping_holds(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut registry = EntityRegistry::new();
        let mut alive: Vec<EntityId> = Vec::new();
        let mut dead: Vec<EntityId> = Vec::new();

        for op in ops {
            match op {
                RegistryOp::Spawn(image) => {
                    let filename = format!("sheet{image}.png");
                    let sheet = registry.add_spritesheet(Spritesheet::new(filename.clone(), 32, 16));
                    let id = registry.spawn("npc.json", descriptor(&filename), sheet);
                    prop_assert!(!alive.contains(&id));
                    alive.push(id);
                }
                RegistryOp::Kill(idx) => {
                    if !alive.is_empty() {
                        let id = alive.remove(idx % alive.len());
                        prop_assert!(registry.kill(id).is_some());
                        dead.push(id);
                    }
                }
                RegistryOp::KillStale(idx) => {
                    if !dead.is_empty() {
                        let id = dead[idx % dead.len()];
                        prop_assert!(registry.kill(id).is_none());
                    }
                }
                RegistryOp::MakePlayer(idx) => {
                    if !alive.is_empty() {
                        let id = alive[idx % alive.len()];
                        registry.set_player(id).unwrap();
                    }
                }
            }

            prop_assert_eq!(registry.len(), alive.len());
            prop_assert_eq!(registry.ids(), alive.clone());
            for id in &dead {
                prop_assert!(!registry.contains(*id));
            }
            if let Some(player) = registry.player() {
                prop_assert!(alive.contains(&player));
            }
            // One sheet per distinct image filename, never more.
            prop_assert!(registry.spritesheets().len() <= 3);
        }
    }
}
