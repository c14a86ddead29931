//! Property tests over the replication pipeline.
//!
//! 1. Applying the same pair of snapshots twice leaves the same state
//! 2. No entity enters and leaves the view in the same tick
//! 3. After a delivered tick the client sees exactly what the session knows

use std::collections::HashSet;

use proptest::prelude::*;

use vantage_client::{EnterPvsEvent, LeavePvsEvent};
use vantage_shared::{
    BitWriter, DirtyBuffer, Entity, EntityManager, Eye, EyeState, Serde, Vec2,
};
use vantage_test::{protocol, Position, PositionState, TestPair, TEST_MAP};

fn encode<S: Serde>(state: &S) -> Vec<u8> {
    let mut writer = BitWriter::new();
    state.ser(&mut writer);
    writer.to_bytes()
}

#[derive(Clone, Debug)]
enum Op {
    Spawn(f32, f32),
    Move(usize, f32, f32),
    Despawn(usize),
    Override(usize, bool),
    Lose,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-60.0f32..60.0, -60.0f32..60.0).prop_map(|(x, y)| Op::Spawn(x, y)),
        (any::<usize>(), -60.0f32..60.0, -60.0f32..60.0).prop_map(|(i, x, y)| Op::Move(i, x, y)),
        any::<usize>().prop_map(Op::Despawn),
        (any::<usize>(), any::<bool>()).prop_map(|(i, on)| Op::Override(i, on)),
        Just(Op::Lose),
    ]
}

proptest! {
    #[test]
    fn prop_apply_twice_is_idempotent(
        x in any::<f32>(),
        y in any::<f32>(),
        zoom in (any::<f32>(), any::<f32>()),
        mask in any::<u32>(),
    ) {
        let kinds = protocol().component_kinds;
        let mut entities = EntityManager::new();
        let mut dirty = DirtyBuffer::new(4);
        let entity = entities.spawn(&mut dirty);

        let position = encode(&PositionState { x, y });
        let eye = encode(&EyeState {
            draw_fov: false,
            zoom: Vec2::new(zoom.0, zoom.1),
            offset: Vec2::ZERO,
            visibility_mask: mask,
        });

        kinds.handle_state(&1, &mut entities, &entity, Some(position.as_slice()), Some(position.as_slice())).unwrap();
        kinds.handle_state(&0, &mut entities, &entity, Some(eye.as_slice()), Some(eye.as_slice())).unwrap();
        let first_position = entities.component::<Position>(&entity).cloned();
        let first_eye = entities.component::<Eye>(&entity).cloned();

        kinds.handle_state(&1, &mut entities, &entity, Some(position.as_slice()), Some(position.as_slice())).unwrap();
        kinds.handle_state(&0, &mut entities, &entity, Some(eye.as_slice()), Some(eye.as_slice())).unwrap();

        prop_assert_eq!(entities.component::<Position>(&entity).cloned(), first_position);
        prop_assert_eq!(entities.component::<Eye>(&entity).cloned(), first_eye);
        prop_assert_eq!(entities.component::<Eye>(&entity).unwrap().visibility_mask & 1, 1);
    }

    #[test]
    fn prop_garbage_snapshots_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..24)) {
        let kinds = protocol().component_kinds;
        let mut entities = EntityManager::new();
        let mut dirty = DirtyBuffer::new(4);
        let entity = entities.spawn(&mut dirty);

        for net_id in 0..4u16 {
            let _ = kinds.handle_state(&net_id, &mut entities, &entity, Some(bytes.as_slice()), None);
        }
    }

    #[test]
    fn prop_view_changes_are_exclusive_and_converge(
        ops in prop::collection::vec(prop::collection::vec(op_strategy(), 0..4), 1..30)
    ) {
        let mut pair = TestPair::new();
        pair.attach_eye(Vec2::ZERO);
        let mut spawned: Vec<Entity> = Vec::new();

        for tick_ops in ops {
            let mut lose = false;
            for op in tick_ops {
                match op {
                    Op::Spawn(x, y) => {
                        spawned.push(pair.server.spawn_entity_at(TEST_MAP, Vec2::new(x, y)));
                    }
                    Op::Move(i, x, y) if !spawned.is_empty() => {
                        let entity = spawned[i % spawned.len()];
                        pair.server.set_local_position(&entity, Vec2::new(x, y)).unwrap();
                    }
                    Op::Despawn(i) if !spawned.is_empty() => {
                        let entity = spawned.remove(i % spawned.len());
                        pair.server.despawn_entity(&entity).unwrap();
                    }
                    Op::Override(i, on) if !spawned.is_empty() => {
                        let entity = spawned[i % spawned.len()];
                        pair.server.set_pvs_override(&entity, on).unwrap();
                    }
                    Op::Lose => lose = true,
                    _ => {}
                }
            }

            if lose {
                pair.step_lossy();
                continue;
            }

            for state in pair.step() {
                let written: HashSet<Entity> =
                    state.entity_states.iter().map(|entity_state| entity_state.entity).collect();
                for entity in &state.left_pvs {
                    prop_assert!(!written.contains(entity));
                    prop_assert!(!state.deletions.contains(entity));
                }
            }

            let mut events = pair.client.client.take_events();
            let entered: HashSet<Entity> = events.read::<EnterPvsEvent>().collect();
            let left: HashSet<Entity> = events.read::<LeavePvsEvent>().collect();
            prop_assert!(entered.is_disjoint(&left));

            let session = pair.server.session(&pair.session()).unwrap();
            let mut known: Vec<Entity> = session.known_entities().copied().collect();
            known.sort_unstable();
            prop_assert_eq!(pair.client.client.visible_entities(), known);
        }
    }
}
