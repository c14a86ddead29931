use vantage_server::{PvsConfig, ServerConfig};
use vantage_shared::{Entity, Serde, Vec2};
use vantage_test::{Position, TestPair, TEST_MAP};

const BUDGET_BYTES: usize = 40;

fn budget_pair() -> TestPair {
    TestPair::with_config(ServerConfig {
        pvs: PvsConfig {
            payload_budget_bytes: BUDGET_BYTES,
            ..Default::default()
        },
        ..Default::default()
    })
}

#[test]
fn over_budget_entities_are_deferred_nearest_first() {
    let mut pair = budget_pair();
    let eye = pair.attach_eye(Vec2::ZERO);
    let crates: Vec<Entity> = (1..=10)
        .map(|i| {
            let x = i as f32;
            let entity = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(x, 0.0));
            pair.server
                .insert_component(&entity, Position::new(x, 0.0))
                .unwrap();
            entity
        })
        .collect();

    let first = pair.step_one();
    assert!(first.entity_states.len() < crates.len() + 1);
    assert!(first.bit_length() as usize <= BUDGET_BYTES * 8);
    assert_eq!(first.entity_states[0].entity, eye);
    assert_eq!(first.entity_states[1].entity, crates[0]);

    let mut ticks = 1;
    while !crates
        .iter()
        .all(|entity| pair.client.client.has_entity(entity))
    {
        let state = pair.step_one();
        if state.entity_states.len() > 1 {
            assert!(state.bit_length() as usize <= BUDGET_BYTES * 8);
        }
        ticks += 1;
        assert!(ticks < 20, "deferred entities never caught up");
    }
    assert!(ticks > 1);

    for (i, entity) in crates.iter().enumerate() {
        assert_eq!(
            pair.client.client.component::<Position>(entity),
            Some(&Position::new((i + 1) as f32, 0.0))
        );
    }
}

#[test]
fn deferred_entity_changed_while_waiting_arrives_with_latest_state() {
    let mut pair = budget_pair();
    pair.attach_eye(Vec2::ZERO);
    let crates: Vec<Entity> = (1..=10)
        .map(|i| {
            let entity = pair
                .server
                .spawn_entity_at(TEST_MAP, Vec2::new(i as f32, 0.0));
            pair.server
                .insert_component(&entity, Position::new(0.0, 0.0))
                .unwrap();
            entity
        })
        .collect();
    let last = crates[crates.len() - 1];

    pair.step();
    assert!(!pair.client.client.has_entity(&last));
    pair.server.modify_component::<Position>(&last).unwrap().y = 3.0;

    for _ in 0..20 {
        pair.step();
    }
    assert_eq!(
        pair.client.client.component::<Position>(&last),
        Some(&Position::new(0.0, 3.0))
    );
}

#[test]
fn single_entity_larger_than_budget_is_still_sent() {
    let mut pair = TestPair::with_config(ServerConfig {
        pvs: PvsConfig {
            payload_budget_bytes: 1,
            ..Default::default()
        },
        ..Default::default()
    });
    let session = pair.session();
    let avatar = pair.server.spawn_entity();
    pair.server
        .insert_component(&avatar, Position::new(1.0, 1.0))
        .unwrap();
    pair.server
        .session_scope_mut(&session)
        .unwrap()
        .attach(&avatar)
        .unwrap();

    let state = pair.step_one();
    assert_eq!(state.entity_states.len(), 1);
    assert!(pair.client.client.has_entity(&avatar));
}

#[test]
fn budget_covers_growth_of_the_entity_count() {
    for budget_bytes in 60..=100 {
        let mut pair = TestPair::with_config(ServerConfig {
            pvs: PvsConfig {
                payload_budget_bytes: budget_bytes,
                ..Default::default()
            },
            ..Default::default()
        });
        pair.attach_eye(Vec2::ZERO);
        for i in 0..60 {
            pair.server
                .spawn_entity_at(TEST_MAP, Vec2::new(i as f32 * 0.1, 0.0));
        }

        let state = pair.step_one();
        assert!(state.entity_states.len() > 1);
        assert!(
            state.bit_length() as usize <= budget_bytes * 8,
            "{} bits sent under a {} byte budget",
            state.bit_length(),
            budget_bytes
        );
    }
}
