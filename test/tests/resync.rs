use vantage_server::{ComponentStatus, PvsConfig, ServerConfig};
use vantage_shared::{ComponentKind, Vec2};
use vantage_test::{Position, Score, TestPair, TEST_MAP};

fn spawn_crate(pair: &mut TestPair, position: Vec2) -> vantage_shared::Entity {
    let tick = pair.server.current_tick();
    let entity = pair.server.spawn_entity_at(TEST_MAP, position);
    pair.server
        .insert_component(&entity, Position::new(position.x, position.y))
        .unwrap();
    pair.server
        .insert_component(
            &entity,
            Score {
                value: 1,
                changed_tick: tick,
            },
        )
        .unwrap();
    entity
}

#[test]
fn lagging_session_outside_history_gets_full_state() {
    let mut pair = TestPair::with_config(ServerConfig {
        pvs: PvsConfig {
            dirty_buffer_size: 180,
            ..Default::default()
        },
        ..Default::default()
    });
    let eye = pair.attach_eye(Vec2::ZERO);
    let crate_entity = spawn_crate(&mut pair, Vec2::new(3.0, 3.0));

    while pair.server.current_tick() <= 50 {
        pair.step();
    }
    assert_eq!(pair.client.link.acknowledged_tick(), Some(50));

    while pair.server.current_tick() < 300 {
        pair.step_lossy();
    }

    let state = pair.step_one();
    assert_eq!(state.to_tick, 300);
    assert_eq!(state.from_tick, None);
    let entity_state = state.entity_state(&crate_entity).unwrap();
    assert!(entity_state.change(&1).is_some());
    assert!(entity_state.change(&2).is_some());
    assert!(state.entity_state(&eye).is_some());

    let session = pair.server.session(&pair.session()).unwrap();
    assert_eq!(
        session.component_status(&crate_entity, &ComponentKind::of::<Position>()),
        Some(ComponentStatus::SentFull)
    );

    // caught up
    let state = pair.step_one();
    assert_eq!(state.from_tick, Some(300));
    assert!(state.is_empty());
}

#[test]
fn lost_entering_state_is_resent_in_full() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    pair.step();

    let crate_entity = spawn_crate(&mut pair, Vec2::new(4.0, 0.0));
    pair.step_lossy();
    assert!(!pair.client.client.has_entity(&crate_entity));

    let state = pair.step_one();
    let entity_state = state.entity_state(&crate_entity).unwrap();
    assert_eq!(entity_state.component_changes.len(), 2);
    assert_eq!(
        pair.client.client.component::<Position>(&crate_entity),
        Some(&Position::new(4.0, 0.0))
    );
}

#[test]
fn lost_delta_is_covered_by_the_next_state() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    let crate_entity = spawn_crate(&mut pair, Vec2::new(4.0, 0.0));
    pair.step();

    pair.server
        .modify_component::<Position>(&crate_entity)
        .unwrap()
        .y = 8.0;
    pair.step_lossy();

    let state = pair.step_one();
    assert!(state.entity_state(&crate_entity).is_some());
    assert_eq!(
        pair.client.client.component::<Position>(&crate_entity).unwrap().y,
        8.0
    );
}

#[test]
fn lost_markers_are_repeated_until_acknowledged() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    let leaver = spawn_crate(&mut pair, Vec2::new(4.0, 0.0));
    let doomed = spawn_crate(&mut pair, Vec2::new(5.0, 0.0));
    pair.step();

    pair.server
        .set_local_position(&leaver, Vec2::new(400.0, 0.0))
        .unwrap();
    pair.server.despawn_entity(&doomed).unwrap();
    pair.step_lossy();
    pair.step_lossy();

    let state = pair.step_one();
    assert_eq!(state.left_pvs, vec![leaver]);
    assert_eq!(state.deletions, vec![doomed]);
    assert!(pair.client.client.is_detached(&leaver));
    assert!(!pair.client.client.has_entity(&doomed));

    let state = pair.step_one();
    assert!(state.left_pvs.is_empty());
    assert!(state.deletions.is_empty());
}

#[test]
fn reconnecting_session_starts_from_full_state() {
    let mut pair = TestPair::new();
    let crate_entity = spawn_crate(&mut pair, Vec2::new(1.0, 0.0));
    pair.attach_eye(Vec2::ZERO);
    pair.step();

    let old_session = pair.session();
    pair.server.disconnect(&old_session).unwrap();
    assert!(!pair.server.session_exists(&old_session));

    pair.client = vantage_test::TestClient::connect(&mut pair.server, vantage_test::protocol());
    pair.attach_eye(Vec2::ZERO);
    let state = pair.step_one();
    assert_eq!(state.from_tick, None);
    assert_eq!(
        state
            .entity_state(&crate_entity)
            .unwrap()
            .component_changes
            .len(),
        2
    );
}

#[test]
fn component_removed_out_of_view_is_dropped_on_reentry() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    let crate_entity = spawn_crate(&mut pair, Vec2::new(4.0, 0.0));
    pair.step();
    assert!(pair.client.client.component::<Score>(&crate_entity).is_some());

    pair.server
        .set_local_position(&crate_entity, Vec2::new(100.0, 0.0))
        .unwrap();
    let state = pair.step_one();
    assert_eq!(state.left_pvs, vec![crate_entity]);
    assert!(pair.client.client.is_detached(&crate_entity));

    pair.server.remove_component::<Score>(&crate_entity);
    pair.step();
    pair.server
        .set_local_position(&crate_entity, Vec2::new(4.0, 0.0))
        .unwrap();
    let state = pair.step_one();

    assert!(state.entity_state(&crate_entity).unwrap().full);
    assert!(!pair.client.client.is_detached(&crate_entity));
    assert!(pair.client.client.component::<Score>(&crate_entity).is_none());
}

#[test]
fn lost_left_marker_then_reentry_still_drops_removed_component() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    let crate_entity = spawn_crate(&mut pair, Vec2::new(4.0, 0.0));
    pair.step();

    // the only left marker is lost and the entity is back before any ack
    pair.server
        .set_local_position(&crate_entity, Vec2::new(100.0, 0.0))
        .unwrap();
    pair.step_lossy();
    pair.server.remove_component::<Score>(&crate_entity);
    pair.server
        .set_local_position(&crate_entity, Vec2::new(4.0, 0.0))
        .unwrap();

    let state = pair.step_one();
    assert!(!state.left_pvs.contains(&crate_entity));
    let entity_state = state.entity_state(&crate_entity).unwrap();
    assert!(entity_state.full);
    assert!(entity_state.change(&2).is_none());
    assert!(!pair.client.client.is_detached(&crate_entity));

    for _ in 0..5 {
        pair.step();
    }
    assert!(pair.server.component::<Score>(&crate_entity).is_none());
    assert!(pair.client.client.component::<Score>(&crate_entity).is_none());
    assert_eq!(
        pair.client.client.component::<Position>(&crate_entity),
        Some(&Position::new(4.0, 0.0))
    );
}
