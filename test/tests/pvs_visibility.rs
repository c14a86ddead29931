use vantage_client::{DeleteEntityEvent, EnterPvsEvent, LeavePvsEvent};
use vantage_server::{PvsConfig, ServerConfig};
use vantage_shared::{Eye, MapId, Vec2};
use vantage_test::{Position, TestPair, TEST_MAP};

#[test]
fn view_range_is_a_box_around_the_eye() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    // outside the circle of radius 25 but inside the box
    let corner = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(20.0, 20.0));
    let far = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(30.0, 0.0));
    let other_map = pair.server.spawn_entity_at(MapId(2), Vec2::ZERO);
    let nowhere = pair.server.spawn_entity();

    pair.step();
    let client = &pair.client.client;
    assert!(client.has_entity(&corner));
    assert!(!client.has_entity(&far));
    assert!(!client.has_entity(&other_map));
    assert!(!client.has_entity(&nowhere));
}

#[test]
fn leaving_view_detaches_and_reentering_resends_full_state() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    let walker = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(5.0, 0.0));
    pair.server
        .insert_component(&walker, Position::new(5.0, 0.0))
        .unwrap();
    pair.step();
    pair.client.client.take_events();

    pair.server
        .set_local_position(&walker, Vec2::new(100.0, 0.0))
        .unwrap();
    pair.server.modify_component::<Position>(&walker).unwrap().x = 100.0;
    let state = pair.step_one();
    assert_eq!(state.left_pvs, vec![walker]);
    assert!(state.deletions.is_empty());
    assert!(state.entity_state(&walker).is_none());

    let client = &pair.client.client;
    assert!(client.has_entity(&walker));
    assert!(client.is_detached(&walker));
    // last known state is kept while out of view
    assert_eq!(client.component::<Position>(&walker).unwrap().x, 5.0);
    let mut events = pair.client.client.take_events();
    assert_eq!(events.read::<LeavePvsEvent>().collect::<Vec<_>>(), vec![walker]);

    // acknowledged, so the marker is not repeated
    assert!(pair.step_one().left_pvs.is_empty());

    pair.server
        .set_local_position(&walker, Vec2::new(6.0, 0.0))
        .unwrap();
    let state = pair.step_one();
    let entity_state = state.entity_state(&walker).unwrap();
    assert!(entity_state.change(&1).is_some());

    let client = &pair.client.client;
    assert!(!client.is_detached(&walker));
    assert_eq!(client.component::<Position>(&walker).unwrap().x, 100.0);
    let mut events = pair.client.client.take_events();
    assert_eq!(events.read::<EnterPvsEvent>().collect::<Vec<_>>(), vec![walker]);
}

#[test]
fn deletion_is_distinct_from_leaving_view() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    let doomed = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(1.0, 0.0));
    let wanderer = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(2.0, 0.0));
    pair.step();

    pair.server.despawn_entity(&doomed).unwrap();
    let state = pair.step_one();
    assert_eq!(state.deletions, vec![doomed]);
    assert!(state.left_pvs.is_empty());
    assert!(!pair.client.client.has_entity(&doomed));

    // an entity that left the view and is then deleted is still deleted
    pair.server
        .set_local_position(&wanderer, Vec2::new(500.0, 0.0))
        .unwrap();
    pair.step();
    assert!(pair.client.client.is_detached(&wanderer));

    pair.server.despawn_entity(&wanderer).unwrap();
    let state = pair.step_one();
    assert_eq!(state.deletions, vec![wanderer]);
    assert!(!pair.client.client.has_entity(&wanderer));
    let mut events = pair.client.client.take_events();
    assert!(events.read::<DeleteEntityEvent>().any(|entity| entity == wanderer));
}

#[test]
fn despawned_children_are_deleted_with_their_parent() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    let parent = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(1.0, 0.0));
    let child = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(1.0, 0.0));
    pair.server.set_parent(&child, Some(parent)).unwrap();
    pair.step();
    assert!(pair.client.client.has_entity(&child));

    let deleted = pair.server.despawn_entity(&parent).unwrap();
    assert_eq!(deleted, vec![child, parent]);
    let state = pair.step_one();
    let mut expected = vec![child, parent];
    expected.sort();
    assert_eq!(state.deletions, expected);
    assert!(!pair.client.client.has_entity(&child));
    assert!(!pair.client.client.has_entity(&parent));
}

#[test]
fn eye_mask_filters_by_visibility_layer_through_parents() {
    let mut pair = TestPair::new();
    let eye = pair.attach_eye(Vec2::ZERO);
    pair.server
        .insert_component(
            &eye,
            Eye {
                visibility_mask: 0b100,
                ..Default::default()
            },
        )
        .unwrap();

    let plain = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(1.0, 0.0));
    let ghost = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(2.0, 0.0));
    pair.server.add_layer(&ghost, 0b100).unwrap();
    let carried = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(1.0, 0.0));
    pair.server.set_parent(&carried, Some(ghost)).unwrap();

    pair.step();
    let client = &pair.client.client;
    assert!(client.has_entity(&eye));
    assert!(client.has_entity(&ghost));
    assert!(client.has_entity(&carried));
    assert!(!client.has_entity(&plain));
    // the eye's own state is replicated, with bit 0 restored on apply
    assert_eq!(client.component::<Eye>(&eye).unwrap().visibility_mask, 0b101);
}

#[test]
fn override_and_attached_entities_ignore_range() {
    let mut pair = TestPair::new();
    let session = pair.session();
    let avatar = pair.server.spawn_entity();
    pair.server
        .session_scope_mut(&session)
        .unwrap()
        .attach(&avatar)
        .unwrap();
    let beacon = pair.server.spawn_entity_at(MapId(7), Vec2::new(1000.0, 0.0));
    pair.server.set_pvs_override(&beacon, true).unwrap();
    let bystander = pair.server.spawn_entity_at(TEST_MAP, Vec2::ZERO);

    pair.step();
    let client = &pair.client.client;
    assert!(client.has_entity(&avatar));
    assert!(client.has_entity(&beacon));
    assert!(!client.has_entity(&bystander));

    assert!(pair.server.session_scope(&session).unwrap().has(&beacon));
    assert_eq!(
        pair.server.session_scope(&session).unwrap().attached(),
        Some(avatar)
    );
}

#[test]
fn view_subscription_adds_a_second_eye() {
    let mut pair = TestPair::new();
    pair.attach_eye(Vec2::ZERO);
    let session = pair.session();
    let camera = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(200.0, 0.0));
    let near_camera = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(205.0, 0.0));
    pair.server
        .session_scope_mut(&session)
        .unwrap()
        .add_view_subscriber(&camera)
        .unwrap();

    pair.step();
    assert!(pair.client.client.has_entity(&near_camera));

    pair.server
        .session_scope_mut(&session)
        .unwrap()
        .remove_view_subscriber(&camera)
        .unwrap();
    let state = pair.step_one();
    assert!(state.left_pvs.contains(&near_camera));
    assert!(state.left_pvs.contains(&camera));
}

#[test]
fn disabled_pvs_sends_everything_to_everyone() {
    let mut pair = TestPair::with_config(ServerConfig {
        pvs: PvsConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    });
    let far = pair.server.spawn_entity_at(MapId(3), Vec2::new(9000.0, 9000.0));
    let nowhere = pair.server.spawn_entity();
    pair.server
        .insert_component(&far, Position::new(1.0, 1.0))
        .unwrap();

    pair.step();
    assert!(pair.client.client.has_entity(&far));
    assert!(pair.client.client.has_entity(&nowhere));

    // still incremental
    assert!(pair.step_one().is_empty());
    pair.server.modify_component::<Position>(&far).unwrap().y = 4.0;
    let state = pair.step_one();
    assert_eq!(state.entity_states.len(), 1);
    assert_eq!(pair.client.client.component::<Position>(&far).unwrap().y, 4.0);
}
