use vantage_server::{Server, ServerConfig, VantageServerError};
use vantage_shared::{Entity, EntityError, SessionKey, Vec2};
use vantage_test::{init_logging, protocol, LocalChannel, TestClient, TestPair, TEST_MAP};

#[test]
fn session_limit_is_enforced() {
    init_logging();
    let mut server = Server::new(
        ServerConfig {
            max_sessions: Some(1),
            ..Default::default()
        },
        protocol(),
    );

    let first = TestClient::connect(&mut server, protocol());
    let (channel, _link) = LocalChannel::pair();
    assert_eq!(
        server.connect(Box::new(channel)).err(),
        Some(VantageServerError::SessionLimitReached { max: 1 })
    );

    server.disconnect(&first.session).unwrap();
    let (channel, _link) = LocalChannel::pair();
    assert!(server.connect(Box::new(channel)).is_ok());
    assert_eq!(server.sessions_count(), 1);
}

#[test]
fn unknown_sessions_and_entities_are_reported() {
    let mut pair = TestPair::new();
    let missing = SessionKey::new(999);
    assert!(matches!(
        pair.server.session_scope(&missing),
        Err(VantageServerError::NoSuchSession { .. })
    ));
    assert!(pair.server.disconnect(&missing).is_err());

    let session = pair.session();
    let ghost = Entity::new(41, 0);
    let result = pair
        .server
        .session_scope_mut(&session)
        .unwrap()
        .attach(&ghost)
        .map(|_| ());
    assert_eq!(
        result,
        Err(VantageServerError::Entity(EntityError::EntityDoesNotExist {
            entity: ghost
        }))
    );
}

#[test]
fn despawned_eye_is_detached_from_session() {
    let mut pair = TestPair::new();
    let eye = pair.attach_eye(Vec2::ZERO);
    let neighbour = pair.server.spawn_entity_at(TEST_MAP, Vec2::new(2.0, 0.0));
    pair.step();
    assert!(pair.client.client.has_entity(&neighbour));

    pair.server.despawn_entity(&eye).unwrap();
    let session = pair.session();
    assert_eq!(pair.server.session_scope(&session).unwrap().attached(), None);

    let state = pair.step_one();
    assert_eq!(state.deletions, vec![eye]);
    assert_eq!(state.left_pvs, vec![neighbour]);
}

#[test]
fn payloads_are_sent_every_tick_even_when_empty() {
    let mut pair = TestPair::new();
    for _ in 0..5 {
        pair.step();
    }
    assert_eq!(pair.client.link.sent_count(), 5);
    assert_eq!(pair.client.client.acknowledged_tick(), Some(5));
}
