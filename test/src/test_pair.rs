use log::warn;

use vantage_client::{Client, ClientConfig};
use vantage_server::{Server, ServerConfig};
use vantage_shared::{BitReader, Entity, GameState, MapId, Protocol, Serde, SessionKey, Vec2};

use crate::{local_channel::LocalChannel, protocol, LocalLink};

/// Map every test entity lives on unless a test says otherwise
pub const TEST_MAP: MapId = MapId(1);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A client connected to a server through a [`LocalChannel`]
pub struct TestClient {
    pub session: SessionKey,
    pub client: Client,
    pub link: LocalLink,
}

impl TestClient {
    /// Connects a client that applies every state as soon as it arrives
    pub fn connect(server: &mut Server, protocol: Protocol) -> Self {
        Self::connect_with_config(server, protocol, ClientConfig::immediate())
    }

    pub fn connect_with_config(
        server: &mut Server,
        protocol: Protocol,
        config: ClientConfig,
    ) -> Self {
        let (channel, link) = LocalChannel::pair();
        let session = server
            .connect(Box::new(channel))
            .expect("session limit reached");
        Self {
            session,
            client: Client::new(config, protocol),
            link,
        }
    }

    /// Delivers every pending payload, applies what the client's buffer
    /// policy allows and acknowledges the newest received tick. Returns the
    /// delivered states.
    pub fn deliver(&mut self) -> Vec<GameState> {
        let mut delivered = Vec::new();
        for payload in self.link.take_sent() {
            let mut reader = BitReader::new(&payload);
            match GameState::de(&mut reader) {
                Ok(state) => delivered.push(state),
                Err(error) => warn!("Undecodable payload: {}", error),
            }
            if let Err(error) = self.client.receive(&payload) {
                warn!("Client rejected payload: {}", error);
            }
        }
        self.client.process_states();
        self.link.acknowledge(self.client.acknowledged_tick());
        delivered
    }

    /// Loses every pending payload
    pub fn drop_pending(&mut self) -> usize {
        self.link.drop_sent()
    }
}

/// One server and one client. The server starts on tick 1.
pub struct TestPair {
    pub server: Server,
    pub client: TestClient,
}

impl TestPair {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        init_logging();
        let mut server = Server::new(config, protocol());
        let client = TestClient::connect(&mut server, protocol());
        server.begin_tick();
        Self { server, client }
    }

    pub fn session(&self) -> SessionKey {
        self.client.session
    }

    /// Spawns an entity at `position` on [`TEST_MAP`] and attaches it to the
    /// client's session as its eye
    pub fn attach_eye(&mut self, position: Vec2) -> Entity {
        let session = self.session();
        let eye = self.server.spawn_entity_at(TEST_MAP, position);
        self.server
            .session_scope_mut(&session)
            .and_then(|mut scope| scope.attach(&eye).map(|_| ()))
            .expect("attaching eye");
        eye
    }

    /// Sends the current tick's states, delivers them and begins the next
    /// tick. Returns the states the client received.
    pub fn step(&mut self) -> Vec<GameState> {
        self.server.send_all_states();
        let delivered = self.client.deliver();
        self.server.begin_tick();
        delivered
    }

    /// Like [`TestPair::step`], but the tick's payload is lost
    pub fn step_lossy(&mut self) {
        self.server.send_all_states();
        self.client.drop_pending();
        self.server.begin_tick();
    }

    /// Steps once and returns the single state the client received
    pub fn step_one(&mut self) -> GameState {
        let mut delivered = self.step();
        assert_eq!(delivered.len(), 1, "expected exactly one state per tick");
        delivered.remove(0)
    }
}

impl Default for TestPair {
    fn default() -> Self {
        Self::new()
    }
}
