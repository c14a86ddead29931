//! Harness for exercising a vantage server and its clients in one process.

pub mod test_pair;
pub mod test_protocol;

pub use local_channel::{LocalChannel, LocalLink};
pub use test_pair::{init_logging, TestClient, TestPair, TEST_MAP};
pub use test_protocol::{protocol, Position, PositionState, Score, ScoreState, Secret, SecretState};
