use std::default::Default;

use crate::pvs::PvsConfig;

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Used to configure visibility culling and payload budgets
    pub pvs: PvsConfig,
    /// Maximum number of simultaneous sessions, unlimited if `None`
    pub max_sessions: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            pvs: PvsConfig::default(),
            max_sessions: None,
        }
    }
}
