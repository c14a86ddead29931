use thiserror::Error;

use vantage_shared::Entity;

use crate::NetGraph;

/// Errors that can occur while running a console command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("Invalid argument: Needs to be 0 or an entityId.")]
    InvalidEntityArgument { argument: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `net_graph`: toggles the network overlay
    NetGraph,
    /// `net_watchent [entity]`: watches an entity, or the local player's
    /// entity when no argument is given
    NetWatchEnt { entity: Option<Entity> },
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let mut args = line.split_whitespace();
        let name = args.next().unwrap_or_default();

        match name {
            "net_graph" => Ok(Self::NetGraph),
            "net_watchent" => match args.next() {
                None => Ok(Self::NetWatchEnt { entity: None }),
                Some(argument) => parse_entity(argument)
                    .map(|entity| Self::NetWatchEnt {
                        entity: Some(entity),
                    })
                    .ok_or_else(|| ConsoleError::InvalidEntityArgument {
                        argument: argument.to_string(),
                    }),
            },
            _ => Err(ConsoleError::UnknownCommand {
                name: name.to_string(),
            }),
        }
    }

    /// Runs the command against the net graph, returning the line to print.
    /// `local_entity` is the entity the local player controls, if any.
    pub fn execute(&self, net_graph: &mut NetGraph, local_entity: Option<Entity>) -> String {
        match self {
            Self::NetGraph => {
                if net_graph.toggle() {
                    "Enabled network overlay.".to_string()
                } else {
                    "Disabled network overlay.".to_string()
                }
            }
            Self::NetWatchEnt { entity } => {
                let watched = entity.or(local_entity);
                net_graph.set_enabled(true);
                net_graph.set_watch_entity(watched);
                match watched {
                    Some(entity) => format!("Watching entity {}.", entity),
                    None => "Not watching any entity.".to_string(),
                }
            }
        }
    }
}

/// Accepts `index` or `indexvgeneration`, as entities are displayed
fn parse_entity(argument: &str) -> Option<Entity> {
    match argument.split_once('v') {
        Some((index, generation)) => Some(Entity::new(
            index.parse().ok()?,
            generation.parse().ok()?,
        )),
        None => Some(Entity::new(argument.parse().ok()?, 0)),
    }
}
