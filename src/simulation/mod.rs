//! Standalone fleet simulation module
//!
//! This module contains the navigation graph, the agent state machine and
//! the fleet controller that drives them. It has no I/O of its own and can be
//! exercised directly from tests or the console driver.

mod agent;
mod config;
mod error;
mod fleet;
mod nav_graph;
mod types;

pub use agent::{Agent, AgentStatus};
pub use config::FleetConfig;
pub use error::{FleetError, FleetResult};
pub use fleet::{AssignOutcome, FleetController};
pub use nav_graph::NavGraph;
pub use types::{
    AgentId, Lane, Position, Vertex, VertexId, DEFAULT_AGENT_SPEED, DEFAULT_ROUTE_RETRIES,
    DEFAULT_TICK_RATE_HZ, NO_PATH_WAIT_SECS,
};
