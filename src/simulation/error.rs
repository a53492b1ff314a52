//! Error taxonomy for the fleet simulation core

use thiserror::Error;

use super::types::{AgentId, VertexId};

/// Errors produced by the navigation graph and fleet controller.
///
/// "No path" between two vertices is deliberately absent: it is an expected
/// routing outcome and the controller absorbs it into the waiting policy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FleetError {
    #[error("invalid navigation graph: {0}")]
    InvalidGraph(String),

    #[error("navigation graph has no vertices")]
    EmptyGraph,

    #[error("agent {0} is not in the fleet")]
    NotFound(AgentId),

    #[error("vertex {0} does not exist")]
    UnknownVertex(VertexId),

    #[error("position ({x}, {y}) is not a finite coordinate")]
    InvalidPosition { x: f64, y: f64 },

    #[error("agent speed must be finite and positive, got {0}")]
    InvalidSpeed(f64),
}

pub type FleetResult<T> = Result<T, FleetError>;
