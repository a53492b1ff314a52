//! Core types for the fleet simulation

use std::fmt;

/// Index of a vertex in the navigation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

impl VertexId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Unique agent identity, handed out once and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// A 2D position in graph coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Move `step` units along the straight line towards `target`.
    /// The caller guarantees `step` does not exceed the distance to `target`.
    pub fn step_towards(&self, target: &Position, step: f64) -> Position {
        let distance = self.distance(target);
        if distance == 0.0 {
            return *self;
        }
        Position {
            x: self.x + (target.x - self.x) / distance * step,
            y: self.y + (target.y - self.y) / distance * step,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A named waypoint in the navigation graph
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Position,
    pub name: String,
}

impl Vertex {
    pub fn new(x: f64, y: f64, name: impl Into<String>) -> Self {
        Self {
            position: Position::new(x, y),
            name: name.into(),
        }
    }
}

/// An undirected connection between two vertices.
/// Its weight is derived from the vertex coordinates and never stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    pub a: VertexId,
    pub b: VertexId,
}

impl Lane {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            a: VertexId(a),
            b: VertexId(b),
        }
    }
}

/// Distance an agent covers per tick, in graph units
pub const DEFAULT_AGENT_SPEED: f64 = 2.0;

/// Default number of simulation ticks per simulated second
pub const DEFAULT_TICK_RATE_HZ: u32 = 10;

/// How long an agent pauses when no route to its destination exists
pub const NO_PATH_WAIT_SECS: f64 = 3.0;

/// How many times a waiting agent re-tries routing to the same destination
pub const DEFAULT_ROUTE_RETRIES: u32 = 3;
