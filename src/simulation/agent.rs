//! Agent task and motion state machine
//!
//! An agent owns a continuous position and a queue of waypoint coordinates.
//! It never routes on its own: the fleet controller computes routes and hands
//! them over, and `advance` consumes them one tick at a time.

use std::collections::VecDeque;
use std::fmt;

use log::debug;

use super::types::{AgentId, Position, VertexId};

/// Task status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentStatus {
    /// No task, ready for assignment
    Idle,
    /// Following a route
    Moving,
    /// Paused for a fixed number of ticks before resuming
    Waiting,
    /// Route finished; resets to `Idle` on the next tick
    Complete,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 4] = [
        AgentStatus::Idle,
        AgentStatus::Moving,
        AgentStatus::Waiting,
        AgentStatus::Complete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Idle => "IDLE",
            AgentStatus::Moving => "MOVING",
            AgentStatus::Waiting => "WAITING",
            AgentStatus::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mobile agent in the fleet simulation
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    position: Position,
    /// Distance covered per tick
    speed: f64,
    status: AgentStatus,
    previous_status: AgentStatus,
    /// Waypoints still to visit, next one first
    route: VecDeque<Position>,
    destination: Option<VertexId>,
    /// Vertex the agent was at when its last task was assigned
    source: Option<VertexId>,
    /// Vertex the agent was attached to at spawn, then its last arrival
    current_vertex: VertexId,
    /// Hops in the route at assignment time
    route_length: usize,
    wait_ticks: u32,
    /// Set when a wait ends and the agent needs a route from the controller
    awaiting_route: bool,
    spawn_position: Position,
    /// Whether the agent's position has ever differed from its spawn point
    moved: bool,
    trips_completed: u32,
}

impl Agent {
    pub fn new(id: AgentId, position: Position, current_vertex: VertexId, speed: f64) -> Self {
        Self {
            id,
            position,
            speed,
            status: AgentStatus::Idle,
            previous_status: AgentStatus::Idle,
            route: VecDeque::new(),
            destination: None,
            source: None,
            current_vertex,
            route_length: 0,
            wait_ticks: 0,
            awaiting_route: false,
            spawn_position: position,
            moved: false,
            trips_completed: 0,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn previous_status(&self) -> AgentStatus {
        self.previous_status
    }

    pub fn has_status_changed(&self) -> bool {
        self.status != self.previous_status
    }

    pub fn destination(&self) -> Option<VertexId> {
        self.destination
    }

    pub fn source(&self) -> Option<VertexId> {
        self.source
    }

    pub fn current_vertex(&self) -> VertexId {
        self.current_vertex
    }

    /// Number of edges in the route as it was assigned. Does not shrink while
    /// the route is being consumed.
    pub fn route_length(&self) -> usize {
        self.route_length
    }

    pub fn remaining_waypoints(&self) -> impl ExactSizeIterator<Item = &Position> {
        self.route.iter()
    }

    pub fn wait_ticks(&self) -> u32 {
        self.wait_ticks
    }

    pub fn spawn_position(&self) -> Position {
        self.spawn_position
    }

    /// Tasks finished so far, including ones that ended without a route
    pub fn trips_completed(&self) -> u32 {
        self.trips_completed
    }

    pub fn has_moved_from_spawn(&self) -> bool {
        self.moved
    }

    /// An agent may be removed once it has finished at least one route and
    /// is not busy with another one.
    pub fn should_be_removed(&self) -> bool {
        self.trips_completed > 0 && self.status == AgentStatus::Idle
    }

    fn set_status(&mut self, status: AgentStatus) {
        self.previous_status = self.status;
        self.status = status;
    }

    /// Start following `route` towards `destination`.
    ///
    /// Does nothing unless the agent is idle; returns whether the task was
    /// taken. The route is copied, so the caller may reuse its buffer.
    pub fn assign_task(&mut self, destination: VertexId, route: &[Position]) -> bool {
        if self.status != AgentStatus::Idle {
            return false;
        }

        self.set_status(AgentStatus::Moving);
        self.destination = Some(destination);
        self.route = route.iter().copied().collect();
        self.route_length = route.len().saturating_sub(1);
        self.source = Some(self.current_vertex);
        self.awaiting_route = false;
        true
    }

    /// Park an idle agent for `ticks` ticks while keeping `destination` as
    /// its pending target. Used when no route to the destination exists.
    ///
    /// A zero-tick hold skips `Waiting` and leaves the agent stalled at once.
    pub fn hold(&mut self, destination: VertexId, ticks: u32) -> bool {
        if self.status != AgentStatus::Idle {
            return false;
        }

        self.destination = Some(destination);
        self.route.clear();
        self.route_length = 0;
        self.source = Some(self.current_vertex);
        self.start_wait(ticks);
        true
    }

    fn start_wait(&mut self, ticks: u32) {
        self.wait_ticks = ticks;
        if ticks == 0 {
            self.set_status(AgentStatus::Moving);
            self.awaiting_route = true;
        } else {
            self.set_status(AgentStatus::Waiting);
            self.awaiting_route = false;
        }
    }

    /// Whether the agent has come out of a wait with nothing to follow
    pub fn is_stalled(&self) -> bool {
        self.status == AgentStatus::Moving && self.awaiting_route
    }

    /// Install a route for a stalled agent that has been re-routed.
    pub fn resume_route(&mut self, route: &[Position]) -> bool {
        if !self.is_stalled() {
            return false;
        }

        self.route = route.iter().copied().collect();
        self.route_length = route.len().saturating_sub(1);
        self.awaiting_route = false;
        true
    }

    /// Send a stalled agent back into waiting after a failed re-route.
    /// With `ticks == 0` the agent stays stalled.
    pub fn wait_again(&mut self, ticks: u32) -> bool {
        if !self.is_stalled() {
            return false;
        }

        self.start_wait(ticks);
        true
    }

    /// Advance the agent by one simulation tick
    pub fn advance(&mut self) {
        match self.status {
            AgentStatus::Moving => {
                self.awaiting_route = false;
                self.advance_along_route();
            }
            AgentStatus::Waiting => {
                self.wait_ticks = self.wait_ticks.saturating_sub(1);
                if self.wait_ticks == 0 {
                    self.set_status(AgentStatus::Moving);
                    self.awaiting_route = true;
                } else {
                    // Keep previous_status in step so observers see no change
                    self.previous_status = self.status;
                }
            }
            AgentStatus::Complete => {
                self.destination = None;
                self.set_status(AgentStatus::Idle);
            }
            AgentStatus::Idle => {
                self.previous_status = self.status;
            }
        }
    }

    fn advance_along_route(&mut self) {
        let Some(next) = self.route.front().copied() else {
            self.complete(false);
            return;
        };

        let distance = self.position.distance(&next);
        if distance < self.speed {
            self.position = next;
            self.moved |= self.position != self.spawn_position;
            self.route.pop_front();
            if self.route.is_empty() {
                self.complete(true);
                return;
            }
        } else {
            self.position = self.position.step_towards(&next, self.speed);
        }
        self.moved |= self.position != self.spawn_position;
        self.previous_status = self.status;
    }

    /// Finish the current task. `arrived` is false when the route was empty
    /// to begin with, e.g. after giving up on an unreachable destination.
    fn complete(&mut self, arrived: bool) {
        if let (true, Some(destination)) = (arrived, self.destination) {
            self.current_vertex = destination;
        }
        self.trips_completed += 1;
        self.set_status(AgentStatus::Complete);
        debug!(
            "Agent {} completed route to {:?} at ({:.1}, {:.1})",
            self.id, self.destination, self.position.x, self.position.y
        );
    }
}
