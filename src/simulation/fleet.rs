//! Fleet controller that ties the navigation graph and agents together
//!
//! Owns every live agent, turns assignment requests into routes, and drives
//! the simulation tick.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, info, warn};

use super::agent::{Agent, AgentStatus};
use super::config::FleetConfig;
use super::error::{FleetError, FleetResult};
use super::nav_graph::NavGraph;
use super::types::{AgentId, Position, VertexId};

/// What happened to an assignment request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    /// A route was found and the agent started moving
    Dispatched { edges: usize },
    /// The destination is unreachable; the agent waits before retrying
    Waiting { ticks: u32 },
    /// The agent already has a task, nothing changed
    Busy,
}

/// Owner of the live agent set
pub struct FleetController {
    graph: Arc<NavGraph>,

    config: FleetConfig,

    /// Live agents, iterated in spawn order
    agents: BTreeMap<AgentId, Agent>,

    /// Re-route attempts left for agents waiting on an unreachable destination
    retries_left: HashMap<AgentId, u32>,

    next_id: u64,

    ticks: u64,
}

impl FleetController {
    /// Create a controller over `graph`.
    ///
    /// Fails with [`FleetError::EmptyGraph`] if the graph has no vertices,
    /// since agents could never be attached to it, and with
    /// [`FleetError::InvalidSpeed`] unless the configured speed is finite and
    /// positive.
    pub fn new(graph: Arc<NavGraph>, config: FleetConfig) -> FleetResult<Self> {
        if graph.is_empty() {
            return Err(FleetError::EmptyGraph);
        }
        let speed = config.agent_speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(FleetError::InvalidSpeed(speed));
        }

        Ok(Self {
            graph,
            config,
            agents: BTreeMap::new(),
            retries_left: HashMap::new(),
            next_id: 1,
            ticks: 0,
        })
    }

    pub fn graph(&self) -> &Arc<NavGraph> {
        &self.graph
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Live agents in spawn order
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Agents ever spawned, including removed ones
    pub fn spawned_count(&self) -> u64 {
        self.next_id - 1
    }

    /// Number of live agents in each status
    pub fn status_counts(&self) -> BTreeMap<AgentStatus, usize> {
        let mut counts: BTreeMap<AgentStatus, usize> =
            AgentStatus::ALL.iter().map(|status| (*status, 0)).collect();
        for agent in self.agents.values() {
            *counts.entry(agent.status()).or_default() += 1;
        }
        counts
    }

    fn next_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn an agent at `(x, y)`, attached to the nearest vertex
    pub fn spawn(&mut self, x: f64, y: f64) -> FleetResult<AgentId> {
        let vertex = self.graph.nearest_vertex(x, y)?;
        let id = self.next_agent_id();
        let agent = Agent::new(id, Position::new(x, y), vertex, self.config.agent_speed);
        self.agents.insert(id, agent);

        info!(
            "Spawned agent {} at ({:.1}, {:.1}) near {} {:?}",
            id,
            x,
            y,
            vertex,
            vertex_name(&self.graph, vertex)
        );
        Ok(id)
    }

    /// Spawn an agent exactly on a vertex
    pub fn spawn_at_vertex(&mut self, vertex: VertexId) -> FleetResult<AgentId> {
        let position = self
            .graph
            .vertex(vertex)
            .ok_or(FleetError::UnknownVertex(vertex))?
            .position;
        self.spawn(position.x, position.y)
    }

    /// Route an idle agent to `destination`.
    ///
    /// Busy agents are left untouched. An unreachable destination is not an
    /// error: the agent waits for the configured number of ticks and then
    /// re-tries the same destination.
    pub fn assign_task(
        &mut self,
        id: AgentId,
        destination: VertexId,
    ) -> FleetResult<AssignOutcome> {
        let agent = self.agents.get_mut(&id).ok_or(FleetError::NotFound(id))?;
        if !self.graph.contains(destination) {
            return Err(FleetError::UnknownVertex(destination));
        }

        if agent.status() != AgentStatus::Idle {
            debug!(
                "Agent {} is {}, ignoring assignment to {}",
                id,
                agent.status(),
                destination
            );
            return Ok(AssignOutcome::Busy);
        }

        match plan_route(&self.graph, agent.position(), destination)? {
            Some(waypoints) => {
                agent.assign_task(destination, &waypoints);
                self.retries_left.remove(&id);
                info!(
                    "Agent {} dispatched to {} {:?} ({} edges)",
                    id,
                    destination,
                    vertex_name(&self.graph, destination),
                    agent.route_length()
                );
                Ok(AssignOutcome::Dispatched {
                    edges: agent.route_length(),
                })
            }
            None => {
                let ticks = self.config.no_path_wait_ticks;
                agent.hold(destination, ticks);
                self.retries_left.insert(id, self.config.route_retries);
                warn!(
                    "No path for agent {} to {} {:?}, waiting {} ticks",
                    id,
                    destination,
                    vertex_name(&self.graph, destination),
                    ticks
                );
                // A zero-tick wait is over immediately
                retry_stalled(&self.graph, &self.config, &mut self.retries_left, agent);
                Ok(AssignOutcome::Waiting { ticks })
            }
        }
    }

    /// Main simulation tick: advance every agent once, in spawn order
    pub fn tick(&mut self) {
        self.ticks += 1;

        for agent in self.agents.values_mut() {
            agent.advance();

            if agent.is_stalled() {
                retry_stalled(&self.graph, &self.config, &mut self.retries_left, agent);
            }
        }
    }

    /// Remove an agent from the fleet and hand it back
    pub fn remove(&mut self, id: AgentId) -> FleetResult<Agent> {
        let agent = self.agents.remove(&id).ok_or(FleetError::NotFound(id))?;
        self.retries_left.remove(&id);
        info!("Removed agent {} ({})", id, agent.status());
        Ok(agent)
    }

    /// Remove every agent that has finished a route and is idle again.
    /// Returns the removed ids in spawn order.
    pub fn reap_finished(&mut self) -> Vec<AgentId> {
        let finished: Vec<AgentId> = self
            .agents
            .values()
            .filter(|agent| agent.should_be_removed())
            .map(Agent::id)
            .collect();

        for id in &finished {
            self.agents.remove(id);
            self.retries_left.remove(id);
        }

        if !finished.is_empty() {
            info!("Reaped {} finished agents", finished.len());
        }
        finished
    }
}

fn vertex_name(graph: &NavGraph, vertex: VertexId) -> &str {
    graph
        .vertex(vertex)
        .map(|vertex| vertex.name.as_str())
        .unwrap_or("")
}

/// Route from the vertex nearest to `from` to `destination`, as waypoint
/// coordinates. `None` if the two are not connected.
fn plan_route(
    graph: &NavGraph,
    from: Position,
    destination: VertexId,
) -> FleetResult<Option<Vec<Position>>> {
    let start = graph.nearest_vertex(from.x, from.y)?;

    Ok(graph.shortest_path(start, destination).map(|route| {
        route
            .into_iter()
            .map(|vertex| graph.vertices()[vertex.index()].position)
            .collect()
    }))
}

/// Re-route an agent that just finished waiting. Once its retries run out
/// the agent is left with an empty route and winds down to idle.
///
/// The graph is immutable and a waiting agent does not move, so with the
/// current controller a re-plan finds the same missing path and only the
/// wait-again and give-up branches are taken. The re-route branch matters
/// only once lanes can open at runtime.
fn retry_stalled(
    graph: &NavGraph,
    config: &FleetConfig,
    retries_left: &mut HashMap<AgentId, u32>,
    agent: &mut Agent,
) {
    let id = agent.id();
    let Some(destination) = agent.destination() else {
        return;
    };

    // Zero-tick waits end straight away, so keep going until the agent
    // either waits, resumes or gives up
    while agent.is_stalled() {
        let remaining = retries_left.remove(&id).unwrap_or(0);
        if remaining == 0 {
            warn!("Agent {} gave up on reaching {}", id, destination);
            return;
        }

        match plan_route(graph, agent.position(), destination) {
            Ok(Some(waypoints)) => {
                agent.resume_route(&waypoints);
                info!(
                    "Agent {} re-routed to {} ({} edges)",
                    id,
                    destination,
                    agent.route_length()
                );
            }
            Ok(None) => {
                agent.wait_again(config.no_path_wait_ticks);
                retries_left.insert(id, remaining - 1);
                debug!(
                    "Agent {} still has no path to {}, {} retries left",
                    id,
                    destination,
                    remaining - 1
                );
            }
            Err(e) => {
                warn!("Agent {} could not be re-routed: {}", id, e);
                return;
            }
        }
    }
}
