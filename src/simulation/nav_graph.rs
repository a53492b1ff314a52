//! Navigation graph for routing agents
//!
//! Immutable once built: vertices are fixed points with a name, lanes are
//! undirected connections weighted by the Euclidean distance between their
//! end points.

use std::fmt;

use ordered_float::OrderedFloat;
use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::error::{FleetError, FleetResult};
use super::types::{Lane, Position, Vertex, VertexId};

/// Entry stored in the spatial index: a vertex position with its id
#[derive(Debug, Clone)]
struct VertexEntry {
    point: [f64; 2],
    id: VertexId,
}

impl RTreeObject for VertexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VertexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Waypoint graph shared read-only by every agent
pub struct NavGraph {
    vertices: Vec<Vertex>,

    lanes: Vec<Lane>,

    /// Node `i` is vertex `i`; each edge carries the index of its lane
    graph: UnGraph<VertexId, usize>,

    /// Spatial index for nearest-vertex queries
    spatial_idx: RTree<VertexEntry>,
}

impl fmt::Debug for NavGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavGraph")
            .field("vertices", &self.vertices)
            .field("lanes", &self.lanes)
            .finish_non_exhaustive()
    }
}

impl NavGraph {
    /// Build a graph from an ordered vertex list and a lane list.
    ///
    /// Fails with [`FleetError::InvalidGraph`] if a lane references a vertex
    /// that does not exist or a vertex has a non-finite coordinate. An empty
    /// vertex list is accepted; queries against it report
    /// [`FleetError::EmptyGraph`].
    pub fn new(vertices: Vec<Vertex>, lanes: Vec<Lane>) -> FleetResult<Self> {
        if let Some((index, vertex)) = vertices
            .iter()
            .enumerate()
            .find(|(_, vertex)| !vertex.position.is_finite())
        {
            return Err(FleetError::InvalidGraph(format!(
                "vertex {} ({:?}) has a non-finite coordinate",
                index, vertex.name
            )));
        }

        for (index, lane) in lanes.iter().enumerate() {
            for end in [lane.a, lane.b] {
                if end.index() >= vertices.len() {
                    return Err(FleetError::InvalidGraph(format!(
                        "lane {} references vertex {} but the graph has {} vertices",
                        index,
                        end.index(),
                        vertices.len()
                    )));
                }
            }
        }

        let mut graph = UnGraph::<VertexId, usize>::with_capacity(vertices.len(), lanes.len());
        for index in 0..vertices.len() {
            graph.add_node(VertexId(index));
        }
        for (index, lane) in lanes.iter().enumerate() {
            // Parallel lanes are kept as separate edges
            graph.add_edge(NodeIndex::new(lane.a.index()), NodeIndex::new(lane.b.index()), index);
        }

        let entries = vertices
            .iter()
            .enumerate()
            .map(|(index, vertex)| VertexEntry {
                point: [vertex.position.x, vertex.position.y],
                id: VertexId(index),
            })
            .collect();

        Ok(Self {
            vertices,
            lanes,
            graph,
            spatial_idx: RTree::bulk_load(entries),
        })
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, id: VertexId) -> bool {
        id.index() < self.vertices.len()
    }

    fn hop_length(&self, a: VertexId, b: VertexId) -> Option<f64> {
        let a = self.vertices.get(a.index())?;
        let b = self.vertices.get(b.index())?;
        Some(a.position.distance(&b.position))
    }

    /// Length of a lane, i.e. the distance between its end points.
    /// `None` if the lane references a vertex outside this graph.
    pub fn lane_length(&self, lane: &Lane) -> Option<f64> {
        self.hop_length(lane.a, lane.b)
    }

    /// Total length of a vertex route, summing the hop between each pair.
    /// `None` if the route leaves this graph.
    pub fn route_length(&self, route: &[VertexId]) -> Option<f64> {
        route
            .windows(2)
            .map(|hop| self.hop_length(hop[0], hop[1]))
            .sum()
    }

    /// Bounding box of all vertices as (min, max) corners
    pub fn bounds(&self) -> Option<(Position, Position)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), vertex| {
            let p = vertex.position;
            (
                Position::new(min.x.min(p.x), min.y.min(p.y)),
                Position::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }

    /// Find the vertex closest to `(x, y)`.
    /// Equidistant vertices resolve to the lowest index.
    pub fn nearest_vertex(&self, x: f64, y: f64) -> FleetResult<VertexId> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(FleetError::InvalidPosition { x, y });
        }

        let query = [x, y];
        let mut candidates = self.spatial_idx.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = candidates.next().ok_or(FleetError::EmptyGraph)?;

        Ok(candidates
            .take_while(|(_, distance_2)| *distance_2 <= best)
            .map(|(entry, _)| entry.id)
            .fold(first.id, std::cmp::min))
    }

    /// Finds the cheapest route between two vertices using A* (Dijkstra with
    /// null heuristic).
    ///
    /// The result includes both end points. `start == end` yields `[start]`.
    /// `None` means the vertices are not connected (or either does not exist).
    pub fn shortest_path(&self, start: VertexId, end: VertexId) -> Option<Vec<VertexId>> {
        if !self.contains(start) || !self.contains(end) {
            return None;
        }
        if start == end {
            return Some(vec![start]);
        }

        let goal = NodeIndex::new(end.index());
        let (_, node_path) = astar(
            &self.graph,
            NodeIndex::new(start.index()),
            |node| node == goal,
            |edge| {
                let lane = &self.lanes[*edge.weight()];
                OrderedFloat(self.lane_length(lane).unwrap_or(f64::INFINITY))
            },
            |_| OrderedFloat(0.0),
        )?;

        Some(
            node_path
                .into_iter()
                .map(|node| VertexId(node.index()))
                .collect(),
        )
    }
}
