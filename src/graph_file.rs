//! Navigation graph loading from JSON files
//!
//! The file holds one or more named levels, each with its own vertex and
//! lane lists:
//!
//! ```json
//! { "levels": { "l0": {
//!     "vertices": [[0.0, 0.0, {"name": "dock"}], [10.0, 0.0]],
//!     "lanes": [[0, 1, {"speed_limit": 0}]] } } }
//! ```
//!
//! Vertex attributes other than `name` and all lane attributes are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::simulation::{Lane, NavGraph, Vertex};

#[derive(Debug, Deserialize)]
struct GraphFile {
    levels: BTreeMap<String, Level>,
}

#[derive(Debug, Deserialize)]
struct Level {
    vertices: Vec<RawVertex>,
    #[serde(default)]
    lanes: Vec<RawLane>,
}

#[derive(Debug, Default, Deserialize)]
struct VertexAttributes {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVertex {
    WithAttributes(f64, f64, VertexAttributes),
    Bare(f64, f64),
}

impl RawVertex {
    fn into_vertex(self) -> Vertex {
        match self {
            RawVertex::WithAttributes(x, y, attributes) => Vertex::new(x, y, attributes.name),
            RawVertex::Bare(x, y) => Vertex::new(x, y, String::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLane {
    WithAttributes(usize, usize, serde_json::Value),
    Bare(usize, usize),
}

impl RawLane {
    fn into_lane(self) -> Lane {
        match self {
            RawLane::WithAttributes(a, b, _) | RawLane::Bare(a, b) => Lane::new(a, b),
        }
    }
}

/// Parse a navigation graph from a JSON string.
///
/// `level` selects a level by name; without one the first level in lexical
/// order is used.
pub fn parse_nav_graph(json: &str, level: Option<&str>) -> Result<NavGraph> {
    let mut file: GraphFile = serde_json::from_str(json).context("Failed to parse graph JSON")?;

    let (name, level) = match level {
        Some(name) => {
            let level = file
                .levels
                .remove(name)
                .with_context(|| format!("Level {:?} not found in graph file", name))?;
            (name.to_string(), level)
        }
        None => file
            .levels
            .into_iter()
            .next()
            .context("Graph file has no levels")?,
    };

    let vertices: Vec<Vertex> = level
        .vertices
        .into_iter()
        .map(RawVertex::into_vertex)
        .collect();
    let lanes: Vec<Lane> = level.lanes.into_iter().map(RawLane::into_lane).collect();

    let graph = NavGraph::new(vertices, lanes)
        .with_context(|| format!("Level {:?} is not a valid navigation graph", name))?;

    info!(
        "Loaded level {:?}: {} vertices, {} lanes",
        name,
        graph.vertex_count(),
        graph.lane_count()
    );
    Ok(graph)
}

/// Read and parse a navigation graph file
pub fn load_nav_graph(path: impl AsRef<Path>, level: Option<&str>) -> Result<NavGraph> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph file {}", path.display()))?;
    parse_nav_graph(&json, level).with_context(|| format!("Failed to load {}", path.display()))
}
