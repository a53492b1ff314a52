//! Fleet Simulation Library
//!
//! Agents moving over a fixed waypoint graph, with a JSON graph loader and a
//! console renderer for running it headless.

pub mod console;
pub mod graph_file;
pub mod simulation;
