//! Console rendering of the fleet
//!
//! Text summary and an ASCII map, used by the headless driver in place of a
//! graphical view.

use std::fmt::Write;

use crate::simulation::{FleetController, NavGraph, Position, VertexId};

/// Columns used by the widest side of the map
const MAP_WIDTH: usize = 60;

/// Display label for a vertex: its name, or its index when unnamed
pub fn vertex_label(graph: &NavGraph, vertex: VertexId) -> String {
    match graph.vertex(vertex) {
        Some(v) if !v.name.is_empty() => v.name.clone(),
        _ => vertex.to_string(),
    }
}

/// Build the summary printed by [`print_summary`]
pub fn format_summary(fleet: &FleetController) -> String {
    let graph = fleet.graph();
    let mut out = String::new();

    let _ = writeln!(out, "=== Fleet Simulation Summary ===");
    let _ = writeln!(out, "Tick: {}", fleet.ticks());
    let _ = writeln!(
        out,
        "Vertices: {}, Lanes: {}",
        graph.vertex_count(),
        graph.lane_count()
    );

    let counts: Vec<String> = fleet
        .status_counts()
        .into_iter()
        .map(|(status, count)| format!("{} {}", status, count))
        .collect();
    let _ = writeln!(out, "Agents: {} ({})", fleet.agent_count(), counts.join(", "));

    if fleet.agent_count() > 0 {
        let _ = writeln!(out, "--- Agents ---");
        for agent in fleet.agents() {
            let position = agent.position();
            let location = graph
                .nearest_vertex(position.x, position.y)
                .map(|vertex| vertex_label(graph, vertex))
                .unwrap_or_else(|_| "Unknown".to_string());
            let destination = agent
                .destination()
                .map(|vertex| vertex_label(graph, vertex))
                .unwrap_or_else(|| "None".to_string());

            let _ = writeln!(
                out,
                "  {}: position=({:.1}, {:.1}), status={}, at={}, destination={}, path_length={}",
                agent.id(),
                position.x,
                position.y,
                agent.status(),
                location,
                destination,
                agent.route_length()
            );
        }
    }

    out
}

/// Print a summary of the fleet state
pub fn print_summary(fleet: &FleetController) {
    print!("{}", format_summary(fleet));
}

/// Render the graph and agents as rows of characters.
/// North (larger y) is at the top.
pub fn render_map(fleet: &FleetController) -> Vec<String> {
    let graph = fleet.graph();
    let Some((min, max)) = graph.bounds() else {
        return Vec::new();
    };

    let span_x = (max.x - min.x).max(f64::EPSILON);
    let span_y = (max.y - min.y).max(f64::EPSILON);
    let scale = (MAP_WIDTH - 1) as f64 / span_x.max(span_y);
    // Terminal cells are roughly twice as tall as they are wide
    let row_scale = scale * 0.5;

    let width = (span_x * scale).round() as usize + 1;
    let height = (span_y * row_scale).round() as usize + 1;
    let mut grid = vec![vec![' '; width]; height];

    let to_grid = |p: Position| -> (usize, usize) {
        let col = ((p.x - min.x) * scale).round().max(0.0) as usize;
        let row = ((max.y - p.y) * row_scale).round().max(0.0) as usize;
        (row.min(height - 1), col.min(width - 1))
    };

    // Draw lanes
    for lane in graph.lanes() {
        let (start_row, start_col) = to_grid(graph.vertices()[lane.a.index()].position);
        let (end_row, end_col) = to_grid(graph.vertices()[lane.b.index()].position);

        // Simple line drawing (Bresenham)
        let dx = (end_col as i64 - start_col as i64).abs();
        let dy = (end_row as i64 - start_row as i64).abs();
        let sx = if start_col < end_col { 1 } else { -1 };
        let sy = if start_row < end_row { 1 } else { -1 };

        let mut err = dx - dy;
        let mut x = start_col as i64;
        let mut y = start_row as i64;

        loop {
            grid[y as usize][x as usize] = '.';

            if x == end_col as i64 && y == end_row as i64 {
                break;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    // Draw vertices
    for vertex in graph.vertices() {
        let (row, col) = to_grid(vertex.position);
        grid[row][col] = '+';
    }

    // Draw agents on top, marked by the first letter of their status
    for agent in fleet.agents() {
        let (row, col) = to_grid(agent.position());
        grid[row][col] = agent.status().as_str().chars().next().unwrap_or('?');
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect()
}

/// Draw a visual map of the fleet in the terminal
pub fn draw_map(fleet: &FleetController) {
    println!("\n=== Fleet Map ===");
    println!("Legend: +=Vertex, .=Lane, I/M/W/C=Agent (Idle/Moving/Waiting/Complete)");
    println!();
    for line in render_map(fleet) {
        println!("{}", line);
    }
    println!();
}
