use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fleet_sim::console;
use fleet_sim::graph_file;
use fleet_sim::simulation::{AgentId, AgentStatus, FleetConfig, FleetController, VertexId};

#[derive(Parser)]
#[command(name = "fleet_sim")]
#[command(about = "Headless fleet simulation over a navigation graph")]
struct Cli {
    /// Navigation graph file
    #[arg(long, default_value = "data/nav_graph_1.json")]
    graph: PathBuf,

    /// Level inside the graph file (defaults to the first one)
    #[arg(long)]
    level: Option<String>,

    /// Number of agents spawned on random vertices
    #[arg(long, default_value = "3")]
    agents: usize,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "300")]
    ticks: u64,

    /// Ticks per simulated second
    #[arg(long, default_value = "10")]
    tick_rate: u32,

    /// Distance an agent covers per tick
    #[arg(long, default_value = "2.0")]
    speed: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Sleep one tick interval between ticks
    #[arg(long)]
    realtime: bool,

    /// Remove agents once they finish their first trip
    #[arg(long)]
    reap: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,fleet_sim=info"))
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.tick_rate > 0, "--tick-rate must be positive");
    anyhow::ensure!(
        cli.speed.is_finite() && cli.speed > 0.0,
        "--speed must be a positive number"
    );

    let graph = graph_file::load_nav_graph(&cli.graph, cli.level.as_deref())?;
    let config = FleetConfig::with_tick_rate(cli.tick_rate).agent_speed(cli.speed);
    let fleet = FleetController::new(Arc::new(graph), config)
        .context("Cannot run a fleet on this graph")?;

    run_headless(&cli, fleet)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli, mut fleet: FleetController) -> Result<()> {
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    info!("Running with seed {}", seed);

    println!("Running fleet simulation in headless mode...");
    println!("Ticks: {}, Tick rate: {} Hz", cli.ticks, cli.tick_rate);
    println!();

    let vertex_count = fleet.graph().vertex_count();
    for _ in 0..cli.agents {
        let vertex = VertexId(rng.random_range(0..vertex_count));
        let id = fleet.spawn_at_vertex(vertex)?;
        dispatch(&mut fleet, &mut rng, id)?;
    }

    println!("Initial state:");
    console::print_summary(&fleet);
    console::draw_map(&fleet);

    let ticks_per_second = u64::from(cli.tick_rate);
    let tick_interval = Duration::from_secs_f64(1.0 / f64::from(cli.tick_rate));
    let mut trips_completed = 0usize;
    let mut agents_removed = 0usize;

    let mut tick = 0;
    while tick < cli.ticks {
        // Run one simulated second (or the remaining ticks if fewer)
        let ticks_to_run = ticks_per_second.min(cli.ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;
            fleet.tick();

            // Complete lasts exactly one tick, so each trip is seen once
            trips_completed += fleet
                .agents()
                .filter(|agent| agent.status() == AgentStatus::Complete)
                .count();

            if cli.reap {
                agents_removed += fleet.reap_finished().len();
            }

            // Hand idle agents a new destination between ticks
            let idle: Vec<AgentId> = fleet
                .agents()
                .filter(|agent| agent.status() == AgentStatus::Idle)
                .map(|agent| agent.id())
                .collect();
            for id in idle {
                dispatch(&mut fleet, &mut rng, id)?;
            }

            if cli.realtime {
                std::thread::sleep(tick_interval);
            }
        }

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            tick as f64 / f64::from(cli.tick_rate)
        );
        console::print_summary(&fleet);
        console::draw_map(&fleet);
    }

    println!("=== SIMULATION COMPLETE ===");
    println!("Ticks run: {}", fleet.ticks());
    println!("Agents spawned: {}", fleet.spawned_count());
    println!("Trips completed: {}", trips_completed);
    println!("Agents removed: {}", agents_removed);
    println!("Active agents: {}", fleet.agent_count());
    Ok(())
}

/// Send an agent to a random vertex
fn dispatch(fleet: &mut FleetController, rng: &mut StdRng, id: AgentId) -> Result<()> {
    let vertex_count = fleet.graph().vertex_count();
    let destination = VertexId(rng.random_range(0..vertex_count));
    let outcome = fleet
        .assign_task(id, destination)
        .with_context(|| format!("Failed to assign agent {}", id))?;
    debug!("Assigned {} to {}: {:?}", id, destination, outcome);
    Ok(())
}
