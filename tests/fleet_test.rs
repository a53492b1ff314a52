//! Fleet controller scenarios

use std::sync::Arc;

use fleet_sim::simulation::{
    AgentId, AgentStatus, AssignOutcome, FleetConfig, FleetController, FleetError, Lane,
    NavGraph, Position, Vertex, VertexId,
};

const A: VertexId = VertexId(0);
const B: VertexId = VertexId(1);
const C: VertexId = VertexId(2);
const D: VertexId = VertexId(3);

/// A(0,0) - B(10,0) - C(20,0), with D(0,10) left unconnected
fn line_graph() -> Arc<NavGraph> {
    Arc::new(
        NavGraph::new(
            vec![
                Vertex::new(0.0, 0.0, "A"),
                Vertex::new(10.0, 0.0, "B"),
                Vertex::new(20.0, 0.0, "C"),
                Vertex::new(0.0, 10.0, "D"),
            ],
            vec![Lane::new(0, 1), Lane::new(1, 2)],
        )
        .expect("line graph is valid"),
    )
}

fn fleet() -> FleetController {
    FleetController::new(line_graph(), FleetConfig::default()).expect("graph is not empty")
}

fn run_until_idle(fleet: &mut FleetController, id: AgentId, max_ticks: usize) -> Vec<Position> {
    let mut positions = Vec::new();
    for _ in 0..max_ticks {
        fleet.tick();
        let agent = fleet.agent(id).expect("agent is live");
        positions.push(agent.position());
        if agent.status() == AgentStatus::Idle {
            return positions;
        }
    }
    panic!("agent {} did not return to idle in {} ticks", id, max_ticks);
}

#[test]
fn test_default_config_waits_three_seconds() {
    let config = FleetConfig::default();
    assert_eq!(config.no_path_wait_ticks, 30);
    assert_eq!(config.agent_speed, 2.0);
    assert_eq!(FleetConfig::with_tick_rate(20).no_path_wait_ticks, 60);
}

#[test]
fn test_empty_graph_is_rejected() {
    let graph = Arc::new(NavGraph::new(vec![], vec![]).unwrap());
    let result = FleetController::new(graph, FleetConfig::default());
    assert_eq!(result.err(), Some(FleetError::EmptyGraph));
}

#[test]
fn test_spawn_attaches_nearest_vertex() {
    let mut fleet = fleet();
    let id = fleet.spawn(9.0, 1.0).unwrap();

    let agent = fleet.agent(id).unwrap();
    assert_eq!(agent.status(), AgentStatus::Idle);
    assert_eq!(agent.position(), Position::new(9.0, 1.0));
    assert_eq!(agent.current_vertex(), B);
    assert_eq!(fleet.agent_count(), 1);
}

#[test]
fn test_ids_are_never_reused() {
    let mut fleet = fleet();
    let first = fleet.spawn(0.0, 0.0).unwrap();
    let second = fleet.spawn(10.0, 0.0).unwrap();
    fleet.remove(second).unwrap();
    let third = fleet.spawn(20.0, 0.0).unwrap();

    assert_eq!(first, AgentId(1));
    assert_eq!(second, AgentId(2));
    assert_eq!(third, AgentId(3));
    assert_eq!(third.to_string(), "R3");
    assert_eq!(fleet.spawned_count(), 3);
}

#[test]
fn test_line_scenario_reaches_destination() {
    let mut fleet = fleet();
    let id = fleet.spawn(0.0, 0.0).unwrap();

    let outcome = fleet.assign_task(id, C).unwrap();
    assert_eq!(outcome, AssignOutcome::Dispatched { edges: 2 });

    let agent = fleet.agent(id).unwrap();
    assert_eq!(agent.status(), AgentStatus::Moving);
    assert_eq!(agent.source(), Some(A));
    assert_eq!(agent.destination(), Some(C));
    assert_eq!(
        agent.remaining_waypoints().copied().collect::<Vec<_>>(),
        vec![
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(20.0, 0.0)
        ]
    );

    let positions = run_until_idle(&mut fleet, id, 100);
    let at_b = positions
        .iter()
        .position(|p| *p == Position::new(10.0, 0.0))
        .expect("agent passes through B");
    let at_c = positions
        .iter()
        .position(|p| *p == Position::new(20.0, 0.0))
        .expect("agent reaches C");
    assert!(at_b < at_c);

    let agent = fleet.agent(id).unwrap();
    assert_eq!(agent.status(), AgentStatus::Idle);
    assert_eq!(agent.position(), Position::new(20.0, 0.0));
    assert_eq!(agent.route_length(), 2);
    assert_eq!(agent.destination(), None);
    assert_eq!(agent.current_vertex(), C);
    assert!(agent.should_be_removed());
}

#[test]
fn test_assign_to_own_vertex_completes_quickly() {
    let mut fleet = fleet();
    let id = fleet.spawn(10.0, 0.0).unwrap();

    assert_eq!(
        fleet.assign_task(id, B).unwrap(),
        AssignOutcome::Dispatched { edges: 0 }
    );
    fleet.tick();
    assert_eq!(fleet.agent(id).unwrap().status(), AgentStatus::Complete);
    fleet.tick();
    assert_eq!(fleet.agent(id).unwrap().status(), AgentStatus::Idle);
}

#[test]
fn test_unreachable_destination_waits() {
    let mut fleet = fleet();
    let id = fleet.spawn(0.0, 0.0).unwrap();

    let outcome = fleet.assign_task(id, D).unwrap();
    assert_eq!(outcome, AssignOutcome::Waiting { ticks: 30 });

    let agent = fleet.agent(id).unwrap();
    assert_eq!(agent.status(), AgentStatus::Waiting);
    assert_eq!(agent.wait_ticks(), 30);
    assert_eq!(agent.destination(), Some(D));
    assert_eq!(agent.route_length(), 0);

    for _ in 0..29 {
        fleet.tick();
    }
    let agent = fleet.agent(id).unwrap();
    assert_eq!(agent.status(), AgentStatus::Waiting);
    assert_eq!(agent.position(), Position::new(0.0, 0.0));
}

#[test]
fn test_retries_then_gives_up_on_unreachable_destination() {
    let config = FleetConfig::default()
        .no_path_wait_ticks(2)
        .route_retries(1);
    let mut fleet = FleetController::new(line_graph(), config).unwrap();
    let id = fleet.spawn(0.0, 0.0).unwrap();
    fleet.assign_task(id, D).unwrap();

    let mut statuses = Vec::new();
    for _ in 0..6 {
        fleet.tick();
        statuses.push(fleet.agent(id).unwrap().status());
    }

    assert_eq!(
        statuses,
        vec![
            AgentStatus::Waiting,  // countdown 1
            AgentStatus::Waiting,  // re-route failed, waiting again
            AgentStatus::Waiting,  // countdown 1
            AgentStatus::Moving,   // out of retries, nothing to follow
            AgentStatus::Complete,
            AgentStatus::Idle,
        ]
    );

    let agent = fleet.agent(id).unwrap();
    assert_eq!(agent.position(), Position::new(0.0, 0.0));
    assert_eq!(agent.current_vertex(), A);
    assert_eq!(agent.destination(), None);
    assert!(agent.should_be_removed());
}

#[test]
fn test_without_retries_agent_falls_through_after_waiting() {
    let config = FleetConfig::default()
        .no_path_wait_ticks(3)
        .route_retries(0);
    let mut fleet = FleetController::new(line_graph(), config).unwrap();
    let id = fleet.spawn(20.0, 0.0).unwrap();
    fleet.assign_task(id, D).unwrap();

    for _ in 0..3 {
        fleet.tick();
    }
    assert_eq!(fleet.agent(id).unwrap().status(), AgentStatus::Moving);
    fleet.tick();
    assert_eq!(fleet.agent(id).unwrap().status(), AgentStatus::Complete);
}

#[test]
fn test_busy_agent_ignores_assignment() {
    let mut fleet = fleet();
    let id = fleet.spawn(0.0, 0.0).unwrap();
    fleet.assign_task(id, C).unwrap();
    fleet.tick();
    fleet.tick();

    let before = fleet.agent(id).unwrap().clone();
    assert_eq!(fleet.assign_task(id, A).unwrap(), AssignOutcome::Busy);
    let after = fleet.agent(id).unwrap();

    assert_eq!(after.status(), before.status());
    assert_eq!(after.position(), before.position());
    assert_eq!(after.destination(), before.destination());
    assert_eq!(
        after.remaining_waypoints().collect::<Vec<_>>(),
        before.remaining_waypoints().collect::<Vec<_>>()
    );
}

#[test]
fn test_waiting_agent_ignores_assignment() {
    let mut fleet = fleet();
    let id = fleet.spawn(0.0, 0.0).unwrap();
    fleet.assign_task(id, D).unwrap();

    assert_eq!(fleet.assign_task(id, C).unwrap(), AssignOutcome::Busy);
    assert_eq!(fleet.agent(id).unwrap().destination(), Some(D));
}

#[test]
fn test_assign_to_unknown_vertex_fails() {
    let mut fleet = fleet();
    let id = fleet.spawn(0.0, 0.0).unwrap();
    assert_eq!(
        fleet.assign_task(id, VertexId(17)),
        Err(FleetError::UnknownVertex(VertexId(17)))
    );
    assert_eq!(fleet.agent(id).unwrap().status(), AgentStatus::Idle);
}

#[test]
fn test_assign_to_removed_agent_fails() {
    let mut fleet = fleet();
    let id = fleet.spawn(0.0, 0.0).unwrap();
    fleet.remove(id).unwrap();
    assert_eq!(fleet.assign_task(id, C), Err(FleetError::NotFound(id)));
}

#[test]
fn test_double_remove_fails_and_keeps_fleet() {
    let mut fleet = fleet();
    let first = fleet.spawn(0.0, 0.0).unwrap();
    let second = fleet.spawn(20.0, 0.0).unwrap();

    let removed = fleet.remove(first).unwrap();
    assert_eq!(removed.id(), first);
    assert_eq!(fleet.agent_count(), 1);

    assert_eq!(fleet.remove(first).err(), Some(FleetError::NotFound(first)));
    assert_eq!(fleet.agent_count(), 1);
    assert!(fleet.agent(second).is_some());
}

#[test]
fn test_tick_advances_every_agent_in_spawn_order() {
    let mut fleet = fleet();
    let left = fleet.spawn(0.0, 0.0).unwrap();
    let right = fleet.spawn(20.0, 0.0).unwrap();
    fleet.assign_task(left, C).unwrap();
    fleet.assign_task(right, A).unwrap();

    for _ in 0..4 {
        fleet.tick();
    }
    assert_eq!(fleet.ticks(), 4);

    let ids: Vec<AgentId> = fleet.agents().map(|agent| agent.id()).collect();
    assert_eq!(ids, vec![left, right]);

    // Mirror-image routes, so positions mirror each other
    let l = fleet.agent(left).unwrap().position();
    let r = fleet.agent(right).unwrap().position();
    assert_eq!(l, Position::new(6.0, 0.0));
    assert_eq!(r, Position::new(14.0, 0.0));
}

#[test]
fn test_reap_finished_only_removes_idle_finished_agents() {
    let mut fleet = fleet();
    let finisher = fleet.spawn(10.0, 0.0).unwrap();
    let traveller = fleet.spawn(0.0, 0.0).unwrap();
    let fresh = fleet.spawn(20.0, 0.0).unwrap();

    fleet.assign_task(finisher, B).unwrap();
    fleet.assign_task(traveller, C).unwrap();
    fleet.tick();
    fleet.tick();

    assert!(fleet.agent(finisher).unwrap().should_be_removed());
    assert_eq!(fleet.reap_finished(), vec![finisher]);
    assert!(fleet.agent(finisher).is_none());
    assert!(fleet.agent(traveller).is_some());
    assert!(fleet.agent(fresh).is_some());
    assert!(fleet.reap_finished().is_empty());
}

#[test]
fn test_status_counts() {
    let mut fleet = fleet();
    let moving = fleet.spawn(0.0, 0.0).unwrap();
    let waiting = fleet.spawn(10.0, 0.0).unwrap();
    fleet.spawn(20.0, 0.0).unwrap();
    fleet.assign_task(moving, C).unwrap();
    fleet.assign_task(waiting, D).unwrap();

    let counts = fleet.status_counts();
    assert_eq!(counts[&AgentStatus::Idle], 1);
    assert_eq!(counts[&AgentStatus::Moving], 1);
    assert_eq!(counts[&AgentStatus::Waiting], 1);
    assert_eq!(counts[&AgentStatus::Complete], 0);
}

#[test]
fn test_agent_speed_comes_from_config() {
    let mut fleet =
        FleetController::new(line_graph(), FleetConfig::default().agent_speed(5.0)).unwrap();
    let id = fleet.spawn(0.0, 0.0).unwrap();
    fleet.assign_task(id, B).unwrap();

    fleet.tick();
    fleet.tick();
    assert_eq!(fleet.agent(id).unwrap().speed(), 5.0);
    assert_eq!(fleet.agent(id).unwrap().position(), Position::new(5.0, 0.0));
}

#[test]
fn test_non_positive_speed_is_rejected() {
    for speed in [0.0, -2.0, f64::NAN, f64::INFINITY] {
        let result = FleetController::new(line_graph(), FleetConfig::default().agent_speed(speed));
        assert!(
            matches!(result, Err(FleetError::InvalidSpeed(_))),
            "speed {} was accepted",
            speed
        );
    }
}

#[test]
fn test_spawn_at_non_finite_position_fails() {
    let mut fleet = fleet();
    assert!(matches!(
        fleet.spawn(f64::NAN, 0.0),
        Err(FleetError::InvalidPosition { .. })
    ));
    assert!(matches!(
        fleet.spawn(0.0, f64::INFINITY),
        Err(FleetError::InvalidPosition { .. })
    ));
    assert_eq!(fleet.agent_count(), 0);

    // Failed spawns do not use up ids
    assert_eq!(fleet.spawn(0.0, 0.0).unwrap(), AgentId(1));
}

#[test]
fn test_zero_wait_retries_run_immediately() {
    let config = FleetConfig::default()
        .no_path_wait_ticks(0)
        .route_retries(2);
    let mut fleet = FleetController::new(line_graph(), config).unwrap();
    let id = fleet.spawn(0.0, 0.0).unwrap();

    let outcome = fleet.assign_task(id, D).unwrap();
    assert_eq!(outcome, AssignOutcome::Waiting { ticks: 0 });
    assert_eq!(fleet.agent(id).unwrap().status(), AgentStatus::Moving);

    fleet.tick();
    assert_eq!(fleet.agent(id).unwrap().status(), AgentStatus::Complete);
    fleet.tick();
    let agent = fleet.agent(id).unwrap();
    assert_eq!(agent.status(), AgentStatus::Idle);
    assert_eq!(agent.current_vertex(), A);
    assert!(!agent.has_moved_from_spawn());
}
