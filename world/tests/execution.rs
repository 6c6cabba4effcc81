use std::time::Duration;

use glam::Vec3;
use tactics_core::{ActionId, CharacterId, Command, Event, GamePhase};
use tactics_world::{
    self as world,
    actions::{ActionHandler, ActionStatus},
    config::WorldConfig,
    query, World,
};

const FRAME: Duration = Duration::from_micros(16_667);

fn spawn(world: &mut World, position: Vec3, energy: u32) -> CharacterId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnCharacter {
            position,
            energy,
            buffer_energy: 0,
        },
        &mut events,
    );
    *query::character_ids(world).last().expect("spawned")
}

fn place(world: &mut World, character: CharacterId, hit_point: Vec3, action: &str) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::PlaceWaypoint {
            character,
            hit_point,
            action: ActionId::new(action),
        },
        &mut events,
    );
    assert!(
        matches!(events.first(), Some(Event::WaypointPlaced { .. })),
        "placement at {hit_point} failed: {events:?}"
    );
}

fn run_until<F>(world: &mut World, max_ticks: usize, mut done: F) -> Vec<Event>
where
    F: FnMut(&[Event]) -> bool,
{
    let mut log = Vec::new();
    for _ in 0..max_ticks {
        let mut events = Vec::new();
        world::apply(world, Command::Tick { dt: FRAME }, &mut events);
        let finished = done(&events);
        log.extend(events);
        if finished {
            return log;
        }
    }
    panic!("condition not reached within {max_ticks} ticks");
}

#[test]
fn character_walks_its_path_and_completes_once() {
    let mut world = World::new(WorldConfig::default());
    let id = spawn(&mut world, Vec3::ZERO, 4);
    place(&mut world, id, Vec3::new(600.0, 0.0, 0.0), "");

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartActionPhase, &mut events);
    assert_eq!(
        events,
        vec![
            Event::PathFollowingStarted {
                character: id,
                waypoints: 2,
            },
            Event::PhaseChanged {
                phase: GamePhase::Action,
            },
        ]
    );

    let log = run_until(&mut world, 600, |events| {
        events.contains(&Event::MovementCompleted { character: id })
    });
    let reached: Vec<usize> = log
        .iter()
        .filter_map(|event| match event {
            Event::WaypointReached { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(reached, vec![0, 1]);
    assert!(log.contains(&Event::ActionsSettled { character: id }));

    let position = query::character_position(&world, id).expect("position");
    assert!((position.x - 600.0).abs() <= 10.0, "stopped at {position}");
    assert!(!query::planner(&world, id).expect("planner").following);

    let mut trailing = Vec::new();
    for _ in 0..30 {
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut trailing);
    }
    assert!(
        !trailing
            .iter()
            .any(|event| matches!(event, Event::MovementCompleted { .. })),
        "completion must be signalled once per execution"
    );
}

#[test]
fn preparation_resets_paths_and_grants_round_energy() {
    let mut world = World::new(WorldConfig::default());
    let id = spawn(&mut world, Vec3::ZERO, 4);
    place(&mut world, id, Vec3::new(0.0, 600.0, 0.0), "");
    assert_eq!(query::energy(&world, id).map(|ledger| ledger.energy()), Some(2));

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartActionPhase, &mut events);
    let _ = run_until(&mut world, 600, |events| {
        events.contains(&Event::MovementCompleted { character: id })
    });

    events.clear();
    world::apply(&mut world, Command::StartPreparationPhase, &mut events);
    assert_eq!(
        events.last(),
        Some(&Event::PhaseChanged {
            phase: GamePhase::Preparation,
        })
    );

    let ledger = query::energy(&world, id).expect("ledger");
    assert_eq!(ledger.energy(), 4);
    assert_eq!(ledger.buffer_energy(), 1, "600 units travelled accrue one buffer unit");

    let snapshot = query::planner(&world, id).expect("planner");
    assert_eq!(snapshot.waypoints.len(), 1);
    assert!(snapshot.accepting);
    assert_eq!(snapshot.distance_travelled, 0.0);
    let origin = snapshot.waypoints[0].position;
    assert!((origin.y - 600.0).abs() <= 10.0);
}

#[test]
fn doubling_back_brakes_at_the_turn() {
    let mut world = World::new(WorldConfig::default());
    let id = spawn(&mut world, Vec3::ZERO, 10);
    place(&mut world, id, Vec3::new(600.0, 0.0, 0.0), "");
    place(&mut world, id, Vec3::new(0.0, 20.0, 0.0), "");

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartActionPhase, &mut events);
    let log = run_until(&mut world, 1200, |events| {
        events.contains(&Event::MovementCompleted { character: id })
    });

    let braked = log
        .iter()
        .filter(|event| matches!(event, Event::HardTurnBraked { .. }))
        .count();
    assert_eq!(braked, 1, "the reversal at the far waypoint must brake");
}

#[derive(Debug, Default)]
struct DeferredActions;

impl ActionHandler for DeferredActions {
    fn trigger(&mut self, _character: CharacterId, _action: &ActionId) -> ActionStatus {
        ActionStatus::InProgress
    }
}

#[test]
fn long_running_actions_delay_settlement() {
    let mut world = World::with_action_handler(WorldConfig::default(), Box::new(DeferredActions));
    let id = spawn(&mut world, Vec3::ZERO, 4);
    place(&mut world, id, Vec3::new(300.0, 0.0, 0.0), "turret");

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartActionPhase, &mut events);
    let log = run_until(&mut world, 600, |events| {
        events.contains(&Event::MovementCompleted { character: id })
    });
    assert!(log.contains(&Event::ActionTriggered {
        character: id,
        action: ActionId::new("turret").expect("action"),
    }));
    assert!(!log.contains(&Event::ActionsSettled { character: id }));

    events.clear();
    world::apply(
        &mut world,
        Command::ReportActionFinished { character: id },
        &mut events,
    );
    assert_eq!(events, vec![Event::ActionsSettled { character: id }]);
}

#[test]
fn deterministic_replay_produces_identical_logs() {
    let first = replay();
    let second = replay();
    assert_eq!(first, second, "replay diverged between runs");
    assert!(!first.is_empty());
}

fn replay() -> Vec<Event> {
    let mut world = World::new(WorldConfig::default());
    let mut log = Vec::new();
    let a = spawn(&mut world, Vec3::ZERO, 4);
    let b = spawn(&mut world, Vec3::new(1000.0, 0.0, 0.0), 4);
    place(&mut world, a, Vec3::new(300.0, 300.0, 0.0), "");
    place(&mut world, a, Vec3::new(300.0, 600.0, 0.0), "smoke");
    place(&mut world, b, Vec3::new(1000.0, 450.0, 0.0), "");

    world::apply(&mut world, Command::StartActionPhase, &mut log);
    for _ in 0..240 {
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut log);
    }
    world::apply(&mut world, Command::StartPreparationPhase, &mut log);
    log
}
