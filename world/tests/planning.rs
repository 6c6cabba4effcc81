use glam::Vec3;
use tactics_core::{
    ActionId, ActionSwapRejection, CancelRejection, CharacterId, Command, Event,
    PlacementRejection, WaypointKind,
};
use tactics_world::{self as world, config::WorldConfig, query, World};

fn world_with_character(energy: u32, buffer_energy: u32) -> (World, CharacterId) {
    let mut world = World::new(WorldConfig::default());
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnCharacter {
            position: Vec3::ZERO,
            energy,
            buffer_energy,
        },
        &mut events,
    );
    let character = query::character_ids(&world)[0];
    (world, character)
}

fn place(world: &mut World, character: CharacterId, hit_point: Vec3, action: &str) -> Vec<Event> {
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
    events
}

fn cancel(world: &mut World, character: CharacterId) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::CancelLastWaypoint { character }, &mut events);
    events
}

#[test]
fn card_then_movement_then_cancel_scenario() {
    let (mut world, id) = world_with_character(4, 0);

    let events = place(&mut world, id, Vec3::new(250.0, 0.0, 0.0), "grenade");
    assert_eq!(
        events[0],
        Event::WaypointPlaced {
            character: id,
            index: 1,
            position: Vec3::new(250.0, 0.0, 0.0),
            cost: 1,
            kind: WaypointKind::Card,
            action: ActionId::new("grenade"),
        }
    );
    assert_eq!(query::energy(&world, id).map(|ledger| ledger.energy()), Some(3));

    let events = place(&mut world, id, Vec3::new(350.0, 0.0, 0.0), "");
    assert_eq!(
        events,
        vec![Event::WaypointPlacementRejected {
            character: id,
            position: Vec3::new(350.0, 0.0, 0.0),
            kind: WaypointKind::Movement,
            reason: PlacementRejection::TooCloseToLastWaypoint,
        }],
        "movement waypoints within the radius are too close"
    );

    let events = cancel(&mut world, id);
    assert!(matches!(
        events[0],
        Event::WaypointCancelled {
            index: 1,
            refund: 1,
            restored: 1,
            ..
        }
    ));
    assert_eq!(query::energy(&world, id).map(|ledger| ledger.energy()), Some(4));
    let snapshot = query::planner(&world, id).expect("planner");
    assert_eq!(snapshot.waypoints.len(), 1);
}

#[test]
fn too_close_wins_over_insufficient_energy() {
    let (mut world, id) = world_with_character(0, 0);
    let events = place(&mut world, id, Vec3::new(120.0, 80.0, 0.0), "");
    assert!(matches!(
        events[0],
        Event::WaypointPlacementRejected {
            reason: PlacementRejection::TooCloseToLastWaypoint,
            ..
        }
    ));
}

#[test]
fn card_waypoints_are_rejected_solely_on_energy() {
    let (mut world, id) = world_with_character(1, 0);

    let events = place(&mut world, id, Vec3::new(0.0, 650.0, 0.0), "flashbang");
    assert!(matches!(
        events[0],
        Event::WaypointPlacementRejected {
            reason: PlacementRejection::InsufficientEnergy,
            ..
        }
    ));

    let before = query::available_energy(&world, id).expect("energy");
    let events = place(&mut world, id, Vec3::new(0.0, 350.0, 0.0), "flashbang");
    assert!(matches!(events[0], Event::WaypointPlaced { cost: 1, .. }));
    assert_eq!(query::available_energy(&world, id), Some(before - 1));
}

#[test]
fn place_then_cancel_restores_both_pools() {
    for (energy, buffer, distance) in [(4, 0, 250.0), (4, 1, 250.0), (1, 3, 1100.0), (2, 2, 800.0)] {
        let (mut world, id) = world_with_character(energy, buffer);
        let before = query::energy(&world, id).expect("ledger");

        let events = place(&mut world, id, Vec3::new(distance, 0.0, 0.0), "");
        assert!(
            matches!(events[0], Event::WaypointPlaced { .. }),
            "placement at {distance} should succeed: {events:?}"
        );
        let _ = cancel(&mut world, id);

        assert_eq!(
            query::energy(&world, id),
            Some(before),
            "cancellation must invert placement at {distance}"
        );
    }
}

#[test]
fn starting_waypoint_is_never_cancellable() {
    let (mut world, id) = world_with_character(4, 0);
    assert!(!query::can_cancel_last_waypoint(&world, id));

    let events = cancel(&mut world, id);
    assert_eq!(
        events,
        vec![Event::WaypointCancelRejected {
            character: id,
            reason: CancelRejection::OnlyStartingWaypoint,
        }]
    );

    let _ = place(&mut world, id, Vec3::new(300.0, 0.0, 0.0), "");
    assert!(query::can_cancel_last_waypoint(&world, id));
    let _ = cancel(&mut world, id);
    assert!(!query::can_cancel_last_waypoint(&world, id));
}

#[test]
fn placement_context_tracks_the_last_waypoint() {
    let (mut world, id) = world_with_character(4, 1);
    let context = query::placement_context(&world, id).expect("context");
    assert_eq!(context.last_waypoint, Some(Vec3::ZERO));
    assert_eq!(context.available_energy, 6);
    assert!(context.accepting);

    let _ = place(&mut world, id, Vec3::new(0.0, 300.0, 0.0), "");
    let context = query::placement_context(&world, id).expect("context");
    assert_eq!(context.last_waypoint, Some(Vec3::new(0.0, 300.0, 0.0)));
    assert_eq!(
        query::last_waypoint_position(&world, id),
        Some(Vec3::new(0.0, 300.0, 0.0))
    );
}

#[test]
fn reset_path_empties_the_plan() {
    let (mut world, id) = world_with_character(4, 0);
    let _ = place(&mut world, id, Vec3::new(300.0, 0.0, 0.0), "");

    let mut events = Vec::new();
    world::apply(&mut world, Command::ResetPath { character: id }, &mut events);
    assert_eq!(events, vec![Event::PathCleared { character: id }]);
    assert_eq!(query::last_waypoint_position(&world, id), None);

    events.clear();
    world::apply(
        &mut world,
        Command::StartFollowingPath { character: id },
        &mut events,
    );
    assert!(events.is_empty(), "an empty path cannot be followed");
    assert!(!query::planner(&world, id).expect("planner").following);
}

fn swap(world: &mut World, character: CharacterId, index: usize, action: &str) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SwapWaypointAction {
            character,
            index,
            action: ActionId::new(action).expect("action"),
        },
        &mut events,
    );
    events
}

#[test]
fn card_actions_can_be_swapped_while_planning() {
    let (mut world, id) = world_with_character(4, 0);
    let _ = place(&mut world, id, Vec3::new(250.0, 0.0, 0.0), "grenade");

    let events = swap(&mut world, id, 1, "smoke");
    assert_eq!(
        events,
        vec![Event::WaypointActionSwapped {
            character: id,
            index: 1,
            previous: ActionId::new("grenade").expect("action"),
            action: ActionId::new("smoke").expect("action"),
        }]
    );
    assert_eq!(query::energy(&world, id).map(|ledger| ledger.energy()), Some(3));
    let snapshot = query::planner(&world, id).expect("planner");
    assert_eq!(snapshot.waypoints[1].action, ActionId::new("smoke"));

    let events = swap(&mut world, id, 0, "smoke");
    assert!(matches!(
        events[0],
        Event::WaypointActionSwapRejected {
            reason: ActionSwapRejection::NotACardWaypoint,
            ..
        }
    ));

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartActionPhase, &mut events);
    let events = swap(&mut world, id, 1, "flash");
    assert!(matches!(
        events[0],
        Event::WaypointActionSwapRejected {
            reason: ActionSwapRejection::WrongPhase,
            ..
        }
    ));
}
