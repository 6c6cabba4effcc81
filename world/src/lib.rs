#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative match state for the tactics simulation.
//!
//! The world owns every character's body and movement planner together with
//! the global game phase. All mutations flow through [`apply`], which reports
//! what happened as [`Event`] values in emission order. Read access goes
//! through the [`query`] module.

pub mod actions;
pub mod config;
pub mod locomotion;
pub mod planner;
pub mod waypoint;

mod timers;

use std::time::Duration;

use glam::Vec3;
use tactics_core::{
    ActionId, ActionSwapRejection, CancelRejection, CharacterId, Command, Event, GamePhase,
    PlacementRejection, WaypointKind,
};
use tactics_system_energy::EnergyLedger;
use tracing::{debug, info, warn};

use crate::{
    actions::{ActionHandler, LoggingActionHandler},
    config::WorldConfig,
    locomotion::{KinematicBody, Locomotion},
    planner::MovementPlanner,
    timers::TimerQueue,
};

#[derive(Debug)]
struct Character {
    id: CharacterId,
    body: KinematicBody,
    planner: MovementPlanner,
    pending_actions: u32,
    movement_completed: bool,
}

impl Character {
    fn energy_event(&self) -> Event {
        let ledger = self.planner.ledger();
        Event::EnergyChanged {
            character: self.id,
            energy: ledger.energy(),
            buffer_energy: ledger.buffer_energy(),
        }
    }

    fn settle_if_done(&self, out_events: &mut Vec<Event>) {
        if self.movement_completed && self.pending_actions == 0 {
            out_events.push(Event::ActionsSettled { character: self.id });
        }
    }
}

/// Represents the authoritative match state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    phase: GamePhase,
    characters: Vec<Character>,
    next_character_id: u32,
    timers: TimerQueue,
    action_handler: Box<dyn ActionHandler>,
    tick_index: u64,
}

impl World {
    /// Creates an empty world in the preparation phase.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self::with_action_handler(config, Box::new(LoggingActionHandler))
    }

    /// Creates an empty world that routes waypoint actions to `action_handler`.
    #[must_use]
    pub fn with_action_handler(config: WorldConfig, action_handler: Box<dyn ActionHandler>) -> Self {
        Self {
            config,
            phase: GamePhase::Preparation,
            characters: Vec::new(),
            next_character_id: 0,
            timers: TimerQueue::default(),
            action_handler,
            tick_index: 0,
        }
    }

    fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|character| character.id == id)
    }

    fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|character| character.id == id)
    }

    fn spawn_character(&mut self, position: Vec3, ledger: EnergyLedger, out_events: &mut Vec<Event>) {
        let id = CharacterId::new(self.next_character_id);
        self.next_character_id = self.next_character_id.saturating_add(1);

        let mut planner =
            MovementPlanner::new(id, ledger, self.config.movement, self.config.energy);
        planner.initialize_starting_waypoint(position);
        planner.set_accepting(self.phase == GamePhase::Preparation);

        let character = Character {
            id,
            body: KinematicBody::new(position, self.config.locomotion),
            planner,
            pending_actions: 0,
            movement_completed: false,
        };

        info!(%id, ?position, "character_spawned");
        out_events.push(Event::CharacterSpawned {
            character: id,
            position,
        });
        out_events.push(Event::PathInitialized {
            character: id,
            origin: position,
        });
        out_events.push(character.energy_event());
        self.characters.push(character);
    }

    fn place_waypoint(
        &mut self,
        id: CharacterId,
        hit_point: Vec3,
        action: Option<ActionId>,
        out_events: &mut Vec<Event>,
    ) {
        let kind = WaypointKind::of(action.as_ref());
        let phase = self.phase;
        let outcome = match self.character_mut(id) {
            None => Err(PlacementRejection::UnknownCharacter),
            Some(_) if phase != GamePhase::Preparation => Err(PlacementRejection::WrongPhase),
            Some(character) => {
                let position = character.body.position();
                character
                    .planner
                    .handle_placement_request(hit_point, action, position)
                    .map(|receipt| (receipt, character.energy_event()))
            }
        };

        match outcome {
            Ok((receipt, energy)) => {
                out_events.push(Event::WaypointPlaced {
                    character: id,
                    index: receipt.index,
                    position: receipt.position,
                    cost: receipt.cost,
                    kind: receipt.kind,
                    action: receipt.action,
                });
                out_events.push(energy);
            }
            Err(reason) => {
                info!(character = %id, %reason, %kind, "waypoint_placement_rejected");
                out_events.push(Event::WaypointPlacementRejected {
                    character: id,
                    position: hit_point,
                    kind,
                    reason,
                });
            }
        }
    }

    fn cancel_last_waypoint(&mut self, id: CharacterId, out_events: &mut Vec<Event>) {
        let phase = self.phase;
        let outcome = match self.character_mut(id) {
            None => Err(CancelRejection::UnknownCharacter),
            Some(_) if phase != GamePhase::Preparation => Err(CancelRejection::WrongPhase),
            Some(character) => {
                let position = character.body.position();
                character
                    .planner
                    .cancel_last_placement(position)
                    .map(|receipt| (receipt, character.energy_event()))
            }
        };

        match outcome {
            Ok((receipt, energy)) => {
                out_events.push(Event::WaypointCancelled {
                    character: id,
                    index: receipt.index,
                    position: receipt.position,
                    refund: receipt.refund,
                    restored: receipt.restored,
                    action: receipt.action,
                });
                out_events.push(energy);
            }
            Err(reason) => {
                info!(character = %id, %reason, "waypoint_cancel_rejected");
                out_events.push(Event::WaypointCancelRejected {
                    character: id,
                    reason,
                });
            }
        }
    }

    fn swap_waypoint_action(
        &mut self,
        id: CharacterId,
        index: usize,
        action: ActionId,
        out_events: &mut Vec<Event>,
    ) {
        let phase = self.phase;
        let outcome = match self.character_mut(id) {
            None => Err(ActionSwapRejection::UnknownCharacter),
            Some(_) if phase != GamePhase::Preparation => Err(ActionSwapRejection::WrongPhase),
            Some(character) => character.planner.swap_action(index, action.clone()),
        };

        match outcome {
            Ok(previous) => out_events.push(Event::WaypointActionSwapped {
                character: id,
                index,
                previous,
                action,
            }),
            Err(reason) => {
                info!(character = %id, index, %reason, "waypoint_action_swap_rejected");
                out_events.push(Event::WaypointActionSwapRejected {
                    character: id,
                    index,
                    reason,
                });
            }
        }
    }

    fn start_action_phase(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == GamePhase::Action {
            debug!("action_phase_already_active");
            return;
        }

        self.timers.cancel_all();
        let delay = self.config.phase.idle_completion_delay;
        for character in &mut self.characters {
            character.pending_actions = 0;
            character.movement_completed = false;
            character.planner.set_accepting(false);

            if character.planner.is_idle() || !character.planner.start_following_path() {
                self.timers.schedule(character.id, delay);
                debug!(character = %character.id, ?delay, "idle_completion_scheduled");
                continue;
            }

            out_events.push(Event::PathFollowingStarted {
                character: character.id,
                waypoints: character.planner.path().len(),
            });
        }

        self.phase = GamePhase::Action;
        info!(characters = self.characters.len(), "action_phase_started");
        out_events.push(Event::PhaseChanged {
            phase: GamePhase::Action,
        });
    }

    fn start_preparation_phase(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == GamePhase::Preparation {
            debug!("preparation_phase_already_active");
            return;
        }

        self.timers.cancel_all();
        let energy_per_round = self.config.phase.energy_per_round;
        for character in &mut self.characters {
            character.pending_actions = 0;
            character.movement_completed = false;

            let _ = character.planner.stop_following_path(&mut character.body);
            character.planner.reset_path();
            out_events.push(Event::PathCleared {
                character: character.id,
            });

            let accrued = character.planner.grant_round_energy(energy_per_round);
            debug!(character = %character.id, accrued, "round_energy_granted");

            let origin = character.body.position();
            character.planner.initialize_starting_waypoint(origin);
            character.planner.set_accepting(true);
            out_events.push(Event::PathInitialized {
                character: character.id,
                origin,
            });
            out_events.push(character.energy_event());
        }

        self.phase = GamePhase::Preparation;
        info!(characters = self.characters.len(), "preparation_phase_started");
        out_events.push(Event::PhaseChanged {
            phase: GamePhase::Preparation,
        });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        for id in self.timers.advance(dt) {
            if let Some(character) = self.character_mut(id) {
                character.movement_completed = true;
                info!(character = %id, "idle_completion_fired");
                out_events.push(Event::MovementCompleted { character: id });
                character.settle_if_done(out_events);
            }
        }

        let seconds = dt.as_secs_f32();
        let action_phase = self.phase == GamePhase::Action;
        for character in &mut self.characters {
            if action_phase {
                let report = character.planner.advance(
                    &mut character.body,
                    self.action_handler.as_mut(),
                    out_events,
                );
                character.pending_actions += report.actions_in_progress;
                if report.completed {
                    character.movement_completed = true;
                    character.settle_if_done(out_events);
                }
            }

            let following = character.planner.is_following_path();
            let travelled = character.body.integrate(seconds);
            if following {
                character.planner.record_travel(travelled);
            }
        }
    }

    fn report_action_finished(&mut self, id: CharacterId, out_events: &mut Vec<Event>) {
        let Some(character) = self.character_mut(id) else {
            warn!(character = %id, "action_finished_for_unknown_character");
            return;
        };
        if character.pending_actions == 0 {
            warn!(character = %id, "unexpected_action_finished");
            return;
        }
        character.pending_actions -= 1;
        character.settle_if_done(out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnCharacter {
            position,
            energy,
            buffer_energy,
        } => {
            if !position.is_finite() {
                warn!(?position, "spawn_rejected_degenerate_position");
                return;
            }
            world.spawn_character(position, EnergyLedger::new(energy, buffer_energy), out_events);
        }
        Command::PlaceWaypoint {
            character,
            hit_point,
            action,
        } => world.place_waypoint(character, hit_point, action, out_events),
        Command::CancelLastWaypoint { character } => {
            world.cancel_last_waypoint(character, out_events)
        }
        Command::SwapWaypointAction {
            character,
            index,
            action,
        } => world.swap_waypoint_action(character, index, action, out_events),
        Command::StartFollowingPath { character } => {
            let Some(entry) = world.character_mut(character) else {
                warn!(%character, "start_following_unknown_character");
                return;
            };
            if entry.planner.start_following_path() {
                entry.movement_completed = false;
                out_events.push(Event::PathFollowingStarted {
                    character,
                    waypoints: entry.planner.path().len(),
                });
            }
        }
        Command::StopFollowingPath { character } => {
            let Some(entry) = world.character_mut(character) else {
                warn!(%character, "stop_following_unknown_character");
                return;
            };
            if entry.planner.stop_following_path(&mut entry.body) {
                out_events.push(Event::PathFollowingStopped { character });
            }
        }
        Command::ResetPath { character } => {
            let Some(entry) = world.character_mut(character) else {
                warn!(%character, "reset_path_unknown_character");
                return;
            };
            let _ = entry.planner.stop_following_path(&mut entry.body);
            entry.planner.reset_path();
            out_events.push(Event::PathCleared { character });
        }
        Command::StartActionPhase => world.start_action_phase(out_events),
        Command::StartPreparationPhase => world.start_preparation_phase(out_events),
        Command::ReportActionFinished { character } => {
            world.report_action_finished(character, out_events)
        }
        Command::Tick { dt } => world.tick(dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use tactics_core::{ActionId, CharacterId, GamePhase, PlacementContext};
    use tactics_system_energy::{EnergyConfig, EnergyLedger};

    use super::World;
    use crate::locomotion::Locomotion;

    /// Current phase of the match.
    #[must_use]
    pub fn phase(world: &World) -> GamePhase {
        world.phase
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Identifiers of every character in spawn order.
    #[must_use]
    pub fn character_ids(world: &World) -> Vec<CharacterId> {
        world.characters.iter().map(|character| character.id).collect()
    }

    /// Energy configuration the world was created with.
    #[must_use]
    pub fn energy_config(world: &World) -> &EnergyConfig {
        &world.config.energy
    }

    /// Current position of a character.
    #[must_use]
    pub fn character_position(world: &World, character: CharacterId) -> Option<Vec3> {
        world
            .character(character)
            .map(|entry| entry.body.position())
    }

    /// Energy pools of a character.
    #[must_use]
    pub fn energy(world: &World, character: CharacterId) -> Option<EnergyLedger> {
        world
            .character(character)
            .map(|entry| *entry.planner.ledger())
    }

    /// Effective energy a character may spend on placements.
    #[must_use]
    pub fn available_energy(world: &World, character: CharacterId) -> Option<u32> {
        world
            .character(character)
            .map(|entry| entry.planner.available_energy())
    }

    /// Position of the last waypoint in a character's path.
    #[must_use]
    pub fn last_waypoint_position(world: &World, character: CharacterId) -> Option<Vec3> {
        world
            .character(character)
            .and_then(|entry| entry.planner.last_waypoint_position())
    }

    /// Whether the last waypoint of a character may be cancelled right now.
    #[must_use]
    pub fn can_cancel_last_waypoint(world: &World, character: CharacterId) -> bool {
        world.phase == GamePhase::Preparation
            && world
                .character(character)
                .is_some_and(|entry| entry.planner.can_cancel_last_waypoint())
    }

    /// Number of idle characters waiting for their completion timer.
    #[must_use]
    pub fn pending_idle_timers(world: &World) -> usize {
        world.timers.len()
    }

    /// Read-only view used by placement front-ends.
    #[must_use]
    pub fn placement_context(world: &World, character: CharacterId) -> Option<PlacementContext> {
        world.character(character).map(|entry| PlacementContext {
            character,
            last_waypoint: entry.planner.last_waypoint_position(),
            character_position: entry.body.position(),
            available_energy: entry.planner.available_energy(),
            accepting: world.phase == GamePhase::Preparation && entry.planner.is_accepting(),
        })
    }

    /// Captures the planner state of a character.
    #[must_use]
    pub fn planner(world: &World, character: CharacterId) -> Option<PlannerSnapshot> {
        world.character(character).map(|entry| {
            let planner = &entry.planner;
            PlannerSnapshot {
                character,
                waypoints: planner
                    .path()
                    .iter()
                    .map(|waypoint| WaypointSnapshot {
                        index: waypoint.index(),
                        position: waypoint.position(),
                        action: waypoint.item().cloned(),
                    })
                    .collect(),
                current_waypoint_index: planner.current_waypoint_index(),
                following: planner.is_following_path(),
                accepting: planner.is_accepting(),
                distance_travelled: planner.distance_travelled(),
                pending_actions: entry.pending_actions,
            }
        })
    }

    /// Read-only snapshot of a character's planner.
    #[derive(Clone, Debug, PartialEq)]
    pub struct PlannerSnapshot {
        /// Character owning the planner.
        pub character: CharacterId,
        /// Waypoints in path order.
        pub waypoints: Vec<WaypointSnapshot>,
        /// Execution cursor.
        pub current_waypoint_index: usize,
        /// Whether the path is being executed.
        pub following: bool,
        /// Whether placements are accepted.
        pub accepting: bool,
        /// Horizontal distance travelled this round.
        pub distance_travelled: f32,
        /// Triggered actions that have not reported completion.
        pub pending_actions: u32,
    }

    /// Read-only snapshot of a single waypoint.
    #[derive(Clone, Debug, PartialEq)]
    pub struct WaypointSnapshot {
        /// Position within the path.
        pub index: usize,
        /// World position.
        pub position: Vec3,
        /// Attached action, if any.
        pub action: Option<ActionId>,
    }
}
