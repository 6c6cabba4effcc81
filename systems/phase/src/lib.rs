#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system deciding when the action phase has resolved.
//!
//! The director watches completion signals for every character on the roster
//! and requests the return to preparation once all of them have finished both
//! their movement and their last queued action.

use std::collections::BTreeMap;

use tactics_core::{CharacterId, Command, Event, GamePhase};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Completion {
    movement: bool,
    actions: bool,
}

impl Completion {
    const fn is_settled(self) -> bool {
        self.movement && self.actions
    }
}

/// Aggregates per-character completion and emits the phase switch.
#[derive(Debug, Clone, Default)]
pub struct PhaseDirector {
    phase: GamePhase,
    roster: BTreeMap<CharacterId, Completion>,
    requested: bool,
}

impl PhaseDirector {
    /// Creates a director with an empty roster in the preparation phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase most recently announced by the world.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Reports whether every character on the roster has settled.
    #[must_use]
    pub fn all_settled(&self) -> bool {
        !self.roster.is_empty() && self.roster.values().all(|entry| entry.is_settled())
    }

    /// Consumes world events and emits `StartPreparationPhase` once per
    /// action phase when every character has settled.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::CharacterSpawned { character, .. } => {
                    let _ = self.roster.insert(*character, Completion::default());
                }
                Event::PhaseChanged { phase } => {
                    self.phase = *phase;
                    self.requested = false;
                    for entry in self.roster.values_mut() {
                        *entry = Completion::default();
                    }
                }
                Event::MovementCompleted { character } => {
                    if let Some(entry) = self.roster.get_mut(character) {
                        entry.movement = true;
                    }
                    debug!(%character, "movement_completion_recorded");
                }
                Event::ActionsSettled { character } => {
                    if let Some(entry) = self.roster.get_mut(character) {
                        entry.actions = true;
                    }
                }
                _ => {}
            }

            self.decide_switching_to_preparation(out);
        }
    }

    fn decide_switching_to_preparation(&mut self, out: &mut Vec<Command>) {
        if self.phase != GamePhase::Action || self.requested || !self.all_settled() {
            return;
        }
        self.requested = true;
        info!(characters = self.roster.len(), "all_characters_settled");
        out.push(Command::StartPreparationPhase);
    }
}
