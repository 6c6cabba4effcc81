//! Headless match loop wiring the world to its systems.

use std::time::Duration;

use glam::{Vec2, Vec3};
use tactics_core::{ActionId, CharacterId, Command, Event, GamePhase, WaypointKind};
use tactics_system_drag::{DragController, PreviewActors, PreviewHandle, SceneQuery, SurfaceHit};
use tactics_system_energy::EnergyLedger;
use tactics_system_phase::PhaseDirector;
use tactics_system_telemetry::{Telemetry, TelemetrySink, TerminateReason};
use tactics_world::{self as world, query, World};
use tracing::{debug, info, warn};

use crate::scenario::{MatchConfig, PlanStep, Scenario};

/// Pointer rays always meet a horizontal ground plane; screen units are world units.
#[derive(Clone, Copy, Debug)]
struct GroundPlane {
    height: f32,
}

impl SceneQuery for GroundPlane {
    fn raycast(&self, screen: Vec2) -> Option<SurfaceHit> {
        screen.is_finite().then(|| SurfaceHit {
            point: screen.extend(self.height),
            normal: Vec3::Z,
        })
    }
}

#[derive(Debug, Default)]
struct HeadlessPreviews {
    next: u64,
    live: usize,
}

impl PreviewActors for HeadlessPreviews {
    fn spawn_preview(&mut self, kind: WaypointKind, position: Vec3) -> Option<PreviewHandle> {
        self.next += 1;
        self.live += 1;
        debug!(handle = self.next, %kind, ?position, "preview_spawned");
        Some(PreviewHandle::new(self.next))
    }

    fn move_preview(&mut self, handle: PreviewHandle, position: Vec3) {
        debug!(handle = handle.get(), ?position, "preview_moved");
    }

    fn half_height(&self, _handle: PreviewHandle) -> Option<f32> {
        None
    }

    fn destroy_preview(&mut self, handle: PreviewHandle) {
        self.live = self.live.saturating_sub(1);
        debug!(handle = handle.get(), "preview_destroyed");
    }
}

/// Outcome of a scripted match.
#[derive(Debug)]
pub(crate) struct MatchSummary {
    /// Every world event in emission order.
    pub(crate) events: Vec<Event>,
    /// Ticks simulated during the action phase.
    pub(crate) ticks: u32,
    /// Whether the round resolved back into preparation.
    pub(crate) resolved: bool,
    /// Final energy and position of every character.
    pub(crate) characters: Vec<(CharacterId, EnergyLedger, Vec3)>,
}

/// Loop limits supplied on the command line.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RunOptions {
    /// Upper bound on simulated ticks.
    pub(crate) max_ticks: u32,
    /// Simulated time per tick.
    pub(crate) tick: Duration,
}

struct Session<'a, S: TelemetrySink> {
    world: World,
    director: PhaseDirector,
    drag: DragController,
    telemetry: &'a mut Telemetry<S>,
    scene: GroundPlane,
    previews: HeadlessPreviews,
    log: Vec<Event>,
}

impl<S: TelemetrySink> Session<'_, S> {
    fn submit(&mut self, commands: Vec<Command>) {
        let mut pending = commands;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.director.handle(&events, &mut pending);
            self.drag.handle(&events, &mut self.previews);
            self.telemetry.handle(&events);
            self.log.extend(events);
        }
    }

    fn perform(&mut self, character: CharacterId, step: &PlanStep) {
        let Some(context) = query::placement_context(&self.world, character) else {
            warn!(%character, "plan_for_unknown_character");
            return;
        };

        let mut commands = Vec::new();
        match step {
            PlanStep::Click { at } => {
                self.drag.press(character, *at);
                self.drag
                    .release(&context, *at, &self.scene, &mut self.previews, &mut commands);
            }
            PlanStep::Drag { from, to, card } => {
                match card.clone().and_then(ActionId::new) {
                    Some(action) => {
                        let _ = self.drag.begin_card_drag(
                            &context,
                            action,
                            *from,
                            &self.scene,
                            &mut self.previews,
                        );
                    }
                    None => self.drag.press(character, *from),
                }
                if let Some(preview) =
                    self.drag
                        .move_pointer(&context, *to, &self.scene, &mut self.previews)
                {
                    info!(
                        %character,
                        cost = preview.cost,
                        affordable = preview.affordable,
                        snapped = preview.snapped,
                        "drag_preview"
                    );
                }
                self.drag
                    .release(&context, *to, &self.scene, &mut self.previews, &mut commands);
            }
            PlanStep::Cancel => commands.push(Command::CancelLastWaypoint { character }),
            PlanStep::Swap { index, card } => match ActionId::new(card.as_str()) {
                Some(action) => commands.push(Command::SwapWaypointAction {
                    character,
                    index: *index,
                    action,
                }),
                None => warn!(%character, index, "swap_without_card"),
            },
        }
        self.submit(commands);
    }
}

/// Plays one round of `scenario`: spawn, plan, execute, resolve.
pub(crate) fn run<S: TelemetrySink>(
    config: &MatchConfig,
    scenario: &Scenario,
    options: RunOptions,
    telemetry: &mut Telemetry<S>,
) -> MatchSummary {
    let settings = scenario.settings;
    telemetry.match_started(settings.connectivity);

    let mut session = Session {
        world: World::new(config.world),
        director: PhaseDirector::new(),
        drag: DragController::new(config.drag, config.world.energy),
        telemetry,
        scene: GroundPlane {
            height: settings.ground_height,
        },
        previews: HeadlessPreviews::default(),
        log: Vec::new(),
    };

    let spawns = scenario
        .characters
        .iter()
        .map(|plan| Command::SpawnCharacter {
            position: plan.position,
            energy: plan.energy,
            buffer_energy: plan.buffer_energy,
        })
        .collect();
    session.submit(spawns);

    let ids = query::character_ids(&session.world);
    for (character, plan) in ids.iter().zip(&scenario.characters) {
        for step in &plan.plan {
            session.perform(*character, step);
        }
    }

    session.submit(vec![Command::StartActionPhase]);

    let mut ticks = 0;
    while query::phase(&session.world) == GamePhase::Action && ticks < options.max_ticks {
        ticks += 1;
        session.submit(vec![Command::Tick { dt: options.tick }]);
    }

    let resolved = query::phase(&session.world) == GamePhase::Preparation;
    if resolved {
        info!(ticks, "round_resolved");
        session
            .telemetry
            .match_ended(settings.connectivity, settings.result);
    } else {
        warn!(ticks, "tick_budget_exhausted");
        session
            .telemetry
            .match_terminated(settings.connectivity, TerminateReason::Quit);
    }
    if session.previews.live > 0 {
        warn!(live = session.previews.live, "preview_actors_leaked");
    }

    let characters = ids
        .iter()
        .filter_map(|id| {
            let ledger = query::energy(&session.world, *id)?;
            let position = query::character_position(&session.world, *id)?;
            Some((*id, ledger, position))
        })
        .collect();

    MatchSummary {
        events: session.log,
        ticks,
        resolved,
        characters,
    }
}
