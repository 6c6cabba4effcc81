#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pointer-driven waypoint placement front-end.
//!
//! The controller turns press, move, release and cancel input into
//! [`Command::PlaceWaypoint`] requests. While a drag is active it keeps a
//! non-colliding preview actor under the cursor and reports the would-be ring
//! cost. Nothing is committed before release, so cancelling a drag never
//! touches path or energy state.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tactics_core::{geometry, ActionId, CharacterId, Command, Event, PlacementContext, WaypointKind};
use tactics_system_energy::{energy_rings, EnergyConfig};
use tracing::{debug, warn};

/// Result of a successful scene query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    /// World point where the ray met geometry.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// Physics query resolving screen positions to world geometry.
pub trait SceneQuery {
    /// Casts a ray through `screen` and returns the first surface hit.
    fn raycast(&self, screen: Vec2) -> Option<SurfaceHit>;
}

/// Opaque handle identifying a spawned preview actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle(u64);

impl PreviewHandle {
    /// Wraps a host-assigned actor identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Host-assigned actor identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Host service spawning and destroying transient preview actors.
pub trait PreviewActors {
    /// Spawns a preview actor without collision at `position`.
    fn spawn_preview(&mut self, kind: WaypointKind, position: Vec3) -> Option<PreviewHandle>;

    /// Moves an existing preview actor.
    fn move_preview(&mut self, handle: PreviewHandle, position: Vec3);

    /// Half of the preview actor's height, if the host knows it.
    fn half_height(&self, handle: PreviewHandle) -> Option<f32>;

    /// Destroys a preview actor.
    fn destroy_preview(&mut self, handle: PreviewHandle);
}

/// Tunables of the drag gesture.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Screen distance a press must travel before it becomes a drag.
    pub start_threshold: f32,
    /// Starts the drag on the first pointer move regardless of distance.
    pub start_on_first_move: bool,
    /// Horizontal radius within which movement preview actors snap to the last waypoint.
    pub snap_radius: f32,
    /// Half height used when the preview actor does not report one.
    pub fallback_half_height: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            start_threshold: 50.0,
            start_on_first_move: true,
            snap_radius: 200.0,
            fallback_half_height: 50.0,
        }
    }
}

/// Live feedback for the active drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragPreview {
    /// Character the drag places for.
    pub character: CharacterId,
    /// Movement or card drag.
    pub kind: WaypointKind,
    /// Point a release would request a waypoint at.
    pub drop_point: Vec3,
    /// Position of the preview actor, lifted so its base rests on the surface.
    pub actor_position: Vec3,
    /// Ring cost of dropping at `drop_point`.
    pub cost: u32,
    /// Whether the character can pay `cost`.
    pub affordable: bool,
    /// Whether the preview actor snapped onto the last waypoint.
    pub snapped: bool,
}

#[derive(Clone, Debug, PartialEq)]
struct ActiveDrag {
    character: CharacterId,
    action: Option<ActionId>,
    preview: Option<PreviewHandle>,
    last_valid_drop: Option<Vec3>,
}

impl ActiveDrag {
    fn kind(&self) -> WaypointKind {
        WaypointKind::of(self.action.as_ref())
    }
}

#[derive(Clone, Debug, PartialEq)]
enum DragState {
    Idle,
    Tracking {
        character: CharacterId,
        origin: Vec2,
    },
    Dragging(ActiveDrag),
}

/// Translates pointer input into placement commands.
#[derive(Clone, Debug)]
pub struct DragController {
    config: DragConfig,
    energy: EnergyConfig,
    state: DragState,
}

impl DragController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new(config: DragConfig, energy: EnergyConfig) -> Self {
        Self {
            config,
            energy,
            state: DragState::Idle,
        }
    }

    /// Reports whether a preview drag is active.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Reports whether a press is being tracked without a drag yet.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        matches!(self.state, DragState::Tracking { .. })
    }

    /// Begins tracking a press for `character` without committing to a drag.
    pub fn press(&mut self, character: CharacterId, screen: Vec2) {
        if self.is_dragging() {
            debug!("press_ignored_while_dragging");
            return;
        }
        self.state = DragState::Tracking {
            character,
            origin: screen,
        };
    }

    /// Starts a card drag from a card widget immediately.
    pub fn begin_card_drag<S, A>(
        &mut self,
        context: &PlacementContext,
        action: ActionId,
        screen: Vec2,
        scene: &S,
        actors: &mut A,
    ) -> Option<DragPreview>
    where
        S: SceneQuery + ?Sized,
        A: PreviewActors + ?Sized,
    {
        self.cancel(actors);
        self.state = DragState::Dragging(ActiveDrag {
            character: context.character,
            action: Some(action),
            preview: None,
            last_valid_drop: None,
        });
        self.update_preview(context, screen, scene, actors)
    }

    /// Handles pointer motion, starting the drag once the gesture qualifies.
    pub fn move_pointer<S, A>(
        &mut self,
        context: &PlacementContext,
        screen: Vec2,
        scene: &S,
        actors: &mut A,
    ) -> Option<DragPreview>
    where
        S: SceneQuery + ?Sized,
        A: PreviewActors + ?Sized,
    {
        if let DragState::Tracking { character, origin } = self.state {
            let travelled = origin.distance(screen);
            if !self.config.start_on_first_move && travelled < self.config.start_threshold {
                return None;
            }
            debug!(%character, travelled, "drag_started");
            self.state = DragState::Dragging(ActiveDrag {
                character,
                action: None,
                preview: None,
                last_valid_drop: None,
            });
        }
        self.update_preview(context, screen, scene, actors)
    }

    /// Finishes the gesture and requests a placement.
    ///
    /// A press released without dragging is a click and requests a movement
    /// waypoint at the ray-cast point. The preview actor is always destroyed.
    pub fn release<S, A>(
        &mut self,
        context: &PlacementContext,
        screen: Vec2,
        scene: &S,
        actors: &mut A,
        out: &mut Vec<Command>,
    ) where
        S: SceneQuery + ?Sized,
        A: PreviewActors + ?Sized,
    {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => {}
            DragState::Tracking { character, .. } => {
                let Some(hit) = scene.raycast(screen) else {
                    debug!(%character, "click_missed_geometry");
                    return;
                };
                out.push(Command::PlaceWaypoint {
                    character,
                    hit_point: hit.point,
                    action: None,
                });
            }
            DragState::Dragging(drag) => {
                let drop = scene
                    .raycast(screen)
                    .map(|hit| hit.point)
                    .or(drag.last_valid_drop);
                if let Some(handle) = drag.preview {
                    actors.destroy_preview(handle);
                }
                match drop {
                    Some(hit_point) => out.push(Command::PlaceWaypoint {
                        character: drag.character,
                        hit_point,
                        action: drag.action,
                    }),
                    None => warn!(character = %drag.character, "drop_without_valid_location"),
                }
            }
        }
    }

    /// Abandons the gesture without placing anything.
    pub fn cancel<A>(&mut self, actors: &mut A)
    where
        A: PreviewActors + ?Sized,
    {
        if let DragState::Dragging(ActiveDrag {
            preview: Some(handle),
            ..
        }) = std::mem::replace(&mut self.state, DragState::Idle)
        {
            actors.destroy_preview(handle);
        }
    }

    /// Cancels any gesture when the world changes phase.
    pub fn handle<A>(&mut self, events: &[Event], actors: &mut A)
    where
        A: PreviewActors + ?Sized,
    {
        let phase_changed = events
            .iter()
            .any(|event| matches!(event, Event::PhaseChanged { .. }));
        if phase_changed && self.state != DragState::Idle {
            debug!("drag_cancelled_by_phase_change");
            self.cancel(actors);
        }
    }

    fn update_preview<S, A>(
        &mut self,
        context: &PlacementContext,
        screen: Vec2,
        scene: &S,
        actors: &mut A,
    ) -> Option<DragPreview>
    where
        S: SceneQuery + ?Sized,
        A: PreviewActors + ?Sized,
    {
        let hit = scene.raycast(screen)?;
        let DragState::Dragging(drag) = &self.state else {
            return None;
        };
        let drop_point = hit.point;
        let (base, snapped) = self.snap_base(context, drag, drop_point);
        let kind = drag.kind();
        let character = drag.character;

        let handle = match drag.preview {
            Some(handle) => Some(handle),
            None => actors.spawn_preview(kind, base),
        };
        let half_height = handle
            .and_then(|handle| actors.half_height(handle))
            .unwrap_or(self.config.fallback_half_height);
        let actor_position = base + Vec3::Z * half_height;
        if let Some(handle) = handle {
            actors.move_preview(handle, actor_position);
        }

        let cost = energy_rings(context.anchor(), drop_point, self.energy.placement_radius);
        let preview = DragPreview {
            character,
            kind,
            drop_point,
            actor_position,
            cost,
            affordable: cost <= context.available_energy,
            snapped,
        };

        if let DragState::Dragging(drag) = &mut self.state {
            drag.preview = handle;
            drag.last_valid_drop = Some(drop_point);
        }
        Some(preview)
    }

    /// Where the preview actor rests. Snapping is feedback only; the drop
    /// point stays on the raw hit.
    fn snap_base(&self, context: &PlacementContext, drag: &ActiveDrag, hit: Vec3) -> (Vec3, bool) {
        if drag.kind() != WaypointKind::Movement {
            return (hit, false);
        }
        match context.last_waypoint {
            Some(last) if geometry::horizontal_distance(last, hit) <= self.config.snap_radius => {
                (Vec3::new(last.x, last.y, hit.z), true)
            }
            _ => (hit, false),
        }
    }
}
