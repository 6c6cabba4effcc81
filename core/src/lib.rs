#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tactics simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{fmt, time::Duration};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Describes the global phase of a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Planning phase where waypoints may be placed and cancelled.
    #[default]
    Preparation,
    /// Execution phase where every character traverses its planned path.
    Action,
}

impl GamePhase {
    /// Lowercase token describing the phase.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Preparation => "preparation",
            Self::Action => "action",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparation => f.write_str("Preparation"),
            Self::Action => f.write_str("Action"),
        }
    }
}

/// Unique identifier assigned to a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(u32);

impl CharacterId {
    /// Creates a new character identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "character#{}", self.0)
    }
}

/// Identifier of the card or item action attached to a waypoint.
///
/// The identifier is never empty: an empty string denotes a pure movement
/// node and is represented as `None` wherever an optional action is expected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionId(String);

impl ActionId {
    /// Creates an action identifier, returning `None` for an empty string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ActionId {
    type Error = EmptyActionId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(EmptyActionId)
    }
}

impl From<ActionId> for String {
    fn from(value: ActionId) -> Self {
        value.0
    }
}

/// Error returned when an empty string is converted into an [`ActionId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("action identifier must not be empty")]
pub struct EmptyActionId;

/// Distinguishes pure movement nodes from nodes carrying an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaypointKind {
    /// Waypoint without an attached action.
    Movement,
    /// Waypoint carrying a card or item action.
    Card,
}

impl WaypointKind {
    /// Classifies a placement by its optional action identifier.
    #[must_use]
    pub fn of(action: Option<&ActionId>) -> Self {
        if action.is_some() {
            Self::Card
        } else {
            Self::Movement
        }
    }
}

impl fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movement => f.write_str("Movement"),
            Self::Card => f.write_str("Card"),
        }
    }
}

/// Reasons a waypoint placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementRejection {
    /// Placements are only legal during the preparation phase.
    #[error("Placement Disabled Outside Preparation")]
    WrongPhase,
    /// The planner is not currently accepting waypoints.
    #[error("Not Accepting Waypoints")]
    NotAccepting,
    /// The hit point contained non-finite coordinates.
    #[error("Invalid Hit Point")]
    DegenerateHitPoint,
    /// A movement waypoint was requested within the placement radius.
    #[error("Too Close to Last Waypoint")]
    TooCloseToLastWaypoint,
    /// The character cannot afford the ring cost of the placement.
    #[error("Insufficient Energy")]
    InsufficientEnergy,
    /// No character with the provided identifier exists.
    #[error("Unknown Character")]
    UnknownCharacter,
}

/// Reasons a cancellation request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum CancelRejection {
    /// Cancellation is only legal during the preparation phase.
    #[error("Cancellation Disabled Outside Preparation")]
    WrongPhase,
    /// The planner is not currently accepting waypoints.
    #[error("Not Accepting Waypoints")]
    NotAccepting,
    /// Only the starting waypoint remains and it can never be cancelled.
    #[error("Starting Waypoint Cannot Be Cancelled")]
    OnlyStartingWaypoint,
    /// The path is being executed.
    #[error("Path Is Being Followed")]
    FollowingPath,
    /// No character with the provided identifier exists.
    #[error("Unknown Character")]
    UnknownCharacter,
}

/// Reasons a request to swap a waypoint's action may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ActionSwapRejection {
    /// Actions can only be swapped during the preparation phase.
    #[error("Action Swap Disabled Outside Preparation")]
    WrongPhase,
    /// The planner is not currently accepting waypoints.
    #[error("Not Accepting Waypoints")]
    NotAccepting,
    /// The index does not name a card waypoint of the path.
    #[error("No Card Waypoint At Index")]
    NotACardWaypoint,
    /// No character with the provided identifier exists.
    #[error("Unknown Character")]
    UnknownCharacter,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Spawns a character and initializes its starting waypoint.
    SpawnCharacter {
        /// World position of the new character.
        position: Vec3,
        /// Initial regular energy.
        energy: u32,
        /// Initial buffer energy.
        buffer_energy: u32,
    },
    /// Requests placement of a waypoint at a world hit point.
    PlaceWaypoint {
        /// Character whose path receives the waypoint.
        character: CharacterId,
        /// World-space point returned by the scene query.
        hit_point: Vec3,
        /// Optional card or item action carried by the waypoint.
        action: Option<ActionId>,
    },
    /// Requests removal of the most recently placed waypoint.
    CancelLastWaypoint {
        /// Character whose path is shortened.
        character: CharacterId,
    },
    /// Replaces the action carried by a placed card waypoint.
    SwapWaypointAction {
        /// Character owning the path.
        character: CharacterId,
        /// Index of the card waypoint.
        index: usize,
        /// Action the waypoint carries from now on.
        action: ActionId,
    },
    /// Begins executing the character's path.
    StartFollowingPath {
        /// Character that starts moving.
        character: CharacterId,
    },
    /// Halts path execution immediately.
    StopFollowingPath {
        /// Character that stops moving.
        character: CharacterId,
    },
    /// Clears the character's path without re-initializing it.
    ResetPath {
        /// Character whose path is cleared.
        character: CharacterId,
    },
    /// Switches the match into the action phase.
    StartActionPhase,
    /// Switches the match back into the preparation phase.
    StartPreparationPhase,
    /// Reports that a long-running action of the character has finished.
    ReportActionFinished {
        /// Character whose action completed.
        character: CharacterId,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a character joined the match.
    CharacterSpawned {
        /// Identifier assigned to the character.
        character: CharacterId,
        /// World position of the character.
        position: Vec3,
    },
    /// Announces that the match entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: GamePhase,
    },
    /// Confirms that a path was initialized with its synthetic start.
    PathInitialized {
        /// Character owning the path.
        character: CharacterId,
        /// Position of the starting waypoint.
        origin: Vec3,
    },
    /// Confirms a successful waypoint placement.
    WaypointPlaced {
        /// Character owning the path.
        character: CharacterId,
        /// Index assigned to the new waypoint.
        index: usize,
        /// World position of the waypoint.
        position: Vec3,
        /// Ring cost debited for the placement.
        cost: u32,
        /// Whether the waypoint is a movement or a card node.
        kind: WaypointKind,
        /// Action carried by the waypoint, if any.
        action: Option<ActionId>,
    },
    /// Reports that a placement request was rejected.
    WaypointPlacementRejected {
        /// Character that attempted the placement.
        character: CharacterId,
        /// Requested hit point.
        position: Vec3,
        /// Whether a movement or a card node was requested.
        kind: WaypointKind,
        /// Specific reason the placement failed.
        reason: PlacementRejection,
    },
    /// Confirms that the last waypoint was cancelled and refunded.
    WaypointCancelled {
        /// Character owning the path.
        character: CharacterId,
        /// Index the cancelled waypoint occupied.
        index: usize,
        /// World position of the cancelled waypoint.
        position: Vec3,
        /// Ring cost between the previous anchor and the cancelled waypoint.
        refund: u32,
        /// Effective energy credited back, buffer units counted at the bonus
        /// multiplier. Differs from `refund` when buffer energy paid for it.
        restored: u32,
        /// Action carried by the cancelled waypoint, if any.
        action: Option<ActionId>,
    },
    /// Confirms that a card waypoint now carries a different action.
    WaypointActionSwapped {
        /// Character owning the path.
        character: CharacterId,
        /// Index of the card waypoint.
        index: usize,
        /// Action the waypoint carried before.
        previous: ActionId,
        /// Action the waypoint carries now.
        action: ActionId,
    },
    /// Reports that an action swap request was rejected.
    WaypointActionSwapRejected {
        /// Character that attempted the swap.
        character: CharacterId,
        /// Index named by the request.
        index: usize,
        /// Specific reason the swap failed.
        reason: ActionSwapRejection,
    },
    /// Reports that a cancellation request was rejected.
    WaypointCancelRejected {
        /// Character that attempted the cancellation.
        character: CharacterId,
        /// Specific reason the cancellation failed.
        reason: CancelRejection,
    },
    /// Confirms that a character's path was emptied.
    PathCleared {
        /// Character owning the path.
        character: CharacterId,
    },
    /// Confirms that a character began executing its path.
    PathFollowingStarted {
        /// Character that started moving.
        character: CharacterId,
        /// Number of waypoints in the executed path.
        waypoints: usize,
    },
    /// Confirms that path execution was halted externally.
    PathFollowingStopped {
        /// Character that stopped.
        character: CharacterId,
    },
    /// Reports that a character reached a waypoint.
    WaypointReached {
        /// Character that reached the waypoint.
        character: CharacterId,
        /// Index of the reached waypoint.
        index: usize,
    },
    /// Reports that a sharp reversal forced the character to stop dead.
    HardTurnBraked {
        /// Character that braked.
        character: CharacterId,
        /// Angle between the previous heading and the next leg, in radians.
        angle: f32,
    },
    /// Reports that a waypoint action was invoked.
    ActionTriggered {
        /// Character performing the action.
        character: CharacterId,
        /// Action that was invoked.
        action: ActionId,
    },
    /// Reports that every action queued by the character has finished.
    ActionsSettled {
        /// Character whose actions settled.
        character: CharacterId,
    },
    /// Reports that a character finished executing its path.
    MovementCompleted {
        /// Character that finished moving.
        character: CharacterId,
    },
    /// Reports the character's energy pools after a debit, credit or grant.
    EnergyChanged {
        /// Character owning the pools.
        character: CharacterId,
        /// Regular energy pool.
        energy: u32,
        /// Buffer energy pool.
        buffer_energy: u32,
    },
    /// Logic warning: too many waypoints were reached within a single tick.
    WaypointSkipLimitReached {
        /// Character whose path was being processed.
        character: CharacterId,
    },
}

/// Read-only view of the placement state of a single character.
///
/// Front-ends use it to preview costs and snapping without borrowing the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementContext {
    /// Character the context describes.
    pub character: CharacterId,
    /// Position of the last waypoint in the path, if any.
    pub last_waypoint: Option<Vec3>,
    /// Current position of the character.
    pub character_position: Vec3,
    /// Energy available for placements, buffer energy converted.
    pub available_energy: u32,
    /// Whether the planner currently accepts placements.
    pub accepting: bool,
}

impl PlacementContext {
    /// Anchor used for cost computation: the last waypoint, or the character.
    #[must_use]
    pub fn anchor(&self) -> Vec3 {
        self.last_waypoint.unwrap_or(self.character_position)
    }
}

/// Horizontal-plane geometry helpers. Height is the `z` component.
pub mod geometry {
    use glam::{Vec2, Vec3};

    /// Projects a point onto the horizontal plane.
    #[must_use]
    pub fn horizontal(point: Vec3) -> Vec2 {
        point.truncate()
    }

    /// Horizontal distance between two points, ignoring height.
    #[must_use]
    pub fn horizontal_distance(from: Vec3, to: Vec3) -> f32 {
        horizontal(from).distance(horizontal(to))
    }

    /// Horizontal direction from `from` toward `to`, or `None` when degenerate.
    #[must_use]
    pub fn horizontal_direction(from: Vec3, to: Vec3) -> Option<Vec3> {
        let delta = horizontal(to) - horizontal(from);
        delta.try_normalize().map(|direction| direction.extend(0.0))
    }

    /// Angle in radians between two directions, zero vectors yield a right angle.
    #[must_use]
    pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
        let a = a.normalize_or_zero();
        let b = b.normalize_or_zero();
        a.dot(b).clamp(-1.0, 1.0).acos()
    }

    /// Reports whether every coordinate is finite.
    #[must_use]
    pub fn is_finite_point(point: Vec3) -> bool {
        point.is_finite()
    }
}
