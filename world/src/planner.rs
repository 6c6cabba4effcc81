//! Per-character movement planner: path ownership, placement, cancellation and
//! per-tick execution.

use glam::Vec3;
use tactics_core::{
    geometry, ActionId, ActionSwapRejection, CancelRejection, CharacterId, Event,
    PlacementRejection, WaypointKind,
};
use tactics_system_energy::{energy_rings, EnergyConfig, EnergyDebit, EnergyLedger};
use tracing::{debug, info, warn};

use crate::{
    actions::{ActionHandler, ActionStatus},
    config::MovementConfig,
    locomotion::Locomotion,
    waypoint::Path,
};

/// Result of a successful placement.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementReceipt {
    /// Index assigned to the new waypoint.
    pub index: usize,
    /// World position of the new waypoint.
    pub position: Vec3,
    /// Ring cost debited.
    pub cost: u32,
    /// Movement or card node.
    pub kind: WaypointKind,
    /// Action carried by the waypoint.
    pub action: Option<ActionId>,
}

/// Result of a successful cancellation.
#[derive(Clone, Debug, PartialEq)]
pub struct CancellationReceipt {
    /// Index the removed waypoint occupied.
    pub index: usize,
    /// World position of the removed waypoint.
    pub position: Vec3,
    /// Ring cost between the previous anchor and the removed waypoint.
    pub refund: u32,
    /// Effective energy credited back from the waypoint's debit receipt.
    pub restored: u32,
    /// Action the removed waypoint carried.
    pub action: Option<ActionId>,
}

/// Summary of one call to [`MovementPlanner::advance`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Waypoints reached during the call.
    pub reached: u32,
    /// Actions triggered during the call that have not finished yet.
    pub actions_in_progress: u32,
    /// Whether the final waypoint was reached during the call.
    pub completed: bool,
}

/// Owns a character's path and energy ledger and executes the path.
#[derive(Clone, Debug)]
pub struct MovementPlanner {
    owner: CharacterId,
    movement: MovementConfig,
    energy: EnergyConfig,
    path: Path,
    ledger: EnergyLedger,
    current_waypoint_index: usize,
    following: bool,
    accepting: bool,
    distance_travelled: f32,
}

impl MovementPlanner {
    /// Creates a planner with an empty path that accepts placements.
    #[must_use]
    pub fn new(
        owner: CharacterId,
        ledger: EnergyLedger,
        movement: MovementConfig,
        energy: EnergyConfig,
    ) -> Self {
        Self {
            owner,
            movement,
            energy,
            path: Path::default(),
            ledger,
            current_waypoint_index: 0,
            following: false,
            accepting: true,
            distance_travelled: 0.0,
        }
    }

    /// Character that owns the planner.
    #[must_use]
    pub const fn owner(&self) -> CharacterId {
        self.owner
    }

    /// Planned path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Energy pools of the character.
    #[must_use]
    pub const fn ledger(&self) -> &EnergyLedger {
        &self.ledger
    }

    /// Cursor into the path while executing.
    #[must_use]
    pub const fn current_waypoint_index(&self) -> usize {
        self.current_waypoint_index
    }

    /// Whether the path is being executed.
    #[must_use]
    pub const fn is_following_path(&self) -> bool {
        self.following
    }

    /// Whether placements and cancellations are accepted.
    #[must_use]
    pub const fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Horizontal distance covered while following the path this round.
    #[must_use]
    pub const fn distance_travelled(&self) -> f32 {
        self.distance_travelled
    }

    /// Effective energy available for placements.
    #[must_use]
    pub const fn available_energy(&self) -> u32 {
        self.ledger.available(self.energy.bonus_multiplier)
    }

    /// Position of the last waypoint, if any.
    #[must_use]
    pub fn last_waypoint_position(&self) -> Option<Vec3> {
        self.path.last().map(|waypoint| waypoint.position())
    }

    /// Whether the planner holds nothing beyond the starting waypoint.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.path.len() <= 1
    }

    /// Whether [`Self::cancel_last_placement`] would succeed.
    #[must_use]
    pub fn can_cancel_last_waypoint(&self) -> bool {
        self.cancel_precondition().is_ok()
    }

    /// Enables or disables placements.
    pub fn set_accepting(&mut self, accepting: bool) {
        self.accepting = accepting;
    }

    /// Replaces the path with a single movement waypoint at `position`.
    pub fn initialize_starting_waypoint(&mut self, position: Vec3) {
        self.path.clear();
        self.current_waypoint_index = 0;
        let _ = self
            .path
            .push(self.owner, position, None, EnergyDebit::default());
    }

    /// Validates and commits a placement at `hit_point`.
    ///
    /// Cost is measured from the last waypoint, or from `character_position`
    /// when the path is empty.
    pub fn handle_placement_request(
        &mut self,
        hit_point: Vec3,
        action: Option<ActionId>,
        character_position: Vec3,
    ) -> Result<PlacementReceipt, PlacementRejection> {
        if !self.accepting || self.following {
            return Err(PlacementRejection::NotAccepting);
        }
        if !geometry::is_finite_point(hit_point) {
            warn!(character = %self.owner, ?hit_point, "degenerate_hit_point");
            return Err(PlacementRejection::DegenerateHitPoint);
        }

        let kind = WaypointKind::of(action.as_ref());
        let anchor = self.last_waypoint_position().unwrap_or(character_position);
        let radius = self.energy.placement_radius;

        if kind == WaypointKind::Movement && geometry::horizontal_distance(anchor, hit_point) <= radius
        {
            return Err(PlacementRejection::TooCloseToLastWaypoint);
        }

        let cost = energy_rings(anchor, hit_point, radius);
        let debit = self
            .ledger
            .spend(cost, self.energy.bonus_multiplier)
            .map_err(|_| PlacementRejection::InsufficientEnergy)?;

        let index = self.path.push(self.owner, hit_point, action.clone(), debit);
        debug!(
            character = %self.owner,
            index,
            cost,
            %kind,
            "waypoint_placed"
        );
        Ok(PlacementReceipt {
            index,
            position: hit_point,
            cost,
            kind,
            action,
        })
    }

    /// Removes the most recent waypoint and refunds what it cost.
    pub fn cancel_last_placement(
        &mut self,
        character_position: Vec3,
    ) -> Result<CancellationReceipt, CancelRejection> {
        self.cancel_precondition()?;

        let anchor = if self.path.len() > 2 {
            self.path
                .get(self.path.len() - 2)
                .map_or(character_position, |waypoint| waypoint.position())
        } else {
            character_position
        };

        let Some(removed) = self.path.pop() else {
            return Err(CancelRejection::OnlyStartingWaypoint);
        };
        let refund = energy_rings(anchor, removed.position(), self.energy.placement_radius);
        let debit = removed.debit();
        let restored = debit.effective(self.energy.bonus_multiplier);
        self.ledger.refund(debit);

        debug!(
            character = %self.owner,
            index = removed.index(),
            refund,
            restored,
            "waypoint_cancelled"
        );
        Ok(CancellationReceipt {
            index: removed.index(),
            position: removed.position(),
            refund,
            restored,
            action: removed.item().cloned(),
        })
    }

    /// Replaces the action of the card waypoint at `index` and returns the
    /// previous one. Ring cost does not depend on the action, so energy is
    /// left untouched.
    pub fn swap_action(
        &mut self,
        index: usize,
        action: ActionId,
    ) -> Result<ActionId, ActionSwapRejection> {
        if !self.accepting || self.following {
            return Err(ActionSwapRejection::NotAccepting);
        }
        let waypoint = self
            .path
            .get_mut(index)
            .ok_or(ActionSwapRejection::NotACardWaypoint)?;
        let previous = waypoint
            .item()
            .cloned()
            .ok_or(ActionSwapRejection::NotACardWaypoint)?;
        if !waypoint.set_item(Some(action)) {
            return Err(ActionSwapRejection::NotAccepting);
        }
        debug!(character = %self.owner, index, %previous, "waypoint_action_swapped");
        Ok(previous)
    }

    /// Begins executing the path. Returns `false` when the path is empty or invalid.
    pub fn start_following_path(&mut self) -> bool {
        if self.path.is_empty() {
            return false;
        }
        if !self.path.is_valid() {
            warn!(character = %self.owner, "invalid_path_not_followed");
            return false;
        }
        self.path.commit();
        self.current_waypoint_index = 0;
        self.following = true;
        self.accepting = false;
        true
    }

    /// Halts execution and any physical movement. Returns whether the planner
    /// was following its path.
    pub fn stop_following_path(&mut self, body: &mut dyn Locomotion) -> bool {
        let was_following = self.following;
        self.following = false;
        body.stop_immediately();
        was_following
    }

    /// Clears the path without re-initializing it.
    pub fn reset_path(&mut self) {
        self.path.clear();
        self.current_waypoint_index = 0;
        self.following = false;
    }

    /// Starts a new round: regular energy is re-granted and buffer energy
    /// accrues from the distance travelled. Returns the accrued buffer units.
    pub fn grant_round_energy(&mut self, energy_per_round: u32) -> u32 {
        let accrued = self
            .ledger
            .grant_round(energy_per_round, self.distance_travelled, &self.energy);
        self.distance_travelled = 0.0;
        accrued
    }

    pub(crate) fn record_travel(&mut self, distance: f32) {
        if distance.is_finite() {
            self.distance_travelled += distance;
        }
    }

    /// Advances execution by one tick.
    ///
    /// Reached waypoints are consumed first, bounded per tick. The body is then
    /// steered toward the current target.
    pub fn advance(
        &mut self,
        body: &mut dyn Locomotion,
        actions: &mut dyn ActionHandler,
        out_events: &mut Vec<Event>,
    ) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        if !self.following {
            return report;
        }

        while self.following && self.within_tolerance_of_current(body) {
            if report.reached >= self.movement.max_waypoint_skips_per_tick {
                warn!(
                    character = %self.owner,
                    limit = self.movement.max_waypoint_skips_per_tick,
                    "waypoint_skip_limit_reached"
                );
                out_events.push(Event::WaypointSkipLimitReached {
                    character: self.owner,
                });
                break;
            }
            report.reached += 1;
            self.on_waypoint_reached(body, actions, out_events, &mut report);
        }

        if self.following {
            self.move_to_current_waypoint(body);
        }
        report
    }

    fn within_tolerance_of_current(&self, body: &dyn Locomotion) -> bool {
        self.path
            .get(self.current_waypoint_index)
            .is_some_and(|waypoint| {
                geometry::horizontal_distance(body.position(), waypoint.position())
                    <= self.movement.movement_tolerance
            })
    }

    fn on_waypoint_reached(
        &mut self,
        body: &mut dyn Locomotion,
        actions: &mut dyn ActionHandler,
        out_events: &mut Vec<Event>,
        report: &mut AdvanceReport,
    ) {
        let reached = self.current_waypoint_index;
        self.brake_on_hard_turn(body, out_events);

        out_events.push(Event::WaypointReached {
            character: self.owner,
            index: reached,
        });

        if let Some(action) = self.path.get(reached).and_then(|waypoint| waypoint.item()) {
            out_events.push(Event::ActionTriggered {
                character: self.owner,
                action: action.clone(),
            });
            if actions.trigger(self.owner, action) == ActionStatus::InProgress {
                report.actions_in_progress += 1;
            }
        }

        self.current_waypoint_index += 1;

        let Some(next) = self.path.get(self.current_waypoint_index) else {
            self.following = false;
            body.stop_immediately();
            report.completed = true;
            info!(character = %self.owner, "movement_completed");
            out_events.push(Event::MovementCompleted {
                character: self.owner,
            });
            return;
        };

        let velocity = body.velocity();
        let speed = velocity.truncate().length();
        if let Some(direction) = geometry::horizontal_direction(body.position(), next.position()) {
            body.set_velocity(Vec3::new(direction.x * speed, direction.y * speed, velocity.z));
        }
    }

    fn brake_on_hard_turn(&self, body: &mut dyn Locomotion, out_events: &mut Vec<Event>) {
        let Some(next) = self.path.get(self.current_waypoint_index + 1) else {
            return;
        };
        let heading = body.velocity().truncate().extend(0.0);
        let towards_next = (next.position() - body.position()).truncate().extend(0.0);
        if heading == Vec3::ZERO || towards_next == Vec3::ZERO {
            return;
        }

        let angle = geometry::angle_between(heading, towards_next);
        if angle > self.movement.u_turn_threshold {
            debug!(character = %self.owner, angle, "hard_turn_braked");
            body.stop_immediately();
            out_events.push(Event::HardTurnBraked {
                character: self.owner,
                angle,
            });
        }
    }

    fn move_to_current_waypoint(&self, body: &mut dyn Locomotion) {
        let Some(target) = self.path.get(self.current_waypoint_index) else {
            return;
        };
        let position = body.position();
        let Some(direction) = geometry::horizontal_direction(position, target.position()) else {
            return;
        };

        let mut scale = self.movement.max_input_scale;
        let heading = body.velocity().truncate().extend(0.0);
        if heading != Vec3::ZERO {
            let angle = geometry::angle_between(heading, direction);
            let distance = geometry::horizontal_distance(position, target.position());
            let slow_distance = self.movement.slow_distance();
            if angle > self.movement.slow_turn_threshold && distance < slow_distance {
                scale = (distance / slow_distance)
                    .clamp(self.movement.min_input_scale, self.movement.max_input_scale);
            }
        }
        body.add_movement_input(direction, scale);
    }

    fn cancel_precondition(&self) -> Result<(), CancelRejection> {
        if self.following {
            return Err(CancelRejection::FollowingPath);
        }
        if !self.accepting {
            return Err(CancelRejection::NotAccepting);
        }
        if self.path.len() <= 1 {
            return Err(CancelRejection::OnlyStartingWaypoint);
        }
        Ok(())
    }
}
