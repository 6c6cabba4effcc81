//! Path nodes and the ordered path that owns them.

use glam::Vec3;
use tactics_core::{ActionId, CharacterId, WaypointKind};
use tactics_system_energy::EnergyDebit;

/// A single node of a character's planned path.
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    owner: CharacterId,
    index: usize,
    position: Vec3,
    action: Option<ActionId>,
    debit: EnergyDebit,
    committed: bool,
}

impl Waypoint {
    pub(crate) fn new(
        owner: CharacterId,
        index: usize,
        position: Vec3,
        action: Option<ActionId>,
        debit: EnergyDebit,
    ) -> Self {
        Self {
            owner,
            index,
            position,
            action,
            debit,
            committed: false,
        }
    }

    /// Character whose path holds the waypoint.
    #[must_use]
    pub const fn owner(&self) -> CharacterId {
        self.owner
    }

    /// Position of the waypoint within its path.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// World position of the waypoint.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Action carried by the waypoint, if any.
    #[must_use]
    pub fn item(&self) -> Option<&ActionId> {
        self.action.as_ref()
    }

    /// Reports whether the waypoint carries an action.
    #[must_use]
    pub const fn has_item(&self) -> bool {
        self.action.is_some()
    }

    /// Movement or card node.
    #[must_use]
    pub fn kind(&self) -> WaypointKind {
        WaypointKind::of(self.action.as_ref())
    }

    /// Replaces the attached action. Returns `false` once the path is executing.
    pub(crate) fn set_item(&mut self, action: Option<ActionId>) -> bool {
        if self.committed {
            return false;
        }
        self.action = action;
        true
    }

    /// Energy paid when the waypoint was placed.
    #[must_use]
    pub const fn debit(&self) -> EnergyDebit {
        self.debit
    }
}

/// Ordered sequence of waypoints owned by a single planner.
///
/// Every waypoint's index equals its position in the sequence after any
/// mutation returns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    /// Number of waypoints in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the path holds no waypoint.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Borrows the waypoint at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Mutably borrows the waypoint at `index`.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Waypoint> {
        self.waypoints.get_mut(index)
    }

    /// Last waypoint of the path.
    #[must_use]
    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Iterator over the waypoints in path order.
    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    pub(crate) fn push(
        &mut self,
        owner: CharacterId,
        position: Vec3,
        action: Option<ActionId>,
        debit: EnergyDebit,
    ) -> usize {
        let index = self.waypoints.len();
        self.waypoints
            .push(Waypoint::new(owner, index, position, action, debit));
        index
    }

    pub(crate) fn pop(&mut self) -> Option<Waypoint> {
        let removed = self.waypoints.pop();
        self.reindex();
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.waypoints.clear();
    }

    pub(crate) fn commit(&mut self) {
        for waypoint in &mut self.waypoints {
            waypoint.committed = true;
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.waypoints
            .iter()
            .enumerate()
            .all(|(index, waypoint)| waypoint.index == index && waypoint.position.is_finite())
    }

    fn reindex(&mut self) {
        for (index, waypoint) in self.waypoints.iter_mut().enumerate() {
            waypoint.index = index;
        }
    }
}
