#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ring-based energy economy shared by the movement planner and the drag preview.
//!
//! Costs are derived from horizontal distance only, rounded up against the
//! player, while distance-based income is rounded down. The [`EnergyLedger`]
//! owns the two per-character pools and is the only place they are mutated.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tactics_core::geometry;
use thiserror::Error;
use tracing::debug;

/// Default radius of the free placement zone and of every cost ring.
pub const DEFAULT_PLACEMENT_RADIUS: f32 = 200.0;

/// Default conversion rate between buffer units and regular energy.
pub const DEFAULT_BONUS_MULTIPLIER: u32 = 2;

/// Tunables of the energy economy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Radius of the free placement zone and the width of each cost ring.
    pub placement_radius: f32,
    /// Effective energy granted by a single buffer unit.
    pub bonus_multiplier: u32,
    /// Buffer units earned per placement radius travelled.
    pub buffer_accrual_multiplier: f32,
    /// Upper bound on buffer units earned in a single round.
    pub max_buffer_per_turn: u32,
}

impl EnergyConfig {
    /// Creates a new energy configuration.
    #[must_use]
    pub const fn new(
        placement_radius: f32,
        bonus_multiplier: u32,
        buffer_accrual_multiplier: f32,
        max_buffer_per_turn: u32,
    ) -> Self {
        Self {
            placement_radius,
            bonus_multiplier,
            buffer_accrual_multiplier,
            max_buffer_per_turn,
        }
    }

    /// Checks that the configuration describes a usable economy.
    pub fn validate(&self) -> Result<(), EnergyError> {
        if !self.placement_radius.is_finite() || self.placement_radius <= 0.0 {
            return Err(EnergyError::InvalidRadius(self.placement_radius));
        }
        if self.bonus_multiplier == 0 {
            return Err(EnergyError::ZeroBonusMultiplier);
        }
        if !self.buffer_accrual_multiplier.is_finite() || self.buffer_accrual_multiplier < 0.0 {
            return Err(EnergyError::InvalidAccrual(self.buffer_accrual_multiplier));
        }
        Ok(())
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEMENT_RADIUS, DEFAULT_BONUS_MULTIPLIER, 0.5, 3)
    }
}

/// Errors raised by energy bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum EnergyError {
    /// The requested spend exceeds the available effective energy.
    #[error("cost {cost} exceeds available energy {available}")]
    Insufficient {
        /// Ring cost that was requested.
        cost: u32,
        /// Effective energy that was available.
        available: u32,
    },
    /// The placement radius must be a positive finite number.
    #[error("placement radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    /// Buffer units must be worth at least one regular unit.
    #[error("bonus multiplier must be non-zero")]
    ZeroBonusMultiplier,
    /// Buffer accrual must be a non-negative finite number.
    #[error("buffer accrual multiplier must be non-negative and finite, got {0}")]
    InvalidAccrual(f32),
}

/// Number of cost rings between `center` and `point`.
///
/// Points within `radius` (horizontally) are free. Beyond that every started
/// annulus of width `radius` costs one unit. A non-positive radius yields zero.
#[must_use]
pub fn energy_rings(center: Vec3, point: Vec3, radius: f32) -> u32 {
    if radius.is_nan() || radius <= 0.0 {
        return 0;
    }
    let distance = geometry::horizontal_distance(center, point);
    if !distance.is_finite() || distance <= radius {
        return 0;
    }
    ((distance - radius) / radius).ceil() as u32
}

/// Buffer units earned by travelling `total_distance` during a round.
#[must_use]
pub fn buffer_energy_from_distance(total_distance: f32, config: &EnergyConfig) -> u32 {
    let radius = config.placement_radius;
    if radius.is_nan() || radius <= 0.0 || !total_distance.is_finite() || total_distance <= 0.0 {
        return 0;
    }
    let earned = (total_distance / radius) * config.buffer_accrual_multiplier;
    earned.min(config.max_buffer_per_turn as f32).floor() as u32
}

/// Effective energy available for spending.
#[must_use]
pub const fn total_available_energy(regular: u32, buffer: u32, bonus_multiplier: u32) -> u32 {
    regular.saturating_add(buffer.saturating_mul(bonus_multiplier))
}

/// Receipt describing how a spend was paid.
///
/// Refunding the receipt restores the ledger to its state before the spend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyDebit {
    /// Buffer units consumed.
    pub buffer_units: u32,
    /// Regular energy consumed.
    pub regular: u32,
}

impl EnergyDebit {
    /// Effective energy the receipt represents.
    #[must_use]
    pub const fn effective(&self, bonus_multiplier: u32) -> u32 {
        total_available_energy(self.regular, self.buffer_units, bonus_multiplier)
    }
}

/// Per-character energy pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyLedger {
    energy: u32,
    buffer_energy: u32,
}

impl EnergyLedger {
    /// Creates a ledger with the provided pools.
    #[must_use]
    pub const fn new(energy: u32, buffer_energy: u32) -> Self {
        Self {
            energy,
            buffer_energy,
        }
    }

    /// Regular energy pool.
    #[must_use]
    pub const fn energy(&self) -> u32 {
        self.energy
    }

    /// Buffer energy pool.
    #[must_use]
    pub const fn buffer_energy(&self) -> u32 {
        self.buffer_energy
    }

    /// Effective energy available for spending.
    #[must_use]
    pub const fn available(&self, bonus_multiplier: u32) -> u32 {
        total_available_energy(self.energy, self.buffer_energy, bonus_multiplier)
    }

    /// Reports whether `cost` can be paid.
    #[must_use]
    pub const fn can_afford(&self, cost: u32, bonus_multiplier: u32) -> bool {
        cost <= self.available(bonus_multiplier)
    }

    /// Pays `cost`, drawing buffer units first.
    ///
    /// Buffer units are rounded up, so a partially used unit is consumed in
    /// full. Regular energy covers whatever the buffer could not.
    pub fn spend(&mut self, cost: u32, bonus_multiplier: u32) -> Result<EnergyDebit, EnergyError> {
        let available = self.available(bonus_multiplier);
        if cost > available {
            return Err(EnergyError::Insufficient { cost, available });
        }

        let multiplier = bonus_multiplier.max(1);
        let mut debit = EnergyDebit::default();
        let mut remaining = cost;

        if self.buffer_energy > 0 && remaining > 0 {
            let effective = self.buffer_energy.saturating_mul(multiplier);
            let used = effective.min(remaining);
            let units = used.div_ceil(multiplier).min(self.buffer_energy);
            self.buffer_energy -= units;
            debit.buffer_units = units;
            remaining = remaining.saturating_sub(units.saturating_mul(multiplier));
        }

        let regular = remaining.min(self.energy);
        self.energy -= regular;
        debit.regular = regular;

        debug!(
            cost,
            buffer_units = debit.buffer_units,
            regular = debit.regular,
            energy = self.energy,
            buffer_energy = self.buffer_energy,
            "energy_spent"
        );
        Ok(debit)
    }

    /// Restores a previous spend.
    pub fn refund(&mut self, debit: EnergyDebit) {
        self.energy = self.energy.saturating_add(debit.regular);
        self.buffer_energy = self.buffer_energy.saturating_add(debit.buffer_units);
        debug!(
            buffer_units = debit.buffer_units,
            regular = debit.regular,
            energy = self.energy,
            buffer_energy = self.buffer_energy,
            "energy_refunded"
        );
    }

    /// Starts a new round: regular energy is reset to `energy_per_round`, and
    /// buffer energy accrues from `distance_travelled`. Returns the accrued units.
    pub fn grant_round(
        &mut self,
        energy_per_round: u32,
        distance_travelled: f32,
        config: &EnergyConfig,
    ) -> u32 {
        let accrued = buffer_energy_from_distance(distance_travelled, config);
        self.energy = energy_per_round;
        self.buffer_energy = self.buffer_energy.saturating_add(accrued);
        accrued
    }
}

#[cfg(test)]
mod tests {
    use super::{
        buffer_energy_from_distance, energy_rings, total_available_energy, EnergyConfig,
        EnergyError, EnergyLedger,
    };
    use glam::Vec3;

    fn at(distance: f32) -> Vec3 {
        Vec3::new(distance, 0.0, 0.0)
    }

    #[test]
    fn rings_are_free_inside_the_radius() {
        for distance in [0.0, 50.0, 199.9, 200.0] {
            assert_eq!(energy_rings(Vec3::ZERO, at(distance), 200.0), 0);
        }
    }

    #[test]
    fn rings_round_up_beyond_the_radius() {
        assert_eq!(energy_rings(Vec3::ZERO, at(201.0), 200.0), 1);
        assert_eq!(energy_rings(Vec3::ZERO, at(250.0), 200.0), 1);
        assert_eq!(energy_rings(Vec3::ZERO, at(400.0), 200.0), 1);
        assert_eq!(energy_rings(Vec3::ZERO, at(401.0), 200.0), 2);
        assert_eq!(energy_rings(Vec3::ZERO, at(1000.0), 200.0), 4);
    }

    #[test]
    fn rings_ignore_height() {
        let point = Vec3::new(100.0, 0.0, 5000.0);
        assert_eq!(energy_rings(Vec3::ZERO, point, 200.0), 0);
    }

    #[test]
    fn degenerate_radius_costs_nothing() {
        assert_eq!(energy_rings(Vec3::ZERO, at(1000.0), 0.0), 0);
        assert_eq!(energy_rings(Vec3::ZERO, at(1000.0), f32::NAN), 0);
    }

    #[test]
    fn buffer_income_is_floored_and_capped() {
        let config = EnergyConfig::default();
        assert_eq!(buffer_energy_from_distance(399.0, &config), 0);
        assert_eq!(buffer_energy_from_distance(400.0, &config), 1);
        assert_eq!(buffer_energy_from_distance(1000.0, &config), 2);
        assert_eq!(buffer_energy_from_distance(100_000.0, &config), 3);
        assert_eq!(buffer_energy_from_distance(-10.0, &config), 0);
    }

    #[test]
    fn total_available_converts_buffer_units() {
        assert_eq!(total_available_energy(3, 2, 2), 7);
        assert_eq!(total_available_energy(u32::MAX, 1, 2), u32::MAX);
    }

    #[test]
    fn spend_draws_buffer_before_regular() {
        let mut ledger = EnergyLedger::new(4, 2);
        let debit = ledger.spend(3, 2).expect("affordable");
        assert_eq!(debit.buffer_units, 2);
        assert_eq!(debit.regular, 0);
        assert_eq!(ledger.energy(), 4);
        assert_eq!(ledger.buffer_energy(), 0);
    }

    #[test]
    fn spend_falls_through_to_regular_once_buffer_is_exhausted() {
        let mut ledger = EnergyLedger::new(4, 1);
        let debit = ledger.spend(5, 2).expect("affordable");
        assert_eq!(debit.buffer_units, 1);
        assert_eq!(debit.regular, 3);
        assert_eq!(ledger.energy(), 1);
        assert_eq!(ledger.buffer_energy(), 0);
    }

    #[test]
    fn spend_rejects_unaffordable_costs_without_mutation() {
        let mut ledger = EnergyLedger::new(1, 1);
        let error = ledger.spend(4, 2).expect_err("unaffordable");
        assert_eq!(
            error,
            EnergyError::Insufficient {
                cost: 4,
                available: 3
            }
        );
        assert_eq!(ledger, EnergyLedger::new(1, 1));
    }

    #[test]
    fn refund_restores_the_exact_receipt() {
        for (energy, buffer, cost) in [(4, 0, 1), (4, 1, 1), (0, 3, 5), (2, 2, 6)] {
            let mut ledger = EnergyLedger::new(energy, buffer);
            let before = ledger;
            let debit = ledger.spend(cost, 2).expect("affordable");
            ledger.refund(debit);
            assert_eq!(ledger, before, "refund must invert spend of {cost}");
        }
    }

    #[test]
    fn grant_round_resets_regular_and_accrues_buffer() {
        let config = EnergyConfig::default();
        let mut ledger = EnergyLedger::new(1, 1);
        let accrued = ledger.grant_round(4, 800.0, &config);
        assert_eq!(accrued, 2);
        assert_eq!(ledger, EnergyLedger::new(4, 3));
    }

    #[test]
    fn config_validation_rejects_zero_radius() {
        let config = EnergyConfig {
            placement_radius: 0.0,
            ..EnergyConfig::default()
        };
        assert_eq!(config.validate(), Err(EnergyError::InvalidRadius(0.0)));
        assert!(EnergyConfig::default().validate().is_ok());
    }
}
