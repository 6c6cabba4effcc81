//! Tunables consumed by the world and its planners.

use std::{f32::consts::PI, time::Duration};

use serde::{Deserialize, Serialize};
use tactics_system_energy::{EnergyConfig, EnergyError};
use thiserror::Error;

/// Movement execution tunables of a planner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Horizontal distance at which a waypoint counts as reached.
    pub movement_tolerance: f32,
    /// Angle in radians above which reaching a waypoint stops the character dead.
    pub u_turn_threshold: f32,
    /// Angle in radians above which input is eased near the target.
    pub slow_turn_threshold: f32,
    /// Multiplier applied to the tolerance to obtain the easing distance.
    pub slow_distance_multiplier: f32,
    /// Lower clamp of the eased input scale.
    pub min_input_scale: f32,
    /// Upper clamp of the eased input scale.
    pub max_input_scale: f32,
    /// Upper bound on waypoints reached within a single tick.
    pub max_waypoint_skips_per_tick: u32,
}

impl MovementConfig {
    /// Distance below which sharp turns ease the movement input.
    #[must_use]
    pub fn slow_distance(&self) -> f32 {
        self.movement_tolerance * self.slow_distance_multiplier
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            movement_tolerance: 10.0,
            u_turn_threshold: PI * 0.8,
            slow_turn_threshold: PI * 0.7,
            slow_distance_multiplier: 10.0,
            min_input_scale: 0.1,
            max_input_scale: 1.0,
            max_waypoint_skips_per_tick: 10,
        }
    }
}

/// Kinematic limits of a character body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Horizontal speed reached with full input.
    pub max_speed: f32,
    /// Rate at which input changes horizontal velocity.
    pub acceleration: f32,
    /// Rate at which a body without input slows down.
    pub braking_deceleration: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            max_speed: 600.0,
            acceleration: 2048.0,
            braking_deceleration: 2048.0,
        }
    }
}

/// Phase transition tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Delay before an idle character reports completion in the action phase.
    #[serde(with = "seconds")]
    pub idle_completion_delay: Duration,
    /// Regular energy granted at the start of every preparation phase.
    pub energy_per_round: u32,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            idle_completion_delay: Duration::from_secs(5),
            energy_per_round: 4,
        }
    }
}

/// Aggregate configuration of the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Energy economy.
    pub energy: EnergyConfig,
    /// Planner execution.
    pub movement: MovementConfig,
    /// Character bodies.
    pub locomotion: LocomotionConfig,
    /// Phase transitions.
    pub phase: PhaseConfig,
}

impl WorldConfig {
    /// Checks that every section describes a usable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.energy.validate()?;

        let movement = &self.movement;
        for (name, value) in [
            ("movement.movement_tolerance", movement.movement_tolerance),
            ("movement.slow_distance_multiplier", movement.slow_distance_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive(name));
            }
        }
        for (name, value) in [
            ("movement.u_turn_threshold", movement.u_turn_threshold),
            ("movement.slow_turn_threshold", movement.slow_turn_threshold),
            ("movement.min_input_scale", movement.min_input_scale),
            ("movement.max_input_scale", movement.max_input_scale),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(name));
            }
        }
        if movement.min_input_scale > movement.max_input_scale {
            return Err(ConfigError::InputScaleRange {
                min: movement.min_input_scale,
                max: movement.max_input_scale,
            });
        }
        if movement.max_waypoint_skips_per_tick == 0 {
            return Err(ConfigError::NonPositive("movement.max_waypoint_skips_per_tick"));
        }

        let locomotion = &self.locomotion;
        for (name, value) in [
            ("locomotion.max_speed", locomotion.max_speed),
            ("locomotion.acceleration", locomotion.acceleration),
            ("locomotion.braking_deceleration", locomotion.braking_deceleration),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive(name));
            }
        }
        Ok(())
    }
}

/// Errors reported for unusable configurations.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The energy section is invalid.
    #[error(transparent)]
    Energy(#[from] EnergyError),
    /// A value that must be positive was not.
    #[error("{0} must be positive and finite")]
    NonPositive(&'static str),
    /// A value that must be a finite number was not.
    #[error("{0} must be finite")]
    NotFinite(&'static str),
    /// The eased input range is inverted.
    #[error("min_input_scale {min} exceeds max_input_scale {max}")]
    InputScaleRange {
        /// Configured lower clamp.
        min: f32,
        /// Configured upper clamp.
        max: f32,
    },
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
    }
}
