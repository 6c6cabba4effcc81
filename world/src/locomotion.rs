//! Physical movement seam between planners and character bodies.

use glam::{Vec2, Vec3};

use crate::config::LocomotionConfig;

/// Movement collaborator driven by a planner.
///
/// Implementations own the character's physical state. Planners only read
/// position and velocity and express intent through movement input.
pub trait Locomotion {
    /// Current world position.
    fn position(&self) -> Vec3;

    /// Current world velocity.
    fn velocity(&self) -> Vec3;

    /// Overrides the current velocity.
    fn set_velocity(&mut self, velocity: Vec3);

    /// Requests movement along `direction` scaled by `scale` for the next step.
    fn add_movement_input(&mut self, direction: Vec3, scale: f32);

    /// Zeroes velocity and discards pending input.
    fn stop_immediately(&mut self);
}

/// Point-mass body moving on the horizontal plane.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicBody {
    config: LocomotionConfig,
    position: Vec3,
    velocity: Vec3,
    input: Vec2,
}

impl KinematicBody {
    /// Creates a resting body at `position`.
    #[must_use]
    pub fn new(position: Vec3, config: LocomotionConfig) -> Self {
        Self {
            config,
            position,
            velocity: Vec3::ZERO,
            input: Vec2::ZERO,
        }
    }

    /// Integrates pending input over `dt` seconds and returns the horizontal
    /// distance covered.
    pub fn integrate(&mut self, dt: f32) -> f32 {
        if dt <= 0.0 {
            return 0.0;
        }

        let input = self.input.clamp_length_max(1.0);
        self.input = Vec2::ZERO;

        let current = self.velocity.truncate();
        let next = if input == Vec2::ZERO {
            let speed = (current.length() - self.config.braking_deceleration * dt).max(0.0);
            current.normalize_or_zero() * speed
        } else {
            let desired = input * self.config.max_speed;
            move_towards(current, desired, self.config.acceleration * dt)
        };

        self.velocity = next.extend(self.velocity.z);
        let start = self.position;
        self.position += self.velocity * dt;
        start.truncate().distance(self.position.truncate())
    }
}

impl Locomotion for KinematicBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn add_movement_input(&mut self, direction: Vec3, scale: f32) {
        self.input += direction.truncate() * scale;
    }

    fn stop_immediately(&mut self) {
        self.velocity = Vec3::ZERO;
        self.input = Vec2::ZERO;
    }
}

fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_delta
    }
}
