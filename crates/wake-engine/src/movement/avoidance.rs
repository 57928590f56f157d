use glam::Vec2;

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use super::{integrate, Movable, MovementStrategy, TargetSet, WorldView, COINCIDENT};

/// Push away from every obstacle inside `detection_radius`.
///
/// Each obstacle contributes `normalize(self − obstacle) · (1 − d / radius)`.
/// The sum is clamped to unit length and scaled by `strength`, so the
/// velocity never exceeds `strength`.
#[derive(Debug, Clone)]
pub struct ObstacleAvoidance {
    obstacles: TargetSet,
    detection_radius: f32,
    strength: f32,
    policy: Policy,
}

impl ObstacleAvoidance {
    pub fn new(
        obstacles: TargetSet,
        detection_radius: f32,
        strength: f32,
        policy: Policy,
    ) -> Result<Self, MovementError> {
        Ok(Self {
            obstacles,
            detection_radius: policy.non_negative("detection_radius", detection_radius)?,
            strength: policy.non_negative("avoidance_strength", strength)?,
            policy,
        })
    }

    /// Unit-clamped repulsion at `from`, before scaling by strength.
    pub fn repulsion(&self, from: Vec2, view: &WorldView) -> Vec2 {
        if self.detection_radius <= 0.0 {
            return Vec2::ZERO;
        }
        let sum: Vec2 = view
            .select(&self.obstacles)
            .filter_map(|(_, obstacle)| {
                let away = from - obstacle.pos;
                let distance = away.length();
                (distance >= COINCIDENT && distance < self.detection_radius)
                    .then(|| away / distance * (1.0 - distance / self.detection_radius))
            })
            .sum();
        sum.clamp_length_max(1.0)
    }
}

impl MovementStrategy for ObstacleAvoidance {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        let velocity = self.repulsion(movable.position(), view) * self.strength;
        movable.set_speed(velocity.length());
        integrate(movable, velocity, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "obstacle_avoidance"
    }
}
