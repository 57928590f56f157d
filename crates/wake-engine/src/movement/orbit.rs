//! Strategies that circle a target.

use glam::Vec2;

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use crate::api::types::EntityId;
use super::{resolve_target, Movable, MovementStrategy, WorldView};

/// Largest eccentricity lenient mode will keep.
pub const MAX_ECCENTRICITY: f32 = 0.99;

/// Angle of `offset` around the origin; a zero offset starts at angle 0.
fn angle_of(offset: Vec2) -> f32 {
    if offset.length_squared() <= f32::EPSILON {
        0.0
    } else {
        offset.y.atan2(offset.x)
    }
}

/// Jump to `next` and report the velocity that covers the jump in `dt`.
fn place(movable: &mut dyn Movable, next: Vec2, dt: f32) {
    let velocity = if dt > 0.0 {
        (next - movable.position()) / dt
    } else {
        Vec2::ZERO
    };
    movable.set_velocity(velocity);
    movable.set_speed(velocity.length());
    movable.set_position(next);
}

// ---------------------------------------------------------------------------
// Orbital
// ---------------------------------------------------------------------------

/// Circle (or ellipse) around a target at a fixed angular rate.
///
/// The starting angle is taken from the movable's offset to the target on
/// the first call, so attaching an orbit never teleports along the ring's
/// angle, only onto the ring.
#[derive(Debug, Clone)]
pub struct OrbitalMovement {
    target: Option<EntityId>,
    orbit_radius: f32,
    rotation_speed: f32,
    eccentricity: f32,
    angle: Option<f32>,
    policy: Policy,
}

impl OrbitalMovement {
    pub fn new(
        target: Option<EntityId>,
        orbit_radius: f32,
        rotation_speed: f32,
        policy: Policy,
    ) -> Result<Self, MovementError> {
        Ok(Self {
            target,
            orbit_radius: policy.non_negative("orbit_radius", orbit_radius)?,
            rotation_speed: policy.finite("rotation_speed", rotation_speed)?,
            eccentricity: 0.0,
            angle: None,
            policy,
        })
    }

    /// Eccentricity must lie in `[0, 1)`.
    pub fn with_eccentricity(mut self, eccentricity: f32) -> Result<Self, MovementError> {
        self.eccentricity = if (0.0..1.0).contains(&eccentricity) {
            eccentricity
        } else {
            let err = MovementError::OutOfRange {
                field: "eccentricity",
                value: eccentricity,
                min: 0.0,
                max: 1.0,
            };
            let fallback = if eccentricity.is_finite() {
                eccentricity.abs().min(MAX_ECCENTRICITY)
            } else {
                0.0
            };
            self.policy.recover(err, fallback)?
        };
        Ok(self)
    }

    pub fn eccentricity(&self) -> f32 {
        self.eccentricity
    }

    pub fn angle(&self) -> Option<f32> {
        self.angle
    }

    pub fn semi_minor(&self) -> f32 {
        self.orbit_radius * (1.0 - self.eccentricity * self.eccentricity).sqrt()
    }
}

impl MovementStrategy for OrbitalMovement {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        let Some(target) = resolve_target(view, self.target, self.name(), self.policy)? else {
            return Ok(());
        };
        let centre = target.pos;
        let angle = self.angle.unwrap_or_else(|| angle_of(movable.position() - centre))
            + self.rotation_speed * dt;
        self.angle = Some(angle);

        let offset = Vec2::new(self.orbit_radius * angle.cos(), self.semi_minor() * angle.sin());
        place(movable, centre + offset, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "orbital"
    }
}

// ---------------------------------------------------------------------------
// Spiral approach
// ---------------------------------------------------------------------------

/// Circle a target while closing in, down to `min_radius`.
#[derive(Debug, Clone)]
pub struct SpiralApproach {
    target: Option<EntityId>,
    angular_speed: f32,
    approach_speed: f32,
    min_radius: f32,
    radius: Option<f32>,
    angle: Option<f32>,
    policy: Policy,
}

impl SpiralApproach {
    pub fn new(
        target: Option<EntityId>,
        angular_speed: f32,
        approach_speed: f32,
        min_radius: f32,
        policy: Policy,
    ) -> Result<Self, MovementError> {
        Ok(Self {
            target,
            angular_speed: policy.finite("angular_speed", angular_speed)?,
            approach_speed: policy.non_negative("approach_speed", approach_speed)?,
            min_radius: policy.non_negative("min_radius", min_radius)?,
            radius: None,
            angle: None,
            policy,
        })
    }

    pub fn radius(&self) -> Option<f32> {
        self.radius
    }
}

impl MovementStrategy for SpiralApproach {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        let Some(target) = resolve_target(view, self.target, self.name(), self.policy)? else {
            return Ok(());
        };
        let centre = target.pos;
        let offset = movable.position() - centre;

        let radius = (self.radius.unwrap_or_else(|| offset.length()) - self.approach_speed * dt)
            .max(self.min_radius);
        let angle = self.angle.unwrap_or_else(|| angle_of(offset)) + self.angular_speed * dt;
        self.radius = Some(radius);
        self.angle = Some(angle);

        place(movable, centre + Vec2::from_angle(angle) * radius, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "spiral_approach"
    }
}
