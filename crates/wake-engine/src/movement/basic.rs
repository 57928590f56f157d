//! Direction-driven strategies: constant, zig-zag and accelerated.

use glam::Vec2;

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use super::{integrate, Direction, Movable, MovementStrategy, WorldView};

/// Largest step an accelerated ramp integrates at once (frame hitches).
pub const MAX_ACCELERATED_STEP: f32 = 1.0 / 30.0;

// ---------------------------------------------------------------------------
// Constant
// ---------------------------------------------------------------------------

/// Fixed speed along the movable's direction, or along a fixed heading.
#[derive(Debug, Clone)]
pub struct ConstantMovement {
    speed: f32,
    heading: Option<Direction>,
    policy: Policy,
}

impl ConstantMovement {
    pub fn new(speed: f32, policy: Policy) -> Result<Self, MovementError> {
        Ok(Self {
            speed: policy.non_negative("speed", speed)?,
            heading: None,
            policy,
        })
    }

    /// Ignore the movable's direction and always move along `heading`.
    pub fn with_heading(mut self, heading: Direction) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), MovementError> {
        self.speed = self.policy.non_negative("speed", speed)?;
        Ok(())
    }
}

impl MovementStrategy for ConstantMovement {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        _view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        let heading = self.heading.unwrap_or_else(|| movable.direction());
        movable.set_speed(self.speed);
        integrate(movable, heading.unit() * self.speed, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

// ---------------------------------------------------------------------------
// ZigZag
// ---------------------------------------------------------------------------

/// Forward motion with a sinusoidal sideways sway.
///
/// The sway velocity is `amplitude * sin(frequency * elapsed)`, where
/// `elapsed` advances by `dt` before each evaluation and never resets.
/// Positive sway is to the right of the heading.
#[derive(Debug, Clone)]
pub struct ZigZagMovement {
    speed: f32,
    amplitude: f32,
    frequency: f32,
    heading: Option<Direction>,
    elapsed: f32,
    policy: Policy,
}

impl ZigZagMovement {
    pub fn new(speed: f32, amplitude: f32, frequency: f32, policy: Policy) -> Result<Self, MovementError> {
        Ok(Self {
            speed: policy.non_negative("speed", speed)?,
            amplitude: policy.non_negative("amplitude", amplitude)?,
            frequency: policy.non_negative("frequency", frequency)?,
            heading: None,
            elapsed: 0.0,
            policy,
        })
    }

    pub fn with_heading(mut self, heading: Direction) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl MovementStrategy for ZigZagMovement {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        _view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        self.elapsed += dt;

        let forward = self.heading.unwrap_or_else(|| movable.direction()).unit();
        if forward == Vec2::ZERO {
            movable.set_velocity(Vec2::ZERO);
            return Ok(());
        }
        // Right-hand side of the heading: Up sways toward +x.
        let lateral = Vec2::new(forward.y, -forward.x);
        let sway = self.amplitude * (self.frequency * self.elapsed).sin();

        movable.set_speed(self.speed);
        integrate(movable, forward * self.speed + lateral * sway, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "zigzag"
    }
}

// ---------------------------------------------------------------------------
// Accelerated
// ---------------------------------------------------------------------------

/// Ramps speed up while a direction is held and coasts down when released.
#[derive(Debug, Clone)]
pub struct AcceleratedMovement {
    max_speed: f32,
    acceleration: f32,
    deceleration: f32,
    current_speed: f32,
    /// Last non-`None` heading, used while coasting.
    heading: Vec2,
    policy: Policy,
}

impl AcceleratedMovement {
    pub fn new(
        max_speed: f32,
        acceleration: f32,
        deceleration: f32,
        policy: Policy,
    ) -> Result<Self, MovementError> {
        Ok(Self {
            max_speed: policy.non_negative("max_speed", max_speed)?,
            acceleration: policy.non_negative("acceleration", acceleration)?,
            deceleration: policy.non_negative("deceleration", deceleration)?,
            current_speed: 0.0,
            heading: Vec2::ZERO,
            policy,
        })
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }
}

impl MovementStrategy for AcceleratedMovement {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        _view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?.min(MAX_ACCELERATED_STEP);

        let direction = movable.direction();
        if direction.is_none() {
            self.current_speed = (self.current_speed - self.deceleration * dt).max(0.0);
        } else {
            self.heading = direction.unit();
            self.current_speed = (self.current_speed + self.acceleration * dt).min(self.max_speed);
        }

        movable.set_speed(self.current_speed);
        integrate(movable, self.heading * self.current_speed, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn supports_halt(&self) -> bool {
        true
    }

    fn halt(&mut self) {
        self.current_speed = 0.0;
    }
}
