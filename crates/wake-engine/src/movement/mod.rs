//! Movement strategies and the per-entity movement manager.
//!
//! A strategy is a small stateful object that advances a [`Movable`] by one
//! tick. Strategies read other entities only through the tick's
//! [`WorldView`] and never mutate anything but the movable they are given,
//! which is what lets [`CompositeMovement`] evaluate every child from the
//! same snapshot.

pub mod avoidance;
pub mod basic;
pub mod composite;
pub mod config;
pub mod direction;
pub mod manager;
pub mod orbit;
pub mod presets;
pub mod pursuit;
pub mod random;
pub mod view;

use glam::Vec2;

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use crate::api::types::EntityId;

pub use avoidance::ObstacleAvoidance;
pub use basic::{AcceleratedMovement, ConstantMovement, ZigZagMovement};
pub use composite::CompositeMovement;
pub use config::StrategyConfig;
pub use direction::Direction;
pub use manager::{MovementManager, MovementState};
pub use orbit::{OrbitalMovement, SpiralApproach};
pub use pursuit::{FollowMovement, InterceptorMovement, NearestTargetSeek, SpringFollow};
pub use random::RandomizedSwitching;
pub use view::{TargetSet, ViewEntry, WorldView};

/// Anything with a position, a scalar speed, a velocity and a heading.
pub trait Movable {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, pos: Vec2);
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, velocity: Vec2);
    fn speed(&self) -> f32;
    /// Implementations store `speed.abs()`; validation against the policy
    /// happens before this is called.
    fn set_speed(&mut self, speed: f32);
    fn direction(&self) -> Direction;
}

/// Plain movable state. Used as the manager's authoritative kinematics and
/// as the scratch copy a composite hands to each child.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovableState {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub speed: f32,
    pub direction: Direction,
}

impl MovableState {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Copy every field out of any movable.
    pub fn snapshot(movable: &dyn Movable) -> Self {
        Self {
            pos: movable.position(),
            velocity: movable.velocity(),
            speed: movable.speed(),
            direction: movable.direction(),
        }
    }
}

impl Movable for MovableState {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.abs();
    }

    fn direction(&self) -> Direction {
        self.direction
    }
}

/// One movement behaviour.
pub trait MovementStrategy {
    /// Advance `movable` by `dt` seconds.
    ///
    /// Strategies built with [`Policy::Lenient`](crate::api::policy::Policy)
    /// never return `Err`.
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError>;

    /// Short stable name, used in logs and for removal by identity.
    fn name(&self) -> &'static str;

    /// Whether [`halt`](Self::halt) / [`resume`](Self::resume) do anything.
    fn supports_halt(&self) -> bool {
        false
    }

    fn halt(&mut self) {}

    fn resume(&mut self) {}
}

/// Set velocity and integrate position over `dt`.
/// Entities closer than this to the mover are treated as the mover itself.
pub(crate) const COINCIDENT: f32 = 1e-4;

pub(crate) fn integrate(movable: &mut dyn Movable, velocity: Vec2, dt: f32) {
    movable.set_velocity(velocity);
    movable.set_position(movable.position() + velocity * dt);
}

/// Look up a strategy's target in the view. `Ok(None)` means the policy
/// chose to skip this frame.
pub(crate) fn resolve_target<'v>(
    view: &'v WorldView,
    target: Option<EntityId>,
    strategy: &'static str,
    policy: Policy,
) -> Result<Option<&'v ViewEntry>, MovementError> {
    match target.and_then(|id| view.get(id)) {
        Some(entry) => Ok(Some(entry)),
        None => policy.recover(MovementError::MissingTarget { strategy, target }, None),
    }
}

/// Move straight at `target` with `speed`, landing on it instead of
/// overshooting. Within `arrive_distance` (or when coincident) the movable
/// stops.
pub(crate) fn steer_toward(
    movable: &mut dyn Movable,
    target: Vec2,
    speed: f32,
    arrive_distance: f32,
    dt: f32,
) {
    let to_target = target - movable.position();
    let distance = to_target.length();
    if distance <= arrive_distance.max(f32::EPSILON) {
        movable.set_velocity(Vec2::ZERO);
        return;
    }
    let velocity = to_target / distance * speed;
    if speed * dt >= distance {
        movable.set_velocity(velocity);
        movable.set_position(target);
    } else {
        integrate(movable, velocity, dt);
    }
}
