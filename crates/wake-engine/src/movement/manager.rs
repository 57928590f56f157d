use glam::Vec2;

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use crate::api::types::EntityId;
use crate::input::queue::PressedKeys;
use super::{Direction, Movable, MovableState, MovementStrategy, WorldView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementState {
    #[default]
    Active,
    Stopped,
}

/// Owns the authoritative logical kinematics of one entity and the strategy
/// that drives them.
///
/// The position held here is what the entity *wants*; reconciliation decides
/// how much of it survives contact with the physics world.
pub struct MovementManager {
    entity: EntityId,
    kinematics: MovableState,
    strategy: Box<dyn MovementStrategy>,
    state: MovementState,
    policy: Policy,
}

impl MovementManager {
    pub fn new(entity: EntityId, pos: Vec2, strategy: Box<dyn MovementStrategy>, policy: Policy) -> Self {
        Self {
            entity,
            kinematics: MovableState::at(pos),
            strategy,
            state: MovementState::Active,
            policy,
        }
    }

    /// Advance one tick. Lenient managers log strategy failures and leave
    /// the kinematics as they were before the tick.
    pub fn update_movement(&mut self, view: &WorldView, dt: f32) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        if self.state == MovementState::Stopped {
            self.kinematics.velocity = Vec2::ZERO;
            return Ok(());
        }
        let before = self.kinematics;
        match self.strategy.apply(&mut self.kinematics, view, dt) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.kinematics = before;
                log::debug!("entity {} skipped a {} frame", self.entity, self.strategy.name());
                self.policy.recover(err, ())
            }
        }
    }

    /// Derive the direction from the currently pressed keys.
    pub fn update_direction(&mut self, keys: &PressedKeys) {
        self.kinematics.direction = Direction::from_keys(keys);
    }

    pub fn stop(&mut self) {
        self.state = MovementState::Stopped;
        self.kinematics.direction = Direction::None;
        self.kinematics.velocity = Vec2::ZERO;
        if self.strategy.supports_halt() {
            self.strategy.halt();
        }
    }

    pub fn resume(&mut self) {
        self.state = MovementState::Active;
        if self.strategy.supports_halt() {
            self.strategy.resume();
        }
    }

    /// Swap the strategy, returning the previous one.
    pub fn set_strategy(&mut self, strategy: Box<dyn MovementStrategy>) -> Box<dyn MovementStrategy> {
        log::debug!("entity {} strategy {} -> {}", self.entity, self.strategy.name(), strategy.name());
        std::mem::replace(&mut self.strategy, strategy)
    }

    pub fn strategy(&self) -> &dyn MovementStrategy {
        self.strategy.as_ref()
    }

    pub fn strategy_mut(&mut self) -> &mut dyn MovementStrategy {
        self.strategy.as_mut()
    }

    /// Validated speed setter; see [`Policy::non_negative`].
    pub fn try_set_speed(&mut self, speed: f32) -> Result<(), MovementError> {
        let speed = self.policy.non_negative("speed", speed)?;
        self.kinematics.speed = speed;
        Ok(())
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == MovementState::Active
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.kinematics.direction = direction;
    }

    pub fn kinematics(&self) -> &MovableState {
        &self.kinematics
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }
}

impl Movable for MovementManager {
    fn position(&self) -> Vec2 {
        self.kinematics.pos
    }

    fn set_position(&mut self, pos: Vec2) {
        self.kinematics.pos = pos;
    }

    fn velocity(&self) -> Vec2 {
        self.kinematics.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.kinematics.velocity = velocity;
    }

    fn speed(&self) -> f32 {
        self.kinematics.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.kinematics.set_speed(speed);
    }

    fn direction(&self) -> Direction {
        self.kinematics.direction
    }
}
