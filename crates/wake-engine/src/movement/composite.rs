//! Weighted blend of several strategies.

use glam::Vec2;

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use super::{Movable, MovableState, MovementStrategy, WorldView};

/// Sums below this are treated as "all weights are zero".
const WEIGHT_EPSILON: f32 = 1e-6;

struct Entry {
    strategy: Box<dyn MovementStrategy>,
    weight: f32,
}

/// Runs every child from the same snapshot and blends the results.
///
/// Each child sees the movable exactly as it was before the tick, so the
/// outcome does not depend on child order. The final position is
/// `original + Σ wᵢ·(posᵢ − original)` and the final velocity `Σ wᵢ·velᵢ`.
/// Weights are kept normalized to sum to 1. Index 0 is the base strategy.
pub struct CompositeMovement {
    entries: Vec<Entry>,
    policy: Policy,
}

impl CompositeMovement {
    pub fn new(base: Box<dyn MovementStrategy>, policy: Policy) -> Self {
        Self {
            entries: vec![Entry { strategy: base, weight: 1.0 }],
            policy,
        }
    }

    /// Build from parallel lists. A count mismatch is an error in strict
    /// mode; lenient mode pads missing weights with 1.0 and drops extras.
    pub fn with_strategies(
        strategies: Vec<Box<dyn MovementStrategy>>,
        weights: &[f32],
        policy: Policy,
    ) -> Result<Self, MovementError> {
        if strategies.is_empty() {
            return Err(MovementError::EmptyPool { strategy: "composite" });
        }
        if strategies.len() != weights.len() {
            let err = MovementError::WeightCount {
                expected: strategies.len(),
                actual: weights.len(),
            };
            policy.recover(err, ())?;
        }
        let entries = strategies
            .into_iter()
            .enumerate()
            .map(|(i, strategy)| Entry {
                strategy,
                weight: weights.get(i).copied().unwrap_or(1.0),
            })
            .collect();
        let mut composite = Self { entries, policy };
        composite.normalize();
        Ok(composite)
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn MovementStrategy>, weight: f32) {
        self.entries.push(Entry { strategy, weight });
        self.normalize();
    }

    /// Change one weight, then renormalize all of them.
    pub fn set_weight(&mut self, index: usize, weight: f32) -> Result<(), MovementError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(MovementError::IndexOutOfRange { index, len })?;
        entry.weight = weight;
        self.normalize();
        Ok(())
    }

    pub fn weight(&self, index: usize) -> Option<f32> {
        self.entries.get(index).map(|e| e.weight)
    }

    pub fn weights(&self) -> Vec<f32> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    /// Remove and return a child. The last remaining child is protected.
    pub fn remove_strategy(&mut self, index: usize) -> Result<Box<dyn MovementStrategy>, MovementError> {
        let len = self.entries.len();
        if index >= len {
            return Err(MovementError::IndexOutOfRange { index, len });
        }
        if len < 2 {
            return Err(MovementError::ProtectedStrategy);
        }
        let removed = self.entries.remove(index);
        self.normalize();
        Ok(removed.strategy)
    }

    /// Remove the first child whose [`name`](MovementStrategy::name) matches.
    pub fn remove_named(&mut self, name: &str) -> Result<Box<dyn MovementStrategy>, MovementError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.strategy.name() == name)
            .ok_or_else(|| MovementError::UnknownStrategy { name: name.to_string() })?;
        self.remove_strategy(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn child_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.strategy.name()).collect()
    }

    fn normalize(&mut self) {
        for entry in &mut self.entries {
            entry.weight = if entry.weight.is_finite() { entry.weight.abs() } else { 0.0 };
        }
        let sum: f32 = self.entries.iter().map(|e| e.weight).sum();
        if sum < WEIGHT_EPSILON {
            let equal = 1.0 / self.entries.len().max(1) as f32;
            for entry in &mut self.entries {
                entry.weight = equal;
            }
        } else {
            for entry in &mut self.entries {
                entry.weight /= sum;
            }
        }
    }
}

impl MovementStrategy for CompositeMovement {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        let original = MovableState::snapshot(movable);
        let mut displacement = Vec2::ZERO;
        let mut velocity = Vec2::ZERO;

        for (index, entry) in self.entries.iter_mut().enumerate() {
            let mut scratch = original;
            entry
                .strategy
                .apply(&mut scratch, view, dt)
                .map_err(|source| MovementError::Child { index, source: Box::new(source) })?;
            displacement += (scratch.pos - original.pos) * entry.weight;
            velocity += scratch.velocity * entry.weight;
        }

        movable.set_position(original.pos + displacement);
        movable.set_velocity(velocity);
        movable.set_speed(velocity.length());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "composite"
    }

    fn supports_halt(&self) -> bool {
        self.entries.iter().any(|e| e.strategy.supports_halt())
    }

    fn halt(&mut self) {
        for entry in &mut self.entries {
            if entry.strategy.supports_halt() {
                entry.strategy.halt();
            }
        }
    }

    fn resume(&mut self) {
        for entry in &mut self.entries {
            if entry.strategy.supports_halt() {
                entry.strategy.resume();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntityId;
    use crate::movement::{ConstantMovement, Direction, FollowMovement};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn constant(speed: f32, heading: Direction) -> Box<dyn MovementStrategy> {
        Box::new(
            ConstantMovement::new(speed, Policy::Strict)
                .unwrap()
                .with_heading(heading),
        )
    }

    #[test]
    fn weights_are_normalized() {
        let composite = CompositeMovement::with_strategies(
            vec![constant(1.0, Direction::Up), constant(1.0, Direction::Left)],
            &[3.0, 1.0],
            Policy::Strict,
        )
        .unwrap();
        assert_eq!(composite.weights(), vec![0.75, 0.25]);
    }

    #[test]
    fn negative_and_zero_weights() {
        let abs = CompositeMovement::with_strategies(
            vec![constant(1.0, Direction::Up), constant(1.0, Direction::Left)],
            &[-1.0, 3.0],
            Policy::Strict,
        )
        .unwrap();
        assert_eq!(abs.weights(), vec![0.25, 0.75]);

        let zero = CompositeMovement::with_strategies(
            vec![constant(1.0, Direction::Up), constant(1.0, Direction::Left)],
            &[0.0, 0.0],
            Policy::Strict,
        )
        .unwrap();
        assert_eq!(zero.weights(), vec![0.5, 0.5]);
    }

    #[test]
    fn weight_count_mismatch() {
        let strict = CompositeMovement::with_strategies(
            vec![constant(1.0, Direction::Up), constant(1.0, Direction::Left)],
            &[1.0],
            Policy::Strict,
        );
        assert!(matches!(strict, Err(MovementError::WeightCount { expected: 2, actual: 1 })));

        let lenient = CompositeMovement::with_strategies(
            vec![constant(1.0, Direction::Up), constant(1.0, Direction::Left)],
            &[3.0],
            Policy::Lenient,
        )
        .unwrap();
        assert_eq!(lenient.weights(), vec![0.75, 0.25]);
    }

    #[test]
    fn blend_is_order_independent() {
        let view = WorldView::new();
        let start = MovableState::at(Vec2::new(10.0, 10.0));

        let mut forward = CompositeMovement::with_strategies(
            vec![constant(40.0, Direction::Right), constant(20.0, Direction::Up)],
            &[0.75, 0.25],
            Policy::Strict,
        )
        .unwrap();
        let mut reversed = CompositeMovement::with_strategies(
            vec![constant(20.0, Direction::Up), constant(40.0, Direction::Right)],
            &[0.25, 0.75],
            Policy::Strict,
        )
        .unwrap();

        let mut a = start;
        let mut b = start;
        forward.apply(&mut a, &view, 0.5).unwrap();
        reversed.apply(&mut b, &view, 0.5).unwrap();

        assert!(approx(a.pos.x, b.pos.x) && approx(a.pos.y, b.pos.y));
        assert!(approx(a.pos.x, 25.0));
        assert!(approx(a.pos.y, 12.5));
        assert!(approx(a.velocity.x, 30.0));
        assert!(approx(a.velocity.y, 5.0));
    }

    #[test]
    fn set_weight_renormalizes() {
        let mut composite = CompositeMovement::new(constant(1.0, Direction::Up), Policy::Strict);
        composite.add_strategy(constant(1.0, Direction::Down), 1.0);
        assert_eq!(composite.weights(), vec![0.5, 0.5]);
        composite.set_weight(0, 1.5).unwrap();
        assert_eq!(composite.weight(0), Some(0.75));
        assert_eq!(
            composite.set_weight(4, 1.0),
            Err(MovementError::IndexOutOfRange { index: 4, len: 2 })
        );
    }

    #[test]
    fn last_strategy_is_protected() {
        let mut composite = CompositeMovement::new(constant(1.0, Direction::Up), Policy::Strict);
        composite.add_strategy(constant(1.0, Direction::Down), 1.0);
        assert!(composite.remove_strategy(1).is_ok());
        assert_eq!(composite.weights(), vec![1.0]);
        assert!(matches!(composite.remove_strategy(0), Err(MovementError::ProtectedStrategy)));
        assert_eq!(composite.len(), 1);
    }

    #[test]
    fn remove_by_name() {
        let follow = FollowMovement::new(None, 1.0, Policy::Strict).unwrap();
        let mut composite = CompositeMovement::new(constant(1.0, Direction::Up), Policy::Strict);
        composite.add_strategy(Box::new(follow), 1.0);
        let removed = composite.remove_named("follow").unwrap();
        assert_eq!(removed.name(), "follow");
        assert_eq!(composite.child_names(), vec!["constant"]);
        assert_eq!(
            composite.remove_named("zigzag").err(),
            Some(MovementError::UnknownStrategy { name: "zigzag".into() })
        );
    }

    #[test]
    fn child_error_names_index() {
        let follow = FollowMovement::new(Some(EntityId(3)), 1.0, Policy::Strict).unwrap();
        let mut composite = CompositeMovement::with_strategies(
            vec![constant(1.0, Direction::Up), Box::new(follow)],
            &[1.0, 1.0],
            Policy::Strict,
        )
        .unwrap();
        let mut state = MovableState::default();
        let err = composite.apply(&mut state, &WorldView::new(), 0.1).unwrap_err();
        assert!(matches!(err, MovementError::Child { index: 1, .. }));
        assert_eq!(state.pos, Vec2::ZERO);
    }
}
