use crate::api::error::MovementError;
use crate::api::policy::Policy;
use crate::core::rng::Rng;
use super::{Movable, MovementStrategy, WorldView};

/// Runs a uniformly chosen strategy from a pool for a random duration in
/// `[min_duration, max_duration]`, then picks again.
pub struct RandomizedSwitching {
    pool: Vec<Box<dyn MovementStrategy>>,
    min_duration: f32,
    max_duration: f32,
    rng: Rng,
    active: Option<usize>,
    remaining: f32,
    policy: Policy,
}

impl RandomizedSwitching {
    pub fn new(
        pool: Vec<Box<dyn MovementStrategy>>,
        min_duration: f32,
        max_duration: f32,
        seed: u64,
        policy: Policy,
    ) -> Result<Self, MovementError> {
        let (min_duration, max_duration) = policy.range("duration", min_duration, max_duration)?;
        Ok(Self {
            pool,
            min_duration,
            max_duration,
            rng: Rng::new(seed),
            active: None,
            remaining: 0.0,
            policy,
        })
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn MovementStrategy>) {
        self.pool.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Index of the strategy currently running, if one was picked.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Seconds left before the next pick.
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn durations(&self) -> (f32, f32) {
        (self.min_duration, self.max_duration)
    }

    fn pick(&mut self) -> usize {
        let index = self.rng.next_index(self.pool.len());
        self.remaining = self.rng.range(self.min_duration, self.max_duration);
        self.active = Some(index);
        log::trace!(
            "randomized switching picked {} for {:.2}s",
            self.pool[index].name(),
            self.remaining
        );
        index
    }
}

impl MovementStrategy for RandomizedSwitching {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        if self.pool.is_empty() {
            self.active = None;
            let err = MovementError::EmptyPool { strategy: self.name() };
            return self.policy.recover(err, ());
        }
        let index = match self.active {
            Some(index) if self.remaining > 0.0 && index < self.pool.len() => index,
            _ => self.pick(),
        };
        self.pool[index].apply(movable, view, dt)?;
        self.remaining -= dt;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "randomized_switching"
    }

    fn supports_halt(&self) -> bool {
        self.pool.iter().any(|s| s.supports_halt())
    }

    fn halt(&mut self) {
        if let Some(strategy) = self.active.and_then(|i| self.pool.get_mut(i)) {
            strategy.halt();
        }
    }

    fn resume(&mut self) {
        if let Some(strategy) = self.active.and_then(|i| self.pool.get_mut(i)) {
            strategy.resume();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{ConstantMovement, Direction, MovableState};
    use glam::Vec2;

    fn pool() -> Vec<Box<dyn MovementStrategy>> {
        vec![
            Box::new(
                ConstantMovement::new(10.0, Policy::Strict)
                    .unwrap()
                    .with_heading(Direction::Right),
            ),
            Box::new(
                ConstantMovement::new(10.0, Policy::Strict)
                    .unwrap()
                    .with_heading(Direction::Up),
            ),
        ]
    }

    #[test]
    fn same_seed_same_path() {
        let view = WorldView::new();
        let mut a = RandomizedSwitching::new(pool(), 0.1, 0.3, 99, Policy::Strict).unwrap();
        let mut b = RandomizedSwitching::new(pool(), 0.1, 0.3, 99, Policy::Strict).unwrap();
        let mut sa = MovableState::default();
        let mut sb = MovableState::default();
        for _ in 0..120 {
            a.apply(&mut sa, &view, 1.0 / 60.0).unwrap();
            b.apply(&mut sb, &view, 1.0 / 60.0).unwrap();
        }
        assert_eq!(sa.pos, sb.pos);
    }

    #[test]
    fn holds_choice_for_duration() {
        let view = WorldView::new();
        let mut random = RandomizedSwitching::new(pool(), 1.0, 1.0, 5, Policy::Strict).unwrap();
        let mut state = MovableState::default();
        random.apply(&mut state, &view, 0.25).unwrap();
        let first = random.active();
        assert!(first.is_some());
        for _ in 0..3 {
            random.apply(&mut state, &view, 0.25).unwrap();
            assert_eq!(random.active(), first);
        }
        assert!(random.remaining() <= 0.0);
    }

    #[test]
    fn empty_pool_by_policy() {
        let view = WorldView::new();
        let mut state = MovableState::at(Vec2::ONE);
        let mut strict = RandomizedSwitching::new(Vec::new(), 0.1, 0.2, 1, Policy::Strict).unwrap();
        assert_eq!(
            strict.apply(&mut state, &view, 0.1),
            Err(MovementError::EmptyPool { strategy: "randomized_switching" })
        );
        let mut lenient = RandomizedSwitching::new(Vec::new(), 0.1, 0.2, 1, Policy::Lenient).unwrap();
        lenient.apply(&mut state, &view, 0.1).unwrap();
        assert_eq!(state.pos, Vec2::ONE);
    }

    #[test]
    fn inverted_durations_by_policy() {
        assert!(RandomizedSwitching::new(pool(), 2.0, 1.0, 1, Policy::Strict).is_err());
        let lenient = RandomizedSwitching::new(pool(), 2.0, 1.0, 1, Policy::Lenient).unwrap();
        assert_eq!(lenient.durations(), (1.0, 2.0));
    }
}
