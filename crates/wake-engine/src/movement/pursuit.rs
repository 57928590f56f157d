//! Strategies that chase another entity.

use glam::Vec2;

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use crate::api::types::EntityId;
use super::{
    resolve_target, steer_toward, Movable, MovementStrategy, TargetSet, WorldView, COINCIDENT,
};

/// Default look-ahead cap for [`InterceptorMovement`], in seconds.
pub const DEFAULT_MAX_PREDICTION_TIME: f32 = 2.0;

// ---------------------------------------------------------------------------
// Follow
// ---------------------------------------------------------------------------

/// Head straight for the target at a fixed speed.
#[derive(Debug, Clone)]
pub struct FollowMovement {
    target: Option<EntityId>,
    speed: f32,
    arrive_distance: f32,
    policy: Policy,
}

impl FollowMovement {
    pub fn new(target: Option<EntityId>, speed: f32, policy: Policy) -> Result<Self, MovementError> {
        Ok(Self {
            target,
            speed: policy.non_negative("speed", speed)?,
            arrive_distance: 0.0,
            policy,
        })
    }

    /// Stop once within `distance` of the target.
    pub fn with_arrive_distance(mut self, distance: f32) -> Result<Self, MovementError> {
        self.arrive_distance = self.policy.non_negative("arrive_distance", distance)?;
        Ok(self)
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl MovementStrategy for FollowMovement {
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
        movable.set_speed(self.speed);
        steer_toward(movable, target.pos, self.speed, self.arrive_distance, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "follow"
    }
}

// ---------------------------------------------------------------------------
// Spring follow
// ---------------------------------------------------------------------------

/// Damped spring toward the target: `a = k·(target − pos) − damping·v`.
#[derive(Debug, Clone)]
pub struct SpringFollow {
    target: Option<EntityId>,
    stiffness: f32,
    damping: f32,
    policy: Policy,
}

impl SpringFollow {
    pub fn new(
        target: Option<EntityId>,
        stiffness: f32,
        damping: f32,
        policy: Policy,
    ) -> Result<Self, MovementError> {
        Ok(Self {
            target,
            stiffness: policy.non_negative("stiffness", stiffness)?,
            damping: policy.non_negative("damping", damping)?,
            policy,
        })
    }

    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }
}

impl MovementStrategy for SpringFollow {
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
        let pos = movable.position();
        let accel = self.stiffness * (target.pos - pos) - self.damping * movable.velocity();
        // Semi-implicit Euler: velocity first, then position with the new velocity.
        let velocity = movable.velocity() + accel * dt;
        movable.set_velocity(velocity);
        movable.set_position(pos + velocity * dt);
        movable.set_speed(velocity.length());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "spring_follow"
    }
}

// ---------------------------------------------------------------------------
// Interceptor
// ---------------------------------------------------------------------------

/// Lead pursuit: aim where the target will be after the time it would take
/// to reach its current position.
#[derive(Debug, Clone)]
pub struct InterceptorMovement {
    target: Option<EntityId>,
    speed: f32,
    max_prediction_time: f32,
    policy: Policy,
}

impl InterceptorMovement {
    pub fn new(target: Option<EntityId>, speed: f32, policy: Policy) -> Result<Self, MovementError> {
        Ok(Self {
            target,
            speed: policy.non_negative("speed", speed)?,
            max_prediction_time: DEFAULT_MAX_PREDICTION_TIME,
            policy,
        })
    }

    pub fn with_max_prediction_time(mut self, seconds: f32) -> Result<Self, MovementError> {
        self.max_prediction_time = self.policy.non_negative("max_prediction_time", seconds)?;
        Ok(self)
    }

    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }

    /// Point this interceptor would aim at from `from`.
    pub fn aim_point(&self, from: Vec2, target_pos: Vec2, target_velocity: Vec2) -> Vec2 {
        let lead = if self.speed > 0.0 {
            (from.distance(target_pos) / self.speed).min(self.max_prediction_time)
        } else {
            0.0
        };
        target_pos + target_velocity * lead
    }
}

impl MovementStrategy for InterceptorMovement {
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
        let aim = self.aim_point(movable.position(), target.pos, target.velocity);
        movable.set_speed(self.speed);
        steer_toward(movable, aim, self.speed, 0.0, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "interceptor"
    }
}

// ---------------------------------------------------------------------------
// Nearest target seek
// ---------------------------------------------------------------------------

/// Re-picks the closest candidate every tick and follows it.
#[derive(Debug, Clone)]
pub struct NearestTargetSeek {
    candidates: TargetSet,
    speed: f32,
    current: Option<EntityId>,
    policy: Policy,
}

impl NearestTargetSeek {
    pub fn new(candidates: TargetSet, speed: f32, policy: Policy) -> Result<Self, MovementError> {
        Ok(Self {
            candidates,
            speed: policy.non_negative("speed", speed)?,
            current: None,
            policy,
        })
    }

    /// Target chosen on the most recent call.
    pub fn current_target(&self) -> Option<EntityId> {
        self.current
    }

    pub fn candidates(&self) -> &TargetSet {
        &self.candidates
    }

    /// Nearest candidate to `from`; equal distances go to the smaller id.
    /// A candidate sitting on `from` is the seeker itself and is skipped.
    pub fn nearest(&self, from: Vec2, view: &WorldView) -> Option<(EntityId, Vec2)> {
        view.select(&self.candidates)
            .map(|(id, entry)| (id, entry.pos, from.distance_squared(entry.pos)))
            .filter(|(_, _, d2)| *d2 >= COINCIDENT * COINCIDENT)
            .min_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)))
            .map(|(id, pos, _)| (id, pos))
    }
}

impl MovementStrategy for NearestTargetSeek {
    fn apply(
        &mut self,
        movable: &mut dyn Movable,
        view: &WorldView,
        dt: f32,
    ) -> Result<(), MovementError> {
        let dt = self.policy.delta_time(dt)?;
        let Some((id, pos)) = self.nearest(movable.position(), view) else {
            self.current = None;
            let err = MovementError::MissingTarget { strategy: self.name(), target: None };
            return self.policy.recover(err, ());
        };
        self.current = Some(id);
        movable.set_speed(self.speed);
        steer_toward(movable, pos, self.speed, 0.0, dt);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "nearest_target_seek"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovableState;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn view_with(id: u32, pos: Vec2, velocity: Vec2) -> WorldView {
        WorldView::new().with_point(EntityId(id), "target", pos, velocity)
    }

    #[test]
    fn follow_moves_toward_target() {
        let view = view_with(1, Vec2::new(100.0, 0.0), Vec2::ZERO);
        let mut follow = FollowMovement::new(Some(EntityId(1)), 20.0, Policy::Strict).unwrap();
        let mut state = MovableState::default();
        follow.apply(&mut state, &view, 0.5).unwrap();
        assert_eq!(state.pos, Vec2::new(10.0, 0.0));
        assert_eq!(state.speed, 20.0);
    }

    #[test]
    fn follow_coincident_target_zero_velocity() {
        let view = view_with(1, Vec2::new(5.0, 5.0), Vec2::ZERO);
        let mut follow = FollowMovement::new(Some(EntityId(1)), 20.0, Policy::Strict).unwrap();
        let mut state = MovableState::at(Vec2::new(5.0, 5.0));
        follow.apply(&mut state, &view, 0.1).unwrap();
        assert_eq!(state.velocity, Vec2::ZERO);
        assert!(state.pos.is_finite());
    }

    #[test]
    fn follow_stops_inside_arrive_distance() {
        let view = view_with(1, Vec2::new(3.0, 0.0), Vec2::ZERO);
        let mut follow = FollowMovement::new(Some(EntityId(1)), 20.0, Policy::Strict)
            .unwrap()
            .with_arrive_distance(5.0)
            .unwrap();
        let mut state = MovableState::default();
        follow.apply(&mut state, &view, 0.1).unwrap();
        assert_eq!(state.pos, Vec2::ZERO);
    }

    #[test]
    fn missing_target_by_policy() {
        let view = view_with(1, Vec2::ONE, Vec2::ZERO);
        let mut state = MovableState::at(Vec2::new(2.0, 2.0));

        let mut strict = FollowMovement::new(Some(EntityId(9)), 10.0, Policy::Strict).unwrap();
        let err = strict.apply(&mut state, &view, 0.1).unwrap_err();
        assert_eq!(
            err,
            MovementError::MissingTarget { strategy: "follow", target: Some(EntityId(9)) }
        );

        let mut lenient = FollowMovement::new(None, 10.0, Policy::Lenient).unwrap();
        lenient.apply(&mut state, &view, 0.1).unwrap();
        assert_eq!(state.pos, Vec2::new(2.0, 2.0));

        let mut spring = SpringFollow::new(None, 1.0, 1.0, Policy::Strict).unwrap();
        assert!(spring.apply(&mut state, &view, 0.1).is_err());
    }

    #[test]
    fn spring_is_semi_implicit() {
        let view = view_with(1, Vec2::new(10.0, 0.0), Vec2::ZERO);
        let mut spring = SpringFollow::new(Some(EntityId(1)), 2.0, 0.5, Policy::Strict).unwrap();
        let mut state = MovableState::default().with_velocity(Vec2::new(4.0, 0.0));
        spring.apply(&mut state, &view, 0.1).unwrap();
        // a = 2·10 − 0.5·4 = 18; v = 4 + 1.8 = 5.8; x = 0.58
        assert!(approx(state.velocity.x, 5.8));
        assert!(approx(state.pos.x, 0.58));
        assert!(approx(state.speed, 5.8));
    }

    #[test]
    fn interceptor_leads_moving_target() {
        let view = view_with(1, Vec2::new(100.0, 0.0), Vec2::new(0.0, 10.0));
        let mut interceptor = InterceptorMovement::new(Some(EntityId(1)), 50.0, Policy::Strict).unwrap();
        // distance 100 at speed 50: two seconds of lead, 20 units up.
        let aim = interceptor.aim_point(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(0.0, 10.0));
        assert_eq!(aim, Vec2::new(100.0, 20.0));

        let mut state = MovableState::default();
        interceptor.apply(&mut state, &view, 0.1).unwrap();
        assert!(state.pos.y > 0.0);
        assert!(approx(state.pos.length(), 5.0));
    }

    #[test]
    fn interceptor_caps_prediction() {
        let interceptor = InterceptorMovement::new(None, 1.0, Policy::Strict)
            .unwrap()
            .with_max_prediction_time(0.5)
            .unwrap();
        let aim = interceptor.aim_point(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(10.0, 0.0));
        assert_eq!(aim, Vec2::new(105.0, 0.0));
    }

    #[test]
    fn nearest_target_picks_closest_then_lowest_id() {
        let view = WorldView::new()
            .with_point(EntityId(4), "trash", Vec2::new(10.0, 0.0), Vec2::ZERO)
            .with_point(EntityId(2), "trash", Vec2::new(-10.0, 0.0), Vec2::ZERO)
            .with_point(EntityId(3), "trash", Vec2::new(50.0, 0.0), Vec2::ZERO)
            .with_point(EntityId(1), "rock", Vec2::new(1.0, 0.0), Vec2::ZERO);
        let mut seek = NearestTargetSeek::new(TargetSet::tagged("trash"), 10.0, Policy::Strict).unwrap();
        let mut state = MovableState::default();
        seek.apply(&mut state, &view, 0.1).unwrap();
        assert_eq!(seek.current_target(), Some(EntityId(2)));
        assert_eq!(state.pos, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn seeker_in_its_own_set_skips_itself() {
        let view = WorldView::new()
            .with_point(EntityId(1), "trash", Vec2::ZERO, Vec2::ZERO)
            .with_point(EntityId(2), "trash", Vec2::new(50.0, 0.0), Vec2::ZERO);
        let mut seek = NearestTargetSeek::new(TargetSet::tagged("trash"), 10.0, Policy::Strict).unwrap();
        let mut state = MovableState::default();
        seek.apply(&mut state, &view, 0.5).unwrap();
        assert_eq!(seek.current_target(), Some(EntityId(2)));
        assert_eq!(state.pos, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn nearest_target_without_candidates() {
        let view = WorldView::new();
        let mut state = MovableState::default();
        let mut strict = NearestTargetSeek::new(TargetSet::tagged("trash"), 10.0, Policy::Strict).unwrap();
        assert!(strict.apply(&mut state, &view, 0.1).is_err());

        let mut lenient = NearestTargetSeek::new(TargetSet::tagged("trash"), 10.0, Policy::Lenient).unwrap();
        lenient.apply(&mut state, &view, 0.1).unwrap();
        assert_eq!(lenient.current_target(), None);
        assert_eq!(state.pos, Vec2::ZERO);
    }
}
