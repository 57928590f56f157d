//! Ready-made composites used by the boat game's entities.

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use crate::api::types::EntityId;
use super::{
    CompositeMovement, ConstantMovement, Direction, InterceptorMovement, MovementStrategy,
    NearestTargetSeek, ObstacleAvoidance, TargetSet, ZigZagMovement,
};

pub const OCEAN_CURRENT_WEIGHTS: [f32; 2] = [0.7, 0.3];
pub const INTERCEPTOR_WITH_AVOIDANCE_WEIGHTS: [f32; 2] = [0.75, 0.25];
pub const TRASH_COLLECTOR_WEIGHTS: [f32; 2] = [0.7, 0.3];

/// How a preset steers around obstacles.
#[derive(Debug, Clone, PartialEq)]
pub struct AvoidanceParams {
    pub obstacles: TargetSet,
    pub detection_radius: f32,
    pub strength: f32,
}

/// Drifting debris: a steady push along `heading` with a sideways sway.
pub fn ocean_current(
    heading: Direction,
    speed: f32,
    amplitude: f32,
    frequency: f32,
    weights: [f32; 2],
    policy: Policy,
) -> Result<CompositeMovement, MovementError> {
    let drift = ConstantMovement::new(speed, policy)?.with_heading(heading);
    let sway = ZigZagMovement::new(speed, amplitude, frequency, policy)?.with_heading(heading);
    CompositeMovement::with_strategies(
        vec![Box::new(drift) as Box<dyn MovementStrategy>, Box::new(sway)],
        &weights,
        policy,
    )
}

/// Lead pursuit of one target that still steers around obstacles.
pub fn interceptor_with_avoidance(
    target: Option<EntityId>,
    speed: f32,
    avoidance: AvoidanceParams,
    weights: [f32; 2],
    policy: Policy,
) -> Result<CompositeMovement, MovementError> {
    let chase = InterceptorMovement::new(target, speed, policy)?;
    let avoid = ObstacleAvoidance::new(
        avoidance.obstacles,
        avoidance.detection_radius,
        avoidance.strength,
        policy,
    )?;
    CompositeMovement::with_strategies(
        vec![Box::new(chase) as Box<dyn MovementStrategy>, Box::new(avoid)],
        &weights,
        policy,
    )
}

/// Heads for the nearest piece of trash while avoiding obstacles.
pub fn trash_collector(
    trash: TargetSet,
    speed: f32,
    avoidance: AvoidanceParams,
    weights: [f32; 2],
    policy: Policy,
) -> Result<CompositeMovement, MovementError> {
    let seek = NearestTargetSeek::new(trash, speed, policy)?;
    let avoid = ObstacleAvoidance::new(
        avoidance.obstacles,
        avoidance.detection_radius,
        avoidance.strength,
        policy,
    )?;
    CompositeMovement::with_strategies(
        vec![Box::new(seek) as Box<dyn MovementStrategy>, Box::new(avoid)],
        &weights,
        policy,
    )
}
