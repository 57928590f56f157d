//! Data-driven strategy construction.
//!
//! Games describe an entity's movement as JSON and build the strategy at
//! spawn time:
//!
//! ```json
//! { "kind": "ocean_current", "heading": "left", "speed": 30, "amplitude": 8, "frequency": 1.5 }
//! ```

use serde::{Deserialize, Serialize};

use crate::api::error::MovementError;
use crate::api::policy::Policy;
use crate::api::types::EntityId;
use super::presets::{self, AvoidanceParams};
use super::{
    AcceleratedMovement, CompositeMovement, ConstantMovement, Direction, FollowMovement,
    InterceptorMovement, MovementStrategy, NearestTargetSeek, ObstacleAvoidance, OrbitalMovement,
    RandomizedSwitching, SpiralApproach, SpringFollow, TargetSet, ZigZagMovement,
};

fn default_prediction() -> f32 {
    super::pursuit::DEFAULT_MAX_PREDICTION_TIME
}

/// One weighted child of a composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedConfig {
    pub strategy: StrategyConfig,
    #[serde(default = "WeightedConfig::default_weight")]
    pub weight: f32,
}

impl WeightedConfig {
    fn default_weight() -> f32 {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    Constant {
        speed: f32,
        #[serde(default)]
        heading: Option<Direction>,
    },
    #[serde(rename = "zigzag")]
    ZigZag {
        speed: f32,
        amplitude: f32,
        frequency: f32,
        #[serde(default)]
        heading: Option<Direction>,
    },
    Accelerated {
        max_speed: f32,
        acceleration: f32,
        deceleration: f32,
    },
    Follow {
        target: Option<EntityId>,
        speed: f32,
        #[serde(default)]
        arrive_distance: f32,
    },
    Orbital {
        target: Option<EntityId>,
        orbit_radius: f32,
        rotation_speed: f32,
        #[serde(default)]
        eccentricity: f32,
    },
    SpringFollow {
        target: Option<EntityId>,
        stiffness: f32,
        damping: f32,
    },
    Interceptor {
        target: Option<EntityId>,
        speed: f32,
        #[serde(default = "default_prediction")]
        max_prediction_time: f32,
    },
    ObstacleAvoidance {
        obstacles: TargetSet,
        detection_radius: f32,
        strength: f32,
    },
    SpiralApproach {
        target: Option<EntityId>,
        angular_speed: f32,
        approach_speed: f32,
        min_radius: f32,
    },
    RandomizedSwitching {
        pool: Vec<StrategyConfig>,
        min_duration: f32,
        max_duration: f32,
        #[serde(default)]
        seed: u64,
    },
    NearestTargetSeek {
        candidates: TargetSet,
        speed: f32,
    },
    Composite {
        children: Vec<WeightedConfig>,
    },
    OceanCurrent {
        heading: Direction,
        speed: f32,
        amplitude: f32,
        frequency: f32,
        #[serde(default)]
        weights: Option<[f32; 2]>,
    },
    InterceptorWithAvoidance {
        target: Option<EntityId>,
        speed: f32,
        obstacles: TargetSet,
        detection_radius: f32,
        strength: f32,
        #[serde(default)]
        weights: Option<[f32; 2]>,
    },
    TrashCollector {
        trash: TargetSet,
        speed: f32,
        obstacles: TargetSet,
        detection_radius: f32,
        strength: f32,
        #[serde(default)]
        weights: Option<[f32; 2]>,
    },
}

impl StrategyConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate every parameter under `policy` and build the strategy.
    pub fn build(&self, policy: Policy) -> Result<Box<dyn MovementStrategy>, MovementError> {
        let strategy: Box<dyn MovementStrategy> = match self {
            StrategyConfig::Constant { speed, heading } => {
                let mut s = ConstantMovement::new(*speed, policy)?;
                if let Some(h) = heading {
                    s = s.with_heading(*h);
                }
                Box::new(s)
            }
            StrategyConfig::ZigZag { speed, amplitude, frequency, heading } => {
                let mut s = ZigZagMovement::new(*speed, *amplitude, *frequency, policy)?;
                if let Some(h) = heading {
                    s = s.with_heading(*h);
                }
                Box::new(s)
            }
            StrategyConfig::Accelerated { max_speed, acceleration, deceleration } => Box::new(
                AcceleratedMovement::new(*max_speed, *acceleration, *deceleration, policy)?,
            ),
            StrategyConfig::Follow { target, speed, arrive_distance } => Box::new(
                FollowMovement::new(*target, *speed, policy)?.with_arrive_distance(*arrive_distance)?,
            ),
            StrategyConfig::Orbital { target, orbit_radius, rotation_speed, eccentricity } => Box::new(
                OrbitalMovement::new(*target, *orbit_radius, *rotation_speed, policy)?
                    .with_eccentricity(*eccentricity)?,
            ),
            StrategyConfig::SpringFollow { target, stiffness, damping } => {
                Box::new(SpringFollow::new(*target, *stiffness, *damping, policy)?)
            }
            StrategyConfig::Interceptor { target, speed, max_prediction_time } => Box::new(
                InterceptorMovement::new(*target, *speed, policy)?
                    .with_max_prediction_time(*max_prediction_time)?,
            ),
            StrategyConfig::ObstacleAvoidance { obstacles, detection_radius, strength } => Box::new(
                ObstacleAvoidance::new(obstacles.clone(), *detection_radius, *strength, policy)?,
            ),
            StrategyConfig::SpiralApproach { target, angular_speed, approach_speed, min_radius } => {
                Box::new(SpiralApproach::new(
                    *target,
                    *angular_speed,
                    *approach_speed,
                    *min_radius,
                    policy,
                )?)
            }
            StrategyConfig::RandomizedSwitching { pool, min_duration, max_duration, seed } => {
                let pool = pool
                    .iter()
                    .map(|c| c.build(policy))
                    .collect::<Result<Vec<_>, _>>()?;
                Box::new(RandomizedSwitching::new(pool, *min_duration, *max_duration, *seed, policy)?)
            }
            StrategyConfig::NearestTargetSeek { candidates, speed } => {
                Box::new(NearestTargetSeek::new(candidates.clone(), *speed, policy)?)
            }
            StrategyConfig::Composite { children } => {
                let strategies = children
                    .iter()
                    .map(|c| c.strategy.build(policy))
                    .collect::<Result<Vec<_>, _>>()?;
                let weights: Vec<f32> = children.iter().map(|c| c.weight).collect();
                Box::new(CompositeMovement::with_strategies(strategies, &weights, policy)?)
            }
            StrategyConfig::OceanCurrent { heading, speed, amplitude, frequency, weights } => {
                Box::new(presets::ocean_current(
                    *heading,
                    *speed,
                    *amplitude,
                    *frequency,
                    weights.unwrap_or(presets::OCEAN_CURRENT_WEIGHTS),
                    policy,
                )?)
            }
            StrategyConfig::InterceptorWithAvoidance {
                target,
                speed,
                obstacles,
                detection_radius,
                strength,
                weights,
            } => Box::new(presets::interceptor_with_avoidance(
                *target,
                *speed,
                AvoidanceParams {
                    obstacles: obstacles.clone(),
                    detection_radius: *detection_radius,
                    strength: *strength,
                },
                weights.unwrap_or(presets::INTERCEPTOR_WITH_AVOIDANCE_WEIGHTS),
                policy,
            )?),
            StrategyConfig::TrashCollector {
                trash,
                speed,
                obstacles,
                detection_radius,
                strength,
                weights,
            } => Box::new(presets::trash_collector(
                trash.clone(),
                *speed,
                AvoidanceParams {
                    obstacles: obstacles.clone(),
                    detection_radius: *detection_radius,
                    strength: *strength,
                },
                weights.unwrap_or(presets::TRASH_COLLECTOR_WEIGHTS),
                policy,
            )?),
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_json() {
        let config = StrategyConfig::from_json(
            r#"{ "kind": "ocean_current", "heading": "left", "speed": 30, "amplitude": 8, "frequency": 1.5 }"#,
        )
        .unwrap();
        let strategy = config.build(Policy::Strict).unwrap();
        assert_eq!(strategy.name(), "composite");
    }

    #[test]
    fn nested_composite() {
        let json = r#"{
            "kind": "composite",
            "children": [
                { "strategy": { "kind": "zigzag", "speed": 10, "amplitude": 2, "frequency": 1 }, "weight": 2 },
                { "strategy": { "kind": "randomized_switching", "min_duration": 0.5, "max_duration": 1.0,
                    "pool": [ { "kind": "constant", "speed": 5 }, { "kind": "accelerated",
                    "max_speed": 10, "acceleration": 5, "deceleration": 5 } ] } }
            ]
        }"#;
        let config = StrategyConfig::from_json(json).unwrap();
        assert!(config.build(Policy::Strict).is_ok());
    }

    #[test]
    fn validation_runs_at_build() {
        let config = StrategyConfig::Follow { target: Some(EntityId(1)), speed: -3.0, arrive_distance: 0.0 };
        assert!(matches!(
            config.build(Policy::Strict),
            Err(MovementError::NegativeValue { field: "speed", .. })
        ));
        assert!(config.build(Policy::Lenient).is_ok());
    }

    #[test]
    fn unknown_kind_is_a_json_error() {
        assert!(StrategyConfig::from_json(r#"{ "kind": "teleport" }"#).is_err());
    }

    #[test]
    fn target_sets_deserialize() {
        let config = StrategyConfig::from_json(
            r#"{ "kind": "nearest_target_seek", "candidates": { "ids": [4, 2] }, "speed": 12 }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            StrategyConfig::NearestTargetSeek {
                candidates: TargetSet::Ids(vec![EntityId(4), EntityId(2)]),
                speed: 12.0,
            }
        );
    }
}
