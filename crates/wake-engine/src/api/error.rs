use thiserror::Error;

use crate::api::types::EntityId;

/// Errors raised by movement strategies and the movement manager.
///
/// In lenient mode most of these are logged and recovered from instead of
/// being returned; see [`Policy`](crate::api::policy::Policy).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovementError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeValue { field: &'static str, value: f32 },
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },
    #[error("{field} = {value} is outside [{min}, {max})")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{field} range is inverted: min {min} > max {max}")]
    InvalidRange { field: &'static str, min: f32, max: f32 },
    #[error("{strategy}: target {target:?} is not present in the world")]
    MissingTarget {
        strategy: &'static str,
        target: Option<EntityId>,
    },
    #[error("{strategy} has no strategies to run")]
    EmptyPool { strategy: &'static str },
    #[error("expected {expected} weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },
    #[error("index {index} out of range for {len} strategies")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no child strategy named {name}")]
    UnknownStrategy { name: String },
    #[error("cannot remove the last remaining strategy")]
    ProtectedStrategy,
    #[error("child strategy #{index} failed: {source}")]
    Child {
        index: usize,
        #[source]
        source: Box<MovementError>,
    },
}

/// Errors raised on the reconciliation path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollisionError {
    #[error("physics body of entity {0} no longer exists")]
    StaleBody(EntityId),
    #[error("entity {0} is not known to the simulation")]
    UnknownEntity(EntityId),
}
