use std::collections::HashMap;
use serde::{Deserialize, Serialize};

pub const PIXELS_TO_METERS: &str = "PIXELS_TO_METERS";
pub const COLLISION_ACTIVE_DURATION: &str = "COLLISION_ACTIVE_DURATION";
pub const WORLD_WIDTH: &str = "WORLD_WIDTH";
pub const WORLD_HEIGHT: &str = "WORLD_HEIGHT";
pub const MAX_CORRECTION: &str = "MAX_CORRECTION";
pub const MAX_BODY_SPEED: &str = "MAX_BODY_SPEED";
pub const FIXED_DT: &str = "FIXED_DT";

/// Read-only table of named numeric constants (entity sizes, scales, timings).
/// Loaded once from JSON and resolved into typed config at construction;
/// nothing in the tick reads it by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constants {
    values: HashMap<String, f64>,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flat `{ "NAME": number }` object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.get_f64(name).map(|v| v as f32)
    }

    pub fn get_or(&self, name: &str, default: f32) -> f32 {
        self.get(name).unwrap_or(default)
    }

    /// Full-precision read, for durations compared against the f64 clock.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn get_f64_or(&self, name: &str, default: f64) -> f64 {
        self.get_f64(name).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flat_table() {
        let json = r#"{ "PIXELS_TO_METERS": 0.015625, "BOAT_WIDTH": 48 }"#;
        let constants = Constants::from_json(json).unwrap();
        assert_eq!(constants.len(), 2);
        assert_eq!(constants.get(PIXELS_TO_METERS), Some(0.015625));
        assert_eq!(constants.get_or("BOAT_WIDTH", 0.0), 48.0);
        assert_eq!(constants.get_or("ROCK_WIDTH", 32.0), 32.0);
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert!(Constants::from_json(r#"{ "PIXELS_TO_METERS": "small" }"#).is_err());
    }
}
