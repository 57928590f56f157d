use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::constants::{self, Constants};
use crate::api::policy::Policy;

/// Simulation configuration. Every field has a default, so partial JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Playable area width in logical units (pixels).
    pub world_width: f32,
    /// Playable area height in logical units (pixels).
    pub world_height: f32,
    /// Logical units → physics units. Power of two: conversions round-trip exactly.
    pub pixels_to_meters: f32,
    /// Seconds a collidable stays "in collision" after its last contact.
    pub collision_active_duration: f64,
    /// Largest per-frame displacement pulled from physics while in collision.
    pub max_correction: f32,
    /// Body speed cap (logical units/s) applied when a correction is capped.
    pub max_body_speed: f32,
    /// Distance from an edge that already counts as touching it.
    pub boundary_epsilon: f32,
    /// Largest per-frame move away from a touched edge.
    pub escape_nudge: f32,
    /// Linear damping while pressed against the boundary.
    pub boundary_damping: f32,
    /// Linear damping during free movement.
    pub linear_damping: f32,
    /// Factor applied to the movement manager's velocity each in-collision frame.
    pub collision_velocity_decay: f32,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    /// Physics gravity in logical units/s². Top-down water: zero.
    pub gravity: Vec2,
    pub policy: Policy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 800.0,
            world_height: 600.0,
            pixels_to_meters: 1.0 / 64.0,
            collision_active_duration: 0.3,
            max_correction: 10.0,
            max_body_speed: 400.0,
            boundary_epsilon: 2.0,
            escape_nudge: 4.0,
            boundary_damping: 0.1,
            linear_damping: 2.0,
            collision_velocity_decay: 0.5,
            velocity_iterations: 6,
            position_iterations: 2,
            gravity: Vec2::ZERO,
            policy: Policy::default(),
        }
    }
}

impl SimConfig {
    /// Resolve the named constants once; missing names keep their defaults.
    pub fn from_constants(table: &Constants) -> Self {
        let d = Self::default();
        Self {
            fixed_dt: table.get_or(constants::FIXED_DT, d.fixed_dt),
            world_width: table.get_or(constants::WORLD_WIDTH, d.world_width),
            world_height: table.get_or(constants::WORLD_HEIGHT, d.world_height),
            pixels_to_meters: table.get_or(constants::PIXELS_TO_METERS, d.pixels_to_meters),
            collision_active_duration: table
                .get_f64_or(constants::COLLISION_ACTIVE_DURATION, d.collision_active_duration),
            max_correction: table.get_or(constants::MAX_CORRECTION, d.max_correction),
            max_body_speed: table.get_or(constants::MAX_BODY_SPEED, d.max_body_speed),
            ..d
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
