//! Per-frame agreement between logical positions and physics bodies.
//!
//! Each collidable has up to three positions: the entity's (what is drawn),
//! the body's (what physics simulates, in physics units) and the movement
//! manager's (what the entity wants). After a physics step exactly one of
//! them is authoritative:
//!
//! | case          | authority        | writes                               |
//! |---------------|------------------|--------------------------------------|
//! | no manager    | body             | entity                               |
//! | boundary      | clamped manager  | entity, body, manager (identical)    |
//! | in collision  | body, capped     | entity, manager (body if capped)     |
//! | free          | manager          | entity, body position + velocity     |

use glam::Vec2;

use crate::api::config::SimConfig;
use crate::api::error::CollisionError;
use crate::components::entity::Entity;
use crate::core::physics::PhysicsWorld;
use crate::movement::{Movable, MovementManager};
use super::collidable::Collidable;

/// Playable rectangle in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width, height),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Which world edges a rectangle is touching. y-up: `bottom` is `min.y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
    pub top: bool,
}

impl Edges {
    pub fn any(&self) -> bool {
        self.left || self.right || self.bottom || self.top
    }

    pub fn horizontal(&self) -> bool {
        self.left || self.right
    }

    pub fn vertical(&self) -> bool {
        self.bottom || self.top
    }
}

/// Edges a centre/half-extent rectangle touches or crosses, within `epsilon`.
pub fn touching_edges(pos: Vec2, half: Vec2, bounds: &WorldBounds, epsilon: f32) -> Edges {
    Edges {
        left: pos.x - half.x <= bounds.min.x + epsilon,
        right: pos.x + half.x >= bounds.max.x - epsilon,
        bottom: pos.y - half.y <= bounds.min.y + epsilon,
        top: pos.y + half.y >= bounds.max.y - epsilon,
    }
}

/// Clamp a centre so the rectangle stays inside `bounds`. A rectangle wider
/// (or taller) than the world is centred on that axis.
pub fn clamp_to_bounds(pos: Vec2, half: Vec2, bounds: &WorldBounds) -> Vec2 {
    let lo = bounds.min + half;
    let hi = bounds.max - half;
    let centre = (bounds.min + bounds.max) * 0.5;
    let axis = |v: f32, lo: f32, hi: f32, mid: f32| if lo > hi { mid } else { v.clamp(lo, hi) };
    Vec2::new(axis(pos.x, lo.x, hi.x, centre.x), axis(pos.y, lo.y, hi.y, centre.y))
}

/// Tunables for [`CollisionResponseHandler`], taken from [`SimConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileParams {
    pub bounds: WorldBounds,
    pub pixels_to_meters: f32,
    pub boundary_epsilon: f32,
    pub escape_nudge: f32,
    pub max_correction: f32,
    pub max_body_speed: f32,
    pub boundary_damping: f32,
    pub linear_damping: f32,
    pub collision_velocity_decay: f32,
}

impl ReconcileParams {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            bounds: WorldBounds::new(config.world_width, config.world_height),
            pixels_to_meters: config.pixels_to_meters,
            boundary_epsilon: config.boundary_epsilon,
            escape_nudge: config.escape_nudge,
            max_correction: config.max_correction,
            max_body_speed: config.max_body_speed,
            boundary_damping: config.boundary_damping,
            linear_damping: config.linear_damping,
            collision_velocity_decay: config.collision_velocity_decay,
        }
    }
}

impl Default for ReconcileParams {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

/// Which case a reconciliation took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    PhysicsDriven,
    Boundary(Edges),
    InCollision { capped: bool },
    Free,
}

#[derive(Debug, Clone, Default)]
pub struct CollisionResponseHandler {
    params: ReconcileParams,
}

impl CollisionResponseHandler {
    pub fn new(params: ReconcileParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ReconcileParams {
        &self.params
    }

    fn to_physics(&self, pos: Vec2) -> Vec2 {
        pos * self.params.pixels_to_meters
    }

    fn to_logical(&self, pos: Vec2) -> Vec2 {
        pos / self.params.pixels_to_meters
    }

    /// Reconcile one collidable after a physics step.
    ///
    /// `entity.pos` must still hold the previous frame's resolved position.
    /// Fails only when the collidable's body is gone from `physics`.
    pub fn reconcile(
        &self,
        entity: &mut Entity,
        collidable: &mut Collidable,
        manager: Option<&mut MovementManager>,
        physics: &mut PhysicsWorld,
        now: f64,
    ) -> Result<Reconciliation, CollisionError> {
        if !physics.contains(&collidable.body) {
            return Err(CollisionError::StaleBody(collidable.entity));
        }
        let Some(manager) = manager else {
            let (body_pos, _) = physics.body_position(&collidable.body);
            entity.pos = self.to_logical(body_pos);
            return Ok(Reconciliation::PhysicsDriven);
        };

        let p = &self.params;
        let half = entity.half_extents();
        let desired = manager.position();
        let clamped = clamp_to_bounds(desired, half, &p.bounds);
        let edges = touching_edges(desired, half, &p.bounds, p.boundary_epsilon);

        if edges.any() {
            self.resolve_boundary(entity, collidable, manager, physics, clamped, edges);
            return Ok(Reconciliation::Boundary(edges));
        }

        if collidable.is_in_collision(now) {
            let capped = self.follow_body(entity, collidable, manager, physics);
            return Ok(Reconciliation::InCollision { capped });
        }

        entity.pos = clamped;
        manager.set_position(clamped);
        physics.set_translation(&collidable.body, self.to_physics(clamped));
        physics.set_velocity(&collidable.body, self.to_physics(manager.velocity()));
        physics.set_linear_damping(&collidable.body, p.linear_damping);
        Ok(Reconciliation::Free)
    }

    fn resolve_boundary(
        &self,
        entity: &mut Entity,
        collidable: &mut Collidable,
        manager: &mut MovementManager,
        physics: &mut PhysicsWorld,
        clamped: Vec2,
        edges: Edges,
    ) {
        let p = &self.params;
        let half = entity.half_extents();

        if let Some(flag) = collidable.collision_flag_mut() {
            flag.clear();
        }
        physics.set_velocity(&collidable.body, Vec2::ZERO);
        physics.set_angular_velocity(&collidable.body, 0.0);
        physics.set_linear_damping(&collidable.body, p.boundary_damping);

        // Along a touched axis only a small step away from the wall is allowed
        // per frame; the other axis passes through unchanged.
        let previous = clamp_to_bounds(entity.pos, half, &p.bounds);
        let mut resolved = clamped;
        if edges.left {
            resolved.x = resolved.x.min(previous.x + p.escape_nudge);
        }
        if edges.right {
            resolved.x = resolved.x.max(previous.x - p.escape_nudge);
        }
        if edges.bottom {
            resolved.y = resolved.y.min(previous.y + p.escape_nudge);
        }
        if edges.top {
            resolved.y = resolved.y.max(previous.y - p.escape_nudge);
        }
        let resolved = clamp_to_bounds(resolved, half, &p.bounds);

        entity.pos = resolved;
        manager.set_position(resolved);
        physics.set_translation(&collidable.body, self.to_physics(resolved));

        let mut velocity = manager.velocity();
        if (edges.left && velocity.x < 0.0) || (edges.right && velocity.x > 0.0) {
            velocity.x = 0.0;
        }
        if (edges.bottom && velocity.y < 0.0) || (edges.top && velocity.y > 0.0) {
            velocity.y = 0.0;
        }
        manager.set_velocity(velocity);
    }

    /// Pull the entity toward its body, at most `max_correction` per frame.
    /// Returns whether the pull was capped.
    fn follow_body(
        &self,
        entity: &mut Entity,
        collidable: &Collidable,
        manager: &mut MovementManager,
        physics: &mut PhysicsWorld,
    ) -> bool {
        let p = &self.params;
        let (body_pos, _) = physics.body_position(&collidable.body);
        let body_logical = self.to_logical(body_pos);

        let delta = body_logical - entity.pos;
        let capped = delta.length() > p.max_correction;
        let delta = delta.clamp_length_max(p.max_correction);
        let resolved = clamp_to_bounds(entity.pos + delta, entity.half_extents(), &p.bounds);

        if capped {
            log::trace!(
                "entity {} correction {:.1} capped to {}",
                collidable.entity,
                (body_logical - entity.pos).length(),
                p.max_correction
            );
            physics.clamp_speed(&collidable.body, p.max_body_speed * p.pixels_to_meters);
        }
        if resolved != body_logical {
            physics.set_translation(&collidable.body, self.to_physics(resolved));
        }

        entity.pos = resolved;
        manager.set_position(resolved);
        manager.set_velocity(manager.velocity() * p.collision_velocity_decay);
        capped
    }
}
