use glam::Vec2;
use crate::api::types::EntityId;

/// Positional rectangle for one game object.
/// `pos` is the centre; `size` is the full width/height in logical units.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// String tag for finding entities by name ("boat", "rock", "trash").
    pub tag: String,
    /// Whether this entity is active (inactive entities are skipped).
    pub active: bool,
    /// Centre position in world space.
    pub pos: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl Entity {
    /// Create a new 1×1 entity with the given ID at the origin.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            pos: Vec2::ZERO,
            size: Vec2::ONE,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Axis-aligned overlap test against another entity's rectangle.
    pub fn overlaps(&self, other: &Entity) -> bool {
        let d = (self.pos - other.pos).abs();
        let reach = self.half_extents() + other.half_extents();
        d.x < reach.x && d.y < reach.y
    }
}
