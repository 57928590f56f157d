use bytemuck::{Pod, Zeroable};

/// Per-entity render record: everything a renderer may know about an entity.
/// 6 × 4 bytes = 24 bytes stride, safe to hand to a GPU buffer as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// Centre X in world space.
    pub x: f32,
    /// Centre Y in world space (y-up).
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// 1 when the entity is active, 0 otherwise.
    pub active: u32,
    /// Entity id, so renderers can keep per-entity state.
    pub id: u32,
}

impl RenderInstance {
    pub const STRIDE_BYTES: usize = std::mem::size_of::<Self>();

    pub fn is_active(&self) -> bool {
        self.active != 0
    }
}

/// One frame's render snapshot, ordered by entity id.
#[derive(Debug, Clone, Default)]
pub struct RenderBuffer {
    pub instances: Vec<RenderInstance>,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(256),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: RenderInstance) {
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Raw instance bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}
