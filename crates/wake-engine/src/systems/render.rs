use crate::components::entity::Entity;
use crate::renderer::instance::{RenderBuffer, RenderInstance};

/// Build the render buffer from a set of entities, ordered by id.
/// Inactive entities are included with `active = 0`; skipping them is the
/// renderer's call.
pub fn build_render_buffer<'a>(entities: impl Iterator<Item = &'a Entity>, buffer: &mut RenderBuffer) {
    buffer.clear();
    buffer.instances.extend(entities.map(|entity| RenderInstance {
        x: entity.pos.x,
        y: entity.pos.y,
        width: entity.size.x,
        height: entity.size.y,
        active: entity.active as u32,
        id: entity.id.0,
    }));
    buffer.instances.sort_by_key(|i| i.id);
}
