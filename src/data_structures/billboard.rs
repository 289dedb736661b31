//! A loaded billboard: one GLB model, its transform, and its bindings.
//!
//! The billboard owns the GPU instance buffer for its row position/scale, a
//! contiguous pick-ID block (base + submesh index) so clicks resolve back to
//! submesh names, and whatever animated textures its video bindings created.

use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::Instance,
    model::{Material, Model},
    texture::AnimatedTexture,
};

/// Pick IDs are handed out in blocks of this size, one block per billboard.
/// A billboard therefore supports up to 64 clickable submeshes, and a pick ID
/// maps back to its billboard with one division.
pub const PICK_BLOCK: u32 = 64;

/// Offset of `id` inside the block starting at `pick_base`, if it falls
/// within the block. IDs past the boundary belong to the next block and never
/// resolve here, even when the model carries more submeshes than the block.
pub fn pick_offset(pick_base: u32, id: u32) -> Option<usize> {
    let offset = id.checked_sub(pick_base)? as usize;
    (offset < PICK_BLOCK as usize).then_some(offset)
}

pub struct Billboard {
    pub name: String,
    pub model: Model,
    pub instance: Instance,
    pub instance_buffer: wgpu::Buffer,
    /// First pick ID of this billboard's block; submesh `i` picks as `pick_base + i`.
    pub pick_base: u32,
    animated: Vec<AnimatedTexture>,
}

impl Billboard {
    pub fn new(device: &wgpu::Device, name: &str, model: Model, instance: Instance, pick_base: u32) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} instance buffer")),
            contents: bytemuck::cast_slice(&[instance.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            name: name.to_string(),
            model,
            instance,
            instance_buffer,
            pick_base,
            animated: Vec::new(),
        }
    }

    /// Re-upload the instance transform after mutating `instance`.
    pub fn write_to_buffer(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.instance.to_raw()]),
        );
    }

    /// Attach `material` to the submesh at `submesh_index`.
    ///
    /// Indices come from resolving binding names against the imported submesh
    /// list before upload; the upload keeps that order.
    pub fn set_material(&mut self, submesh_index: usize, material: Material) {
        log::info!(
            "binding material \"{}\" to submesh {} of {}",
            material.name,
            submesh_index,
            self.name,
        );
        self.model.materials.push(material);
        self.model.meshes[submesh_index].material = self.model.materials.len() - 1;
    }

    /// Like [`set_material`](Self::set_material) but keeps the animated frame
    /// stack alive so `advance_animations` can drive it.
    pub fn set_animated_material(
        &mut self,
        submesh_index: usize,
        material: Material,
        frames: AnimatedTexture,
    ) {
        self.set_material(submesh_index, material);
        self.animated.push(frames);
    }

    pub fn advance_animations(&mut self, queue: &wgpu::Queue, dt: instant::Duration) {
        for animation in &mut self.animated {
            animation.advance(queue, dt);
        }
    }

    /// Resolve a pick ID from this billboard's block to a submesh name.
    pub fn submesh_for_pick(&self, id: u32) -> Option<&str> {
        let offset = pick_offset(self.pick_base, id)?;
        self.model
            .meshes
            .get(offset)
            .map(|mesh| mesh.name.as_str())
    }

    pub fn animated_count(&self) -> usize {
        self.animated.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_offsets_stay_inside_their_block() {
        let base = 1 + PICK_BLOCK;
        assert_eq!(pick_offset(base, base - 1), None);
        assert_eq!(pick_offset(base, base), Some(0));
        assert_eq!(pick_offset(base, base + PICK_BLOCK - 1), Some(PICK_BLOCK as usize - 1));
        // The first ID of the next block must not leak into this one
        assert_eq!(pick_offset(base, base + PICK_BLOCK), None);
    }

    #[test]
    fn background_id_never_resolves() {
        assert_eq!(pick_offset(1, 0), None);
    }
}
