//! Meshes, materials and the draw traits the render passes use.
//!
//! A [`Model`] is a set of named submeshes plus the materials they index.
//! Materials carry a diffuse texture and a small parameter uniform
//! ([`MaterialParams`]): emissive colour/strength, the glow flag that routes a
//! submesh to the additive pass, and the vertical-flip flag applied to texture
//! coordinates in the vertex shader.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::data_structures::texture::{self, Texture};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-material shading parameters, uploaded as a uniform next to the texture.
///
/// `emissive` is rgb plus strength. `flags.x` is the glow flag (mirrored by
/// [`Material::glow`] on the CPU side), `flags.y` enables the vertical texture
/// flip.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialParams {
    pub emissive: [f32; 4],
    pub flags: [f32; 4],
}

impl MaterialParams {
    pub fn new(emissive: [f32; 3], strength: f32, glow: bool, flip_v: bool) -> Self {
        Self {
            emissive: [emissive[0], emissive[1], emissive[2], strength],
            flags: [glow as u32 as f32, flip_v as u32 as f32, 0.0, 0.0],
        }
    }

    /// The subtle emissive lift every lit billboard surface gets.
    pub fn lit(flip_v: bool) -> Self {
        Self::new([0.1, 0.1, 0.1], 1.0, false, flip_v)
    }

    /// Full-strength unlit emissive for the additive glow pass.
    pub fn glowing(flip_v: bool) -> Self {
        Self::new([1.0, 1.0, 1.0], 1.0, true, flip_v)
    }
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self::lit(false)
    }
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub diffuse_texture: Option<Texture>,
    pub params: MaterialParams,
    /// Routes the submesh to the additive glow pass instead of the lit pass.
    pub glow: bool,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: Texture,
        params: MaterialParams,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} params buffer")),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = diffuse_texture
            .sampler
            .clone()
            .unwrap_or_else(|| texture::create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            diffuse_texture: Some(diffuse_texture),
            params,
            glow: params.flags[0] != 0.0,
            bind_group,
        }
    }

    /// Build a material whose only binding is a pick-ID uniform. Used by the
    /// offscreen ID pass; the buffer must match the pick bind group layout.
    pub fn new_pick_material(device: &wgpu::Device, name: &str, buffer: wgpu::Buffer) -> Self {
        let layout = crate::resources::pick::pick_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(name),
        });
        Self {
            name: name.to_string(),
            diffuse_texture: None,
            params: MaterialParams::default(),
            glow: false,
            bind_group,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

impl Model {
    pub fn submesh_names(&self) -> Vec<&str> {
        self.meshes.iter().map(|mesh| mesh.name.as_str()).collect()
    }
}

pub trait DrawModel {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
    /// Draw every submesh regardless of its glow flag (the pick pass).
    fn draw_model_instanced(
        &mut self,
        model: &Model,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
    /// Draw only the submeshes whose material is lit (no glow flag).
    fn draw_model_lit(
        &mut self,
        model: &Model,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
    /// Draw only the submeshes routed to the glow pass.
    fn draw_model_glowing(
        &mut self,
        model: &Model,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model_instanced(
        &mut self,
        model: &Model,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            self.draw_mesh_instanced(
                mesh,
                material,
                instances.clone(),
                camera_bind_group,
                light_bind_group,
            );
        }
    }

    fn draw_model_lit(
        &mut self,
        model: &Model,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            if material.glow {
                continue;
            }
            self.draw_mesh_instanced(
                mesh,
                material,
                instances.clone(),
                camera_bind_group,
                light_bind_group,
            );
        }
    }

    fn draw_model_glowing(
        &mut self,
        model: &Model,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            if !material.glow {
                continue;
            }
            self.draw_mesh_instanced(
                mesh,
                material,
                instances.clone(),
                camera_bind_group,
                light_bind_group,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_pack_glow_and_flip_flags() {
        let params = MaterialParams::new([0.2, 0.4, 0.6], 1.5, true, false);
        assert_eq!(params.emissive, [0.2, 0.4, 0.6, 1.5]);
        assert_eq!(params.flags[0], 1.0);
        assert_eq!(params.flags[1], 0.0);

        let params = MaterialParams::lit(true);
        assert_eq!(params.flags[0], 0.0);
        assert_eq!(params.flags[1], 1.0);
    }

    #[test]
    fn params_are_tightly_packed_for_the_uniform() {
        // Two vec4s, no hidden padding.
        assert_eq!(std::mem::size_of::<MaterialParams>(), 32);
    }
}
