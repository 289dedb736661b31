//! Pick-pass resources: ID uniforms standing in for materials.

use wgpu::util::DeviceExt;

use crate::data_structures::model::{Material, Mesh, Model};

pub fn pick_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("Pick bind group layout"),
    })
}

/**
 * A representation of a model whose materials are uniform ID buffers instead
 * of textures. The fragment shader writes the ID into the R32Uint pick target,
 * which gives pixel-perfect picking when the buffer is read back.
 *
 * Each submesh gets its own ID (`base_id + submesh index`) so a click resolves
 * to a single named submesh, not just the owning billboard.
 */
pub fn load_pick_model(
    device: &wgpu::Device,
    base_id: u32,
    meshes: Vec<Mesh>,
) -> anyhow::Result<Model> {
    let materials = (0..meshes.len())
        .map(|offset| {
            let id = base_id + offset as u32;
            // Browsers don't support downscaling uniform buffers, so pad to 16B
            let buf: [u32; 4] = [id, 0, 0, 0];
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Pick id buffer"),
                contents: bytemuck::cast_slice(&buf),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            Material::new_pick_material(device, "Pick Material", buffer)
        })
        .collect();

    let meshes = meshes
        .into_iter()
        .enumerate()
        .map(|(offset, mut mesh)| {
            mesh.material = offset;
            mesh
        })
        .collect();

    Ok(Model { meshes, materials })
}
