//! Render pipeline definitions.
//!
//! - `billboard`: textured, hemispheric-lit pass for billboard surfaces
//! - `glow`: unlit emissive pass with additive blending
//! - `light`: the hemispheric light uniform both shaded passes read
//! - `pick`: R32Uint object-ID pass backing click resolution

pub mod billboard;
pub mod glow;
pub mod light;
pub mod pick;

/// The fixed pipeline set the context owns; built once at startup.
#[derive(Debug)]
pub struct Pipelines {
    pub billboard: wgpu::RenderPipeline,
    pub glow: wgpu::RenderPipeline,
    pub pick: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            billboard: billboard::mk_billboard_pipeline(
                device,
                config,
                light_bind_group_layout,
                camera_bind_group_layout,
            ),
            glow: glow::mk_glow_pipeline(
                device,
                config,
                light_bind_group_layout,
                camera_bind_group_layout,
            ),
            pick: pick::mk_pick_pipeline(device, camera_bind_group_layout),
        }
    }
}
