//! Texture loading: still images and animated (video-style) frame stacks.

use std::io::Cursor;

use anyhow::Context as _;
use image::AnimationDecoder;
use instant::Duration;

use crate::{
    data_structures::texture::{AnimatedTexture, Texture},
    resources::load_binary,
};

/// Bind group layout every billboard material uses: diffuse texture, sampler,
/// and the material parameter uniform (visible in the vertex stage too for the
/// flip flag).
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("Material bind group layout"),
    })
}

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name).await?;
    let format = file_name.rsplit('.').next();
    Texture::from_bytes(device, queue, &data, file_name, format)
}

/// Load an animated texture (GIF frame stack) for a video binding.
///
/// Zero-delay frames are clamped by the frame timer so playback always makes
/// progress.
pub async fn load_animated_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<AnimatedTexture> {
    let data = load_binary(file_name).await?;
    let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(data))
        .with_context(|| format!("decoding {file_name} as GIF"))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .with_context(|| format!("collecting frames of {file_name}"))?;

    let mut delays = Vec::with_capacity(frames.len());
    let mut images = Vec::with_capacity(frames.len());
    for frame in frames {
        delays.push(Duration::from(frame.delay()));
        images.push(frame.into_buffer());
    }

    AnimatedTexture::new(device, queue, images, delays, file_name)
}
