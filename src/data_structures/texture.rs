//! GPU textures and texture creation utilities.
//!
//! [`Texture`] wraps a WGPU texture with its view and sampler. Besides the
//! depth texture and image uploads this module provides a 1×1 solid fallback
//! (used until a binding's real texture arrives, or when it fails to decode)
//! and [`AnimatedTexture`], a frame stack that re-uploads the current frame as
//! its per-frame delays elapse. Animated textures back the video bindings.

use anyhow::*;
use image::{GenericImageView, ImageFormat, load_from_memory_with_format};
use instant::Duration;

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        }));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1×1 texture of a single colour.
    ///
    /// Submeshes are created with this as their diffuse map so a billboard is
    /// visible before its bindings resolve; it also stands in for textures
    /// that fail to load.
    pub fn solid_colour(
        rgba: [u8; 4],
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
    ) -> Texture {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));
        Texture {
            texture,
            view,
            sampler,
        }
    }

    /// Load a texture from raw byte data (image file contents).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data (PNG, JPEG, etc.)
    /// * `label` is used as a debug name for the GPU resource
    /// * `format` is an optional file format hint (e.g., "png"). If None, auto-detect.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
    ) -> Result<Self> {
        let img = match format.and_then(ImageFormat::from_extension) {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
        };
        Self::from_image(device, queue, &img, Some(label))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
    ) -> Result<Self> {
        let dimensions = img.dimensions();
        let rgba = img.to_rgba8();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Tracks which frame of an animation is current given elapsed time.
///
/// Kept separate from the GPU upload so frame timing stays testable.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    delays: Vec<Duration>,
    current: usize,
    elapsed: Duration,
}

impl FrameTimer {
    /// Zero-delay frames would keep `step` spinning on the same spot, so every
    /// delay is clamped to this floor (browsers treat such GIFs the same way).
    pub const MIN_DELAY: Duration = Duration::from_millis(10);

    pub fn new(delays: Vec<Duration>) -> Self {
        let delays = delays
            .into_iter()
            .map(|delay| delay.max(Self::MIN_DELAY))
            .collect();
        Self {
            delays,
            current: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Advance by `dt`, wrapping past the last frame. Returns the new frame
    /// index if the frame changed.
    pub fn step(&mut self, dt: Duration) -> Option<usize> {
        if self.delays.len() < 2 {
            return None;
        }
        self.elapsed += dt;
        let before = self.current;
        while self.elapsed >= self.delays[self.current] {
            self.elapsed -= self.delays[self.current];
            self.current = (self.current + 1) % self.delays.len();
        }
        (self.current != before).then_some(self.current)
    }
}

/// A decoded frame stack sharing one GPU texture.
///
/// All frames have the dimensions of the first; `advance` re-uploads the
/// current frame whenever its delay elapses.
#[derive(Debug)]
pub struct AnimatedTexture {
    pub texture: Texture,
    frames: Vec<image::RgbaImage>,
    timer: FrameTimer,
    width: u32,
    height: u32,
}

impl AnimatedTexture {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frames: Vec<image::RgbaImage>,
        delays: Vec<Duration>,
        label: &str,
    ) -> Result<Self> {
        let first = frames.first().context("animation has no frames")?;
        let (width, height) = first.dimensions();
        let texture = Texture::from_image(
            device,
            queue,
            &image::DynamicImage::ImageRgba8(first.clone()),
            Some(label),
        )?;
        Ok(Self {
            texture,
            frames,
            timer: FrameTimer::new(delays),
            width,
            height,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Advance the timer and upload the new current frame if it changed.
    pub fn advance(&mut self, queue: &wgpu::Queue, dt: Duration) {
        let Some(frame) = self.timer.step(dt) else {
            return;
        };
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &self.frames[frame],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(millis: &[u64]) -> FrameTimer {
        FrameTimer::new(millis.iter().map(|&ms| Duration::from_millis(ms)).collect())
    }

    #[test]
    fn frame_advances_after_its_delay() {
        let mut t = timer(&[100, 100, 100]);
        assert_eq!(t.step(Duration::from_millis(50)), None);
        assert_eq!(t.step(Duration::from_millis(50)), Some(1));
        assert_eq!(t.current(), 1);
    }

    #[test]
    fn uneven_delays_are_respected() {
        let mut t = timer(&[100, 20, 300]);
        assert_eq!(t.step(Duration::from_millis(100)), Some(1));
        assert_eq!(t.step(Duration::from_millis(20)), Some(2));
        assert_eq!(t.step(Duration::from_millis(299)), None);
        assert_eq!(t.step(Duration::from_millis(1)), Some(0));
    }

    #[test]
    fn large_steps_skip_frames_and_wrap() {
        let mut t = timer(&[10, 10, 10]);
        // 35ms covers three full frames and lands 5ms into frame 0 again
        assert_eq!(t.step(Duration::from_millis(35)), None);
        assert_eq!(t.current(), 0);
        assert_eq!(t.step(Duration::from_millis(5)), Some(1));
    }

    #[test]
    fn zero_delays_are_clamped_so_stepping_terminates() {
        let mut t = timer(&[0, 0, 0]);
        assert_eq!(t.step(FrameTimer::MIN_DELAY), Some(1));
        // 1s covers 100 clamped frames: (1 + 100) % 3
        assert_eq!(t.step(Duration::from_secs(1)), Some(2));
        assert_eq!(t.current(), 2);
    }

    #[test]
    fn single_frame_never_advances() {
        let mut t = timer(&[100]);
        assert_eq!(t.step(Duration::from_secs(10)), None);
        assert_eq!(t.current(), 0);
    }
}
