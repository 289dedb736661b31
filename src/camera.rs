//! Orbit camera: a target point the camera circles around, driven by
//! right-drag (yaw/pitch) and mouse wheel (radius).
//!
//! The camera uniform carries the view-projection matrix and the eye position
//! so shaders can do view-dependent work without a second upload.

use cgmath::{Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
const MIN_RADIUS: f32 = 0.5;
const MAX_RADIUS: f32 = 100.0;

/// Camera state in orbit coordinates: yaw and pitch around `target` at
/// distance `radius`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub target: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub radius: f32,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, Y: Into<Rad<f32>>, R: Into<Rad<f32>>>(
        target: P,
        yaw: Y,
        pitch: R,
        radius: f32,
    ) -> Self {
        Self {
            target: target.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            radius,
        }
    }

    /// The eye position implied by the orbit parameters.
    pub fn eye_position(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        Point3::new(
            self.target.x + self.radius * cos_pitch * cos_yaw,
            self.target.y + self.radius * sin_pitch,
            self.target.z + self.radius * cos_pitch * sin_yaw,
        )
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye_position(), self.target, Vector3::unit_y())
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Accumulates mouse input between frames and applies it in `update`.
#[derive(Debug)]
pub struct CameraController {
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            speed,
            sensitivity,
        }
    }

    /// Feed raw mouse deltas (only called while the right button is held).
    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        self.rotate_horizontal = mouse_dx as f32;
        self.rotate_vertical = mouse_dy as f32;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.scroll += match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
            };
        }
    }

    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();

        camera.yaw += Rad(self.rotate_horizontal * self.sensitivity * dt);
        camera.pitch += Rad(self.rotate_vertical * self.sensitivity * dt);
        // Stop short of the poles so look_at keeps a usable up vector
        camera.pitch.0 = camera.pitch.0.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        camera.radius = (camera.radius - self.scroll * self.speed * 0.1).clamp(MIN_RADIUS, MAX_RADIUS);

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.scroll = 0.0;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.eye_position().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// All GPU-side camera state the render passes bind.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        let controller = CameraController::new(10.0, 0.4);

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Deg;

    #[test]
    fn eye_sits_on_the_orbit_sphere() {
        let camera = Camera::new((0.0, 0.0, 0.0), Deg(-90.0), Deg(0.0), 5.0);
        let eye = camera.eye_position();
        // yaw -90° with zero pitch puts the eye straight down -z
        assert!((eye.x).abs() < 1e-4);
        assert!((eye.y).abs() < 1e-4);
        assert!((eye.z + 5.0).abs() < 1e-4);
    }

    #[test]
    fn eye_rises_with_pitch() {
        let camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(30.0), 2.0);
        let eye = camera.eye_position();
        assert!((eye.y - 1.0).abs() < 1e-4);
        assert!((eye.x - 3.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_below_the_pole() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0), 5.0);
        let mut controller = CameraController::new(10.0, 100.0);
        controller.handle_mouse(0.0, 10_000.0);
        controller.update(&mut camera, Duration::from_secs(1));
        assert!(camera.pitch.0 <= PITCH_LIMIT);
        controller.handle_mouse(0.0, -1_000_000.0);
        controller.update(&mut camera, Duration::from_secs(1));
        assert!(camera.pitch.0 >= -PITCH_LIMIT);
    }

    #[test]
    fn zoom_clamps_radius() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0), 5.0);
        let mut controller = CameraController::new(10.0, 0.4);
        for _ in 0..1_000 {
            controller.scroll = 100.0;
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert_eq!(camera.radius, MIN_RADIUS);
        for _ in 0..10_000 {
            controller.scroll = -100.0;
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert_eq!(camera.radius, MAX_RADIUS);
    }

    #[test]
    fn input_is_consumed_by_update() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0), 5.0);
        let mut controller = CameraController::new(10.0, 0.4);
        controller.handle_mouse(10.0, 5.0);
        controller.update(&mut camera, Duration::from_millis(16));
        let yaw_after_first = camera.yaw;
        // A second update without new input must not keep rotating
        controller.update(&mut camera, Duration::from_millis(16));
        assert_eq!(camera.yaw, yaw_after_first);
    }
}
