//! marquee
//!
//! An interactive billboard showcase for native and WASM targets. The crate
//! imports GLB billboard models, binds still images and looping video frames
//! to their named submeshes, lays the billboards out in a row and renders
//! them under a hemispheric light with an orbit camera. Clicking a billboard
//! resolves, on the GPU, which submesh was hit and reports its name.
//!
//! High-level modules
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `config`: RON scene manifest (billboards, bindings, layout)
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene data models (billboards, meshes, instances, textures)
//! - `flow`: high level flow control (scenes / update loops)
//! - `pick`: GPU picking utilities and shaders
//! - `pipelines`: definitions for the render pipelines (billboard, glow, light, pick)
//! - `resources`: helpers to load GLBs/textures and create GPU resources
//! - `render`: render composition for efficient pipeline reuse
//! - `showcase`: the ready-made showcase scene flow
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pick;
pub mod pipelines;
pub mod resources;
pub mod render;
pub mod showcase;

// Re-exports commonly used types for convenience in downstream code.
pub use winit::dpi::PhysicalPosition;
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::*;

/// WASM entry point: starts the showcase with the default manifest on the
/// page's `canvas` element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    use wasm_bindgen::UnwrapThrowExt;

    showcase::run_showcase("showcase.ron").unwrap_throw();
}
