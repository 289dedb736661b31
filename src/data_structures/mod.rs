//! Engine data structures: models, textures, billboards, and instances.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains the GPU texture wrapper, animated textures, and creation utilities
//! - `billboard` is a loaded billboard (model + transform + bindings + pick block)
//! - `instance` holds per-instance transformation data

pub mod billboard;
pub mod instance;
pub mod model;
pub mod texture;
