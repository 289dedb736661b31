//! Render composition and pipeline batching.
//!
//! Flows hand back a [`Render`] each frame; the engine flattens the tree into
//! one batch of instanced draws, runs the lit billboard pass over it, then the
//! additive glow pass (each pass filters submeshes by their material's glow
//! flag). The same tree feeds the pick pass, where every submesh of an
//! [`Instanced`] occupies one ID of the block starting at `id`.

use std::collections::{HashMap, HashSet};

use crate::data_structures::{
    billboard::{Billboard, PICK_BLOCK},
    model::Model,
};

/// Data for instanced object rendering: a model, instance buffer, and the
/// base pick ID of the model's submesh block.
#[derive(Clone)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
    pub id: u32,
}

/// Specifies how a scene object should be rendered.
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single instanced object
/// - `Defaults(Vec<Instanced>)` renders a batch of instanced objects
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Map pick IDs to flow indices for click dispatch.
    ///
    /// Registers the whole submesh ID block of each instanced object so a
    /// pick on any submesh finds the owning flow.
    pub(crate) fn map_ids(&self, flow_id: usize, map: &mut HashMap<u32, HashSet<usize>>) {
        let mut insert = |instanced: &Instanced| {
            // Submeshes past the block boundary would alias the next block
            let registered = (instanced.model.meshes.len() as u32).min(PICK_BLOCK);
            for offset in 0..registered {
                map.entry(instanced.id + offset)
                    .and_modify(|flows| {
                        flows.insert(flow_id);
                    })
                    .or_insert([flow_id].into());
            }
        };
        match self {
            Render::Default(instanced) => insert(instanced),
            Render::Defaults(vec) => vec.iter().for_each(insert),
            Render::Composed(renders) => renders
                .iter()
                .for_each(|render| render.map_ids(flow_id, map)),
            Render::None => (),
        }
    }

    /// Flatten the render tree into the frame's draw batch.
    pub(crate) fn batch(self, batch: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Default(instanced) => batch.push(instanced),
            Render::Defaults(mut vec) => batch.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.batch(batch)),
            Render::None => (),
        }
    }
}

impl<'a> From<&'a Billboard> for Render<'a> {
    fn from(billboard: &'a Billboard) -> Self {
        Render::Default(Instanced {
            instance: &billboard.instance_buffer,
            model: &billboard.model,
            amount: 1,
            id: billboard.pick_base,
        })
    }
}
