//! The billboard showcase scene.
//!
//! Imports every billboard listed in the manifest, lays them out in a row
//! around the origin, applies the texture bindings, and logs the submesh name
//! whenever one is clicked. All heavy loading happens in the flow constructor,
//! so several billboards import concurrently before the first frame.

use instant::Duration;
use winit::event::{DeviceEvent, WindowEvent};

use crate::{
    config::{BillboardConfig, ShowcaseConfig, TextureBinding, TextureSource},
    context::{Context, DEFAULT_CLEAR_COLOUR, InitContext},
    data_structures::{
        billboard::{Billboard, PICK_BLOCK},
        model::{Material, MaterialParams},
    },
    flow::{FlowConstructor, GraphicsFlow, Out},
    render::Render,
    resources::{
        glb::BillboardData, load_animated_texture, load_billboard_glb, load_texture,
        material_layout, upload_billboard,
    },
};

#[cfg(feature = "integration-tests")]
use crate::flow::ImageTestResult;

/// Base pick ID of the billboard at `index`. ID 0 stays reserved for the
/// cleared background.
pub fn pick_base(index: usize) -> u32 {
    1 + index as u32 * PICK_BLOCK
}

/// X offsets that centre `count` billboards around the origin.
pub fn row_offsets(count: usize, spacing: f32) -> Vec<f32> {
    let centre = (count as f32 - 1.0) / 2.0;
    (0..count)
        .map(|i| (i as f32 - centre) * spacing)
        .collect()
}

/// Shared state across flows; the showcase keeps everything it needs in the
/// flow itself.
#[derive(Default)]
pub struct ShowcaseState;

pub enum ShowcaseEvent {}

pub struct Showcase {
    billboards: Vec<Billboard>,
}

impl Showcase {
    pub async fn new(ctx: InitContext, manifest: &str) -> Self {
        let config = ShowcaseConfig::load(manifest).await;
        let offsets = row_offsets(config.billboards.len(), config.spacing);

        let loads = config
            .billboards
            .iter()
            .enumerate()
            .map(|(index, billboard_config)| {
                let ctx = ctx.clone();
                let offset = offsets[index];
                async move { load_billboard(&ctx, index, billboard_config, offset).await }
            });
        let billboards = futures::future::join_all(loads).await;

        log::info!("showcase ready: {} billboards imported", billboards.len());
        Self { billboards }
    }

    /// Resolve a pick ID to the billboard owning its block.
    fn billboard_for_pick(&self, id: u32) -> Option<&Billboard> {
        self.billboards
            .iter()
            .find(|billboard| {
                id >= billboard.pick_base && id < billboard.pick_base + PICK_BLOCK
            })
    }
}

/// Resolve the manifest bindings of one billboard against its imported
/// submesh names, before anything touches the GPU. A binding whose submesh
/// does not exist is logged together with the names that do exist and
/// dropped; the remaining bindings keep their order.
fn resolve_bindings<'a>(
    data: &BillboardData,
    glb: &str,
    bindings: &'a [TextureBinding],
) -> Vec<(usize, &'a TextureBinding)> {
    bindings
        .iter()
        .filter_map(|binding| match data.submesh_index(&binding.submesh) {
            Some(index) => Some((index, binding)),
            None => {
                log::warn!(
                    "submesh \"{}\" not found in {}; available submeshes: {:?}",
                    binding.submesh,
                    glb,
                    data.submesh_names(),
                );
                None
            }
        })
        .collect()
}

/// Shading parameters a binding asks for: glow routes to the additive pass.
fn binding_params(binding: &TextureBinding) -> MaterialParams {
    if binding.glow {
        MaterialParams::glowing(binding.flip_v)
    } else {
        MaterialParams::lit(binding.flip_v)
    }
}

/// Import one billboard: parse and upload the GLB, place it in the row,
/// then apply its texture bindings. A GLB that cannot be imported aborts
/// startup; a failed binding only costs that one screen (the submesh keeps
/// its neutral fallback material).
async fn load_billboard(
    ctx: &InitContext,
    index: usize,
    config: &BillboardConfig,
    x_offset: f32,
) -> Billboard {
    let data = match load_billboard_glb(&config.glb).await {
        Ok(data) => data,
        Err(e) => {
            log::error!("billboard import failed for {}: {:#}", config.glb, e);
            panic!("cannot import {}", config.glb);
        }
    };
    if data.submeshes.len() > PICK_BLOCK as usize {
        log::warn!(
            "{} has {} submeshes; only the first {} are clickable",
            config.glb,
            data.submeshes.len(),
            PICK_BLOCK,
        );
    }
    let model = upload_billboard(&ctx.device, &ctx.queue, &data, &config.glb);

    let mut instance = data.transform;
    instance.position.x = x_offset;
    instance.scale = instance.scale * config.scale;

    let name = format!("{}#{}", config.glb, index);
    let mut billboard = Billboard::new(&ctx.device, &name, model, instance, pick_base(index));

    let layout = material_layout(&ctx.device);
    for (submesh_index, binding) in resolve_bindings(&data, &config.glb, &config.bindings) {
        let params = binding_params(binding);
        match &binding.source {
            TextureSource::Image(file) => {
                match load_texture(file, &ctx.device, &ctx.queue).await {
                    Ok(texture) => {
                        let material =
                            Material::new(&ctx.device, &binding.material, texture, params, &layout);
                        billboard.set_material(submesh_index, material);
                    }
                    Err(e) => log::warn!("skipping binding {}: {:#}", file, e),
                }
            }
            TextureSource::Video(file) => {
                match load_animated_texture(file, &ctx.device, &ctx.queue).await {
                    Ok(animated) => {
                        let material = Material::new(
                            &ctx.device,
                            &binding.material,
                            animated.texture.clone(),
                            params,
                            &layout,
                        );
                        billboard.set_animated_material(submesh_index, material, animated);
                    }
                    Err(e) => log::warn!("skipping binding {}: {:#}", file, e),
                }
            }
        }
    }

    billboard
}

impl GraphicsFlow<ShowcaseState, ShowcaseEvent> for Showcase {
    fn on_init(
        &mut self,
        ctx: &mut Context,
        _: &mut ShowcaseState,
    ) -> Out<ShowcaseState, ShowcaseEvent> {
        ctx.clear_colour = DEFAULT_CLEAR_COLOUR;
        for billboard in &self.billboards {
            log::info!(
                "{}: submeshes {:?}",
                billboard.name,
                billboard.model.submesh_names()
            );
        }
        Out::Empty
    }

    fn on_click(
        &mut self,
        _: &Context,
        _: &mut ShowcaseState,
        id: u32,
    ) -> Out<ShowcaseState, ShowcaseEvent> {
        match self
            .billboard_for_pick(id)
            .and_then(|billboard| billboard.submesh_for_pick(id))
        {
            Some(name) => log::info!("clicked submesh {}", name),
            None => log::info!("clicked empty space"),
        }
        Out::Empty
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        _: &mut ShowcaseState,
        dt: Duration,
    ) -> Out<ShowcaseState, ShowcaseEvent> {
        for billboard in &mut self.billboards {
            billboard.advance_animations(&ctx.queue, dt);
        }
        Out::Empty
    }

    fn on_tick(
        &mut self,
        _: &Context,
        _: &mut ShowcaseState,
    ) -> Out<ShowcaseState, ShowcaseEvent> {
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut ShowcaseState,
        _: &DeviceEvent,
    ) -> Out<ShowcaseState, ShowcaseEvent> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut ShowcaseState,
        _: &WindowEvent,
    ) -> Out<ShowcaseState, ShowcaseEvent> {
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        _: &Context,
        _: &mut ShowcaseState,
        event: ShowcaseEvent,
    ) -> Option<ShowcaseEvent> {
        Some(event)
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(self.billboards.iter().map(Render::from).collect())
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _: &Context,
        _: &mut ShowcaseState,
        _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        Ok(ImageTestResult::Passed)
    }
}

/// Flow constructor for the showcase scene; pass to [`crate::flow::run`].
pub fn showcase_flow(manifest: String) -> FlowConstructor<ShowcaseState, ShowcaseEvent> {
    Box::new(move |ctx| {
        Box::pin(async move {
            Box::new(Showcase::new(ctx, &manifest).await)
                as Box<dyn GraphicsFlow<ShowcaseState, ShowcaseEvent>>
        })
    })
}

/// Run the showcase with the given manifest file under `assets/`.
pub fn run_showcase(manifest: &str) -> anyhow::Result<()> {
    crate::flow::run(vec![showcase_flow(manifest.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_structures::billboard::pick_offset,
        resources::{glb::tests::synth_glb, parse_billboard_glb},
    };

    fn binding(submesh: &str, glow: bool, flip_v: bool) -> TextureBinding {
        TextureBinding {
            submesh: submesh.to_string(),
            source: TextureSource::Image("images/poster.png".to_string()),
            material: "billboardMaterial".to_string(),
            glow,
            flip_v,
        }
    }

    #[test]
    fn matched_bindings_resolve_to_their_submeshes() {
        let data = parse_billboard_glb(&synth_glb("Screen", 3)).unwrap();
        let bindings = vec![
            binding("Screen_primitive2", false, true),
            binding("Screen", true, false),
        ];
        let resolved = resolve_bindings(&data, "models/screen.glb", &bindings);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0, 2);
        assert_eq!(resolved[1].0, 0);
        assert_eq!(resolved[1].1.submesh, "Screen");
    }

    #[test]
    fn unmatched_submesh_is_dropped_without_failing_the_rest() {
        let data = parse_billboard_glb(&synth_glb("Screen", 2)).unwrap();
        let bindings = vec![
            binding("NotASubmesh", false, true),
            binding("Screen_primitive1", false, true),
        ];
        let resolved = resolve_bindings(&data, "models/screen.glb", &bindings);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0, 1);
    }

    #[test]
    fn binding_flags_select_the_material_params() {
        assert_eq!(
            binding_params(&binding("Screen", true, false)),
            MaterialParams::glowing(false)
        );
        assert_eq!(
            binding_params(&binding("Screen", false, true)),
            MaterialParams::lit(true)
        );
    }

    #[test]
    fn pick_ids_round_trip_to_submesh_indices() {
        let data = parse_billboard_glb(&synth_glb("Screen", 3)).unwrap();
        let base = pick_base(1);
        for (index, name) in data.submesh_names().iter().enumerate() {
            let id = base + index as u32;
            let offset = pick_offset(base, id).unwrap();
            assert_eq!(data.submesh_names()[offset], *name);
        }
    }

    #[test]
    fn row_is_centred_around_origin() {
        assert_eq!(row_offsets(1, 3.0), vec![0.0]);
        assert_eq!(row_offsets(2, 3.0), vec![-1.5, 1.5]);
        assert_eq!(row_offsets(3, 2.0), vec![-2.0, 0.0, 2.0]);
    }

    #[test]
    fn row_offsets_sum_to_zero() {
        let offsets = row_offsets(5, 4.0);
        let sum: f32 = offsets.iter().sum();
        assert!(sum.abs() < 1e-5);
    }

    #[test]
    fn pick_blocks_do_not_overlap_and_skip_background() {
        assert_eq!(pick_base(0), 1);
        assert_eq!(pick_base(1), 1 + PICK_BLOCK);
        assert_eq!(pick_base(2), 1 + 2 * PICK_BLOCK);
        // 0 is the cleared pick target, never a submesh
        assert!(pick_base(0) > 0);
    }
}
