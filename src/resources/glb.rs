//! GLB import: CPU-side parsing split from GPU upload.
//!
//! [`parse_billboard_glb`] turns GLB bytes into named submeshes and the node
//! transform; [`upload_billboard`] turns the parsed data into a [`Model`] with
//! GPU buffers and a neutral default material. The split keeps the submesh
//! naming contract and accessor handling testable without a device.
//!
//! Naming contract: a mesh with a single primitive keeps the mesh name; with
//! several primitives the first keeps the mesh name and primitive `i` (i > 0)
//! becomes `{mesh_name}_primitive{i}`, matching how the assets were authored.

use std::io::{BufReader, Cursor};

use anyhow::{Context as _, bail};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{Material, MaterialParams, Mesh, Model, ModelVertex},
        texture::Texture,
    },
    resources::{load_binary, texture::material_layout},
};

/// One named primitive of an imported mesh, still on the CPU.
#[derive(Debug, Clone)]
pub struct SubmeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

/// The CPU-side result of a GLB import.
#[derive(Debug, Clone)]
pub struct BillboardData {
    pub submeshes: Vec<SubmeshData>,
    /// Decomposed transform of the node carrying the first mesh.
    pub transform: Instance,
}

impl BillboardData {
    pub fn submesh_index(&self, name: &str) -> Option<usize> {
        self.submeshes.iter().position(|s| s.name == name)
    }

    pub fn submesh_names(&self) -> Vec<&str> {
        self.submeshes.iter().map(|s| s.name.as_str()).collect()
    }
}

pub fn primitive_name(mesh_name: &str, index: usize, primitive_count: usize) -> String {
    if primitive_count <= 1 || index == 0 {
        mesh_name.to_string()
    } else {
        format!("{mesh_name}_primitive{index}")
    }
}

/// Parse self-contained GLB bytes into submeshes and a node transform.
pub fn parse_billboard_glb(bytes: &[u8]) -> anyhow::Result<BillboardData> {
    let gltf_cursor = Cursor::new(bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                bail!("GLB references an external buffer ({uri}); only self-contained files are supported");
            }
        }
    }

    let mut submeshes = Vec::new();
    let mut transform = None;

    for scene in gltf.scenes() {
        for node in scene.nodes() {
            collect_node(&node, &buffer_data, &mut submeshes, &mut transform)?;
        }
    }

    Ok(BillboardData {
        submeshes,
        transform: transform.unwrap_or_default(),
    })
}

fn collect_node(
    node: &gltf::scene::Node,
    buffer_data: &[Vec<u8>],
    submeshes: &mut Vec<SubmeshData>,
    transform: &mut Option<Instance>,
) -> anyhow::Result<()> {
    if let Some(mesh) = node.mesh() {
        if transform.is_none() {
            let (position, rotation, scale) = node.transform().decomposed();
            *transform = Some(Instance {
                position: position.into(),
                rotation: rotation.into(),
                scale: scale.into(),
            });
        }
        let mesh_name = mesh.name().unwrap_or("unknown_mesh");
        let primitive_count = mesh.primitives().count();
        for (index, primitive) in mesh.primitives().enumerate() {
            let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

            let positions = reader
                .read_positions()
                .with_context(|| format!("primitive {index} of {mesh_name} has no positions"))?;
            let mut vertices: Vec<ModelVertex> = positions
                .map(|position| ModelVertex {
                    position,
                    tex_coords: Default::default(),
                    normal: Default::default(),
                })
                .collect();

            if let Some(normals) = reader.read_normals() {
                for (vertex, normal) in vertices.iter_mut().zip(normals) {
                    vertex.normal = normal;
                }
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|tc| tc.into_f32()) {
                for (vertex, tex_coord) in vertices.iter_mut().zip(tex_coords) {
                    vertex.tex_coords = tex_coord;
                }
            }

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                // Non-indexed geometry draws vertices in order
                None => (0..vertices.len() as u32).collect(),
            };

            submeshes.push(SubmeshData {
                name: primitive_name(mesh_name, index, primitive_count),
                vertices,
                indices,
            });
        }
    }
    for child in node.children() {
        collect_node(&child, buffer_data, submeshes, transform)?;
    }
    Ok(())
}

/// Load and parse a GLB from the asset tree.
pub async fn load_billboard_glb(file_name: &str) -> anyhow::Result<BillboardData> {
    let bytes = load_binary(file_name)
        .await
        .with_context(|| format!("reading {file_name}"))?;
    parse_billboard_glb(&bytes).with_context(|| format!("parsing {file_name}"))
}

/// Turn parsed billboard data into a model with GPU buffers.
///
/// Every submesh starts out with a shared neutral material; texture bindings
/// replace it per submesh once their loads resolve.
pub fn upload_billboard(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &BillboardData,
    label: &str,
) -> Model {
    let layout = material_layout(device);
    let fallback = Texture::solid_colour([180, 180, 180, 255], device, queue, label);
    let default_material = Material::new(
        device,
        &format!("{label} default material"),
        fallback,
        MaterialParams::lit(false),
        &layout,
    );

    let meshes = data
        .submeshes
        .iter()
        .map(|submesh| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", submesh.name)),
                contents: bytemuck::cast_slice(&submesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", submesh.name)),
                contents: bytemuck::cast_slice(&submesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            Mesh {
                name: submesh.name.clone(),
                vertex_buffer,
                index_buffer,
                num_elements: submesh.indices.len() as u32,
                material: 0,
            }
        })
        .collect();

    Model {
        meshes,
        materials: vec![default_material],
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a minimal self-contained GLB in memory: one node with a
    /// translation, one mesh with `primitives` quads (positions + uvs,
    /// indexed u16).
    pub(crate) fn synth_glb(mesh_name: &str, primitives: usize) -> Vec<u8> {
        // BIN chunk: 4 positions (vec3), 4 uvs (vec2), 6 indices (u16, padded)
        let positions: [f32; 12] = [
            -1.0, -1.0, 0.0, //
            1.0, -1.0, 0.0, //
            1.0, 1.0, 0.0, //
            -1.0, 1.0, 0.0,
        ];
        let uvs: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];

        let mut bin: Vec<u8> = Vec::new();
        for f in positions.iter().chain(uvs.iter()) {
            bin.extend_from_slice(&f.to_le_bytes());
        }
        let index_offset = bin.len();
        for i in indices {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let prims: Vec<String> = (0..primitives)
            .map(|_| {
                r#"{"attributes":{"POSITION":0,"TEXCOORD_0":1},"indices":2}"#.to_string()
            })
            .collect();
        let json = format!(
            concat!(
                r#"{{"asset":{{"version":"2.0"}},"#,
                r#""scenes":[{{"nodes":[0]}}],"scene":0,"#,
                r#""nodes":[{{"mesh":0,"translation":[1.0,2.0,3.0]}}],"#,
                r#""meshes":[{{"name":"{name}","primitives":[{prims}]}}],"#,
                r#""buffers":[{{"byteLength":{bin_len}}}],"#,
                r#""bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":48}},"#,
                r#"{{"buffer":0,"byteOffset":48,"byteLength":32}},"#,
                r#"{{"buffer":0,"byteOffset":{idx_off},"byteLength":12}}],"#,
                r#""accessors":[{{"bufferView":0,"componentType":5126,"count":4,"type":"VEC3","min":[-1.0,-1.0,0.0],"max":[1.0,1.0,0.0]}},"#,
                r#"{{"bufferView":1,"componentType":5126,"count":4,"type":"VEC2"}},"#,
                r#"{{"bufferView":2,"componentType":5123,"count":6,"type":"SCALAR"}}]}}"#,
            ),
            name = mesh_name,
            prims = prims.join(","),
            bin_len = bin.len(),
            idx_off = index_offset,
        );

        let mut json_bytes = json.into_bytes();
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }

        let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json_bytes);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&[0x42, 0x49, 0x4E, 0x00]); // "BIN\0"
        glb.extend_from_slice(&bin);
        glb
    }

    #[test]
    fn single_primitive_keeps_the_mesh_name() {
        let glb = synth_glb("Billboard_1920x1080_001", 1);
        let data = parse_billboard_glb(&glb).unwrap();
        assert_eq!(data.submesh_names(), vec!["Billboard_1920x1080_001"]);
    }

    #[test]
    fn later_primitives_get_numbered_names() {
        let glb = synth_glb("Billboard_1920x1080_001", 3);
        let data = parse_billboard_glb(&glb).unwrap();
        assert_eq!(
            data.submesh_names(),
            vec![
                "Billboard_1920x1080_001",
                "Billboard_1920x1080_001_primitive1",
                "Billboard_1920x1080_001_primitive2",
            ]
        );
    }

    #[test]
    fn vertices_and_indices_survive_the_import() {
        let glb = synth_glb("Quad", 1);
        let data = parse_billboard_glb(&glb).unwrap();
        let quad = &data.submeshes[0];
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(quad.vertices[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(quad.vertices[2].tex_coords, [1.0, 1.0]);
        // No normals in the file; permissive default
        assert_eq!(quad.vertices[2].normal, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn node_translation_is_decomposed_into_the_transform() {
        let glb = synth_glb("Quad", 1);
        let data = parse_billboard_glb(&glb).unwrap();
        assert_eq!(data.transform.position, cgmath::Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(data.transform.scale, cgmath::Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn unknown_submesh_lookup_is_a_clean_miss() {
        let glb = synth_glb("Quad", 2);
        let data = parse_billboard_glb(&glb).unwrap();
        assert_eq!(data.submesh_index("Quad_primitive1"), Some(1));
        assert_eq!(data.submesh_index("NotThere"), None);
    }

    #[test]
    fn garbage_bytes_are_an_error_not_a_panic() {
        assert!(parse_billboard_glb(b"not a glb at all").is_err());
    }
}
