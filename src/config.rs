//! Scene manifest loading.
//!
//! The showcase is described by a RON manifest listing the billboards to
//! import and the texture bindings to apply to their submeshes. A missing or
//! malformed manifest is not fatal: the built-in scene is used instead so the
//! window never comes up empty.

use serde::{Deserialize, Serialize};

use crate::resources::load_string;

/// Where the pixels for a bound submesh come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureSource {
    /// A still image (PNG/JPEG), uploaded once.
    Image(String),
    /// An animated GIF treated as a looping video; frames are re-uploaded
    /// on their own timeline.
    Video(String),
}

/// One submesh-to-texture binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureBinding {
    /// Name of the submesh to rebind, e.g. `Billboard_1920x1080_001_primitive2`.
    pub submesh: String,
    pub source: TextureSource,
    /// Name given to the created material, visible in debug labels.
    #[serde(default = "default_material_name")]
    pub material: String,
    /// Route the submesh to the additive glow pass instead of the lit pass.
    #[serde(default)]
    pub glow: bool,
    /// Flip texture coordinates vertically. GLB assets exported with the
    /// opposite UV convention need this, so it is the default.
    #[serde(default = "default_flip_v")]
    pub flip_v: bool,
}

/// One billboard to import and place in the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillboardConfig {
    /// GLB file under `assets/`.
    pub glb: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub bindings: Vec<TextureBinding>,
}

/// Top-level showcase manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowcaseConfig {
    /// Horizontal gap between billboard centres in world units.
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    pub billboards: Vec<BillboardConfig>,
}

fn default_material_name() -> String {
    "billboardMaterial".to_string()
}

fn default_flip_v() -> bool {
    true
}

fn default_scale() -> f32 {
    0.5
}

fn default_spacing() -> f32 {
    3.0
}

impl Default for ShowcaseConfig {
    /// The built-in scene: two billboards, one with still images on its
    /// screens and one demonstrating the glow and video bindings.
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
            billboards: vec![
                BillboardConfig {
                    glb: "models/billboard.glb".to_string(),
                    scale: default_scale(),
                    bindings: vec![
                        TextureBinding {
                            submesh: "Billboard_1920x1080_001_primitive2".to_string(),
                            source: TextureSource::Image("images/happy_dog.jpg".to_string()),
                            material: "billboardMaterial".to_string(),
                            glow: false,
                            flip_v: true,
                        },
                        TextureBinding {
                            submesh: "Billboard_1920x1080_001_primitive1".to_string(),
                            source: TextureSource::Image("images/bad_meow.jpg".to_string()),
                            material: "badMeowMaterial".to_string(),
                            glow: false,
                            flip_v: true,
                        },
                    ],
                },
                BillboardConfig {
                    glb: "models/billboard.glb".to_string(),
                    scale: default_scale(),
                    bindings: vec![
                        TextureBinding {
                            submesh: "Billboard_1920x1080_001_primitive2".to_string(),
                            source: TextureSource::Video("videos/news_loop.gif".to_string()),
                            material: "newsLoopMaterial".to_string(),
                            glow: false,
                            flip_v: true,
                        },
                        TextureBinding {
                            submesh: "Billboard_1920x1080_001_primitive1".to_string(),
                            source: TextureSource::Image("images/neon_sign.png".to_string()),
                            material: "neonSignMaterial".to_string(),
                            glow: true,
                            flip_v: true,
                        },
                    ],
                },
            ],
        }
    }
}

impl ShowcaseConfig {
    pub fn from_ron(contents: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(contents)?)
    }

    /// Load a manifest from `assets/`, falling back to the built-in scene
    /// when the file is missing or malformed.
    pub async fn load(file_name: &str) -> Self {
        match load_string(file_name).await {
            Ok(contents) => match Self::from_ron(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!(
                        "Manifest {} could not be parsed ({}), using the built-in scene",
                        file_name,
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!(
                    "Manifest {} could not be read ({}), using the built-in scene",
                    file_name,
                    e
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_manifest() {
        let manifest = r#"
            ShowcaseConfig(
                spacing: 4.5,
                billboards: [
                    BillboardConfig(
                        glb: "tower.glb",
                        scale: 1.0,
                        bindings: [
                            TextureBinding(
                                submesh: "Screen_primitive1",
                                source: Video("ad.gif"),
                                material: "adMaterial",
                                glow: true,
                                flip_v: false,
                            ),
                        ],
                    ),
                ],
            )
        "#;
        let config = ShowcaseConfig::from_ron(manifest).unwrap();
        assert_eq!(config.spacing, 4.5);
        assert_eq!(config.billboards.len(), 1);
        let binding = &config.billboards[0].bindings[0];
        assert_eq!(binding.submesh, "Screen_primitive1");
        assert_eq!(binding.source, TextureSource::Video("ad.gif".to_string()));
        assert!(binding.glow);
        assert!(!binding.flip_v);
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let manifest = r#"
            ShowcaseConfig(
                billboards: [
                    BillboardConfig(
                        glb: "tower.glb",
                        bindings: [
                            TextureBinding(
                                submesh: "Screen",
                                source: Image("poster.png"),
                            ),
                        ],
                    ),
                ],
            )
        "#;
        let config = ShowcaseConfig::from_ron(manifest).unwrap();
        assert_eq!(config.spacing, 3.0);
        assert_eq!(config.billboards[0].scale, 0.5);
        let binding = &config.billboards[0].bindings[0];
        assert_eq!(binding.material, "billboardMaterial");
        assert!(!binding.glow);
        assert!(binding.flip_v);
    }

    #[test]
    fn garbage_manifest_is_an_error() {
        assert!(ShowcaseConfig::from_ron("not even close").is_err());
    }

    #[test]
    fn built_in_scene_binds_both_screens() {
        let config = ShowcaseConfig::default();
        assert_eq!(config.billboards.len(), 2);
        assert!(
            config.billboards[0]
                .bindings
                .iter()
                .any(|b| b.submesh.ends_with("_primitive1"))
        );
        assert!(
            config.billboards[1]
                .bindings
                .iter()
                .any(|b| matches!(b.source, TextureSource::Video(_)))
        );
    }
}
