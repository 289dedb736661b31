//! Loading of meshes, textures and pick resources from external files.
//!
//! All paths resolve inside the `assets/` tree: next to the executable
//! natively (the build script stages a copy for `cargo run`), relative to the
//! site origin on wasm32 (fetched over HTTP). GLB parsing is split into a CPU
//! stage ([`glb`]) and a GPU upload stage so import behaviour is testable
//! without a device.

pub mod glb;
pub mod pick;
pub mod texture;

pub use glb::{load_billboard_glb, parse_billboard_glb, upload_billboard};
pub use texture::{load_animated_texture, load_texture, material_layout};

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> reqwest::Url {
    let window = web_sys::window().unwrap();
    let location = window.location();
    let origin = location.origin().unwrap();
    let base = reqwest::Url::parse(&format!("{}/assets/", origin)).unwrap();
    base.join(file_name).unwrap()
}

/// An asset tree next to the executable wins (the deployed layout); `cargo`
/// invocations fall back to the copy the build script staged in `OUT_DIR`.
#[cfg(not(target_arch = "wasm32"))]
fn asset_path(file_name: &str) -> std::path::PathBuf {
    let deployed = std::env::current_exe()
        .ok()
        .and_then(|exe| Some(exe.parent()?.join("assets")))
        .filter(|dir| dir.is_dir());
    match deployed {
        Some(dir) => dir.join(file_name),
        None => std::path::Path::new(env!("OUT_DIR"))
            .join("assets")
            .join(file_name),
    }
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name);
        reqwest::get(url).await?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = std::fs::read_to_string(asset_path(file_name))?;

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name);
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = std::fs::read(asset_path(file_name))?;

    Ok(data)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn asset_paths_land_inside_a_real_assets_tree() {
        let path = asset_path("showcase.ron");
        assert!(path.ends_with("assets/showcase.ron"));
        // Either the deployed tree or the staged build-output copy exists
        assert!(path.parent().unwrap().is_dir());
    }
}
