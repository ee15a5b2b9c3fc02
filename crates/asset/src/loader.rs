//! Two-stage scene load: material library first, then geometry bound to
//! those materials. Stage 2 never starts before stage 1 has resolved, and
//! a failure at any point aborts the whole load with a single [`LoadError`].

use std::{
    collections::HashMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::mesh::MeshData;
use crate::mtl::{self, Material, MaterialLib};
use crate::obj;
use crate::progress::ProgressEvent;
use crate::texture::TextureData;

/// The one error kind a load can produce. Missing resources, I/O failures
/// and parse failures are not distinguished beyond the carried cause.
#[derive(Debug, Error)]
#[error("failed to load '{resource}': {cause:#}")]
pub struct LoadError {
    pub resource: String,
    pub cause: anyhow::Error,
}

impl LoadError {
    pub fn new(resource: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            resource: resource.into(),
            cause: cause.into(),
        }
    }
}

/// Resolved payload of a successful load: the mesh, the material library
/// (opacity already forced) and every texture the materials reference,
/// decoded eagerly so nothing pops in after the first frame.
#[derive(Clone, Debug)]
pub struct LoadedObject {
    pub mesh: MeshData,
    pub materials: MaterialLib,
    pub textures: HashMap<String, TextureData>,
}

impl LoadedObject {
    /// The material the mesh binds via `usemtl`, falling back to the first
    /// one in the library.
    pub fn material(&self) -> Option<&Material> {
        match self.mesh.material_name.as_deref() {
            Some(name) => self.materials.get(name),
            None => self.materials.materials.first(),
        }
    }

    /// Decoded diffuse texture of the bound material, if it has one.
    pub fn diffuse_texture(&self) -> Option<&TextureData> {
        let map = self.material()?.diffuse_map.as_deref()?;
        self.textures.get(map)
    }
}

/// Source of resource bytes. Production reads from disk; tests script
/// responses and count calls.
pub trait FetchResource {
    fn fetch(
        &mut self,
        name: &str,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Vec<u8>, LoadError>;
}

/// Filesystem fetcher rooted at an asset directory. Reads in chunks and
/// emits one progress event per chunk so observers see byte progress the
/// same way a streaming transport would surface it.
pub struct FsFetcher {
    root: PathBuf,
    chunk_size: usize,
}

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    #[cfg(test)]
    fn with_chunk_size(root: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            root: root.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        // Resource names may carry a leading separator (URL-style); strip
        // it so they stay relative to the asset root.
        let relative = name.trim_start_matches('/');
        self.root.join(relative)
    }
}

impl FetchResource for FsFetcher {
    fn fetch(
        &mut self,
        name: &str,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Vec<u8>, LoadError> {
        let path = self.resolve(name);
        read_chunked(&path, self.chunk_size, name, progress)
            .map_err(|e| LoadError::new(name, e))
    }
}

fn read_chunked(
    path: &Path,
    chunk_size: usize,
    name: &str,
    progress: &mut dyn FnMut(ProgressEvent),
) -> anyhow::Result<Vec<u8>> {
    use anyhow::Context;

    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let total = file
        .metadata()
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();

    let mut data = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let read = file
            .read(&mut chunk)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);
        progress(ProgressEvent {
            source: name.to_string(),
            loaded: data.len() as u64,
            total,
        });
    }

    if data.is_empty() {
        // Still one observation for empty files.
        progress(ProgressEvent {
            source: name.to_string(),
            loaded: 0,
            total,
        });
    }
    Ok(data)
}

/// Load the viewer scene: materials first, then geometry.
///
/// Stage 1 fetches and parses the MTL resource, forces every material
/// fully opaque, and eagerly decodes every referenced texture. Stage 2
/// fetches and parses the OBJ resource against that material set. Both
/// stages stream byte progress through `progress` with no stage label.
pub fn load_scene<F: FetchResource>(
    fetcher: &mut F,
    mtl_name: &str,
    obj_name: &str,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Result<LoadedObject, LoadError> {
    // Stage 1: material definitions.
    let bytes = fetcher.fetch(mtl_name, progress)?;
    let text = std::str::from_utf8(&bytes).map_err(|e| LoadError::new(mtl_name, e))?;
    let mut materials = mtl::load_mtl_from_str(text).map_err(|e| LoadError::new(mtl_name, e))?;
    materials.force_opaque();

    // Materialize referenced textures now rather than at first draw.
    let mut textures = HashMap::new();
    for map in materials.texture_names() {
        if textures.contains_key(map) {
            continue;
        }
        let bytes = fetcher.fetch(map, &mut |_| {})?;
        let tex = TextureData::decode(&bytes).map_err(|e| LoadError::new(map, e))?;
        textures.insert(map.to_string(), tex);
    }

    // Stage 2: geometry, bound to the stage-1 materials.
    let bytes = fetcher.fetch(obj_name, progress)?;
    let text = std::str::from_utf8(&bytes).map_err(|e| LoadError::new(obj_name, e))?;
    let mesh = obj::load_obj_from_str(text).map_err(|e| LoadError::new(obj_name, e))?;

    Ok(LoadedObject {
        mesh,
        materials,
        textures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    const MTL: &str = "newmtl white\nKd 0.9 0.9 0.9\nd 0.2\n";
    const OBJ: &str = "usemtl white\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    /// Scripted resource map that records the order of fetches.
    struct ScriptedFetcher {
        resources: HashMap<String, Vec<u8>>,
        fetched: Vec<String>,
    }

    impl ScriptedFetcher {
        fn new(resources: &[(&str, &[u8])]) -> Self {
            Self {
                resources: resources
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_vec()))
                    .collect(),
                fetched: Vec::new(),
            }
        }
    }

    impl FetchResource for ScriptedFetcher {
        fn fetch(
            &mut self,
            name: &str,
            progress: &mut dyn FnMut(ProgressEvent),
        ) -> Result<Vec<u8>, LoadError> {
            self.fetched.push(name.to_string());
            let data = self
                .resources
                .get(name)
                .cloned()
                .ok_or_else(|| LoadError::new(name, anyhow!("no such resource")))?;
            progress(ProgressEvent {
                source: name.to_string(),
                loaded: data.len() as u64,
                total: data.len() as u64,
            });
            Ok(data)
        }
    }

    fn tiny_png() -> Vec<u8> {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode png");
        png
    }

    #[test]
    fn successful_load_yields_opaque_object() {
        let mut fetcher =
            ScriptedFetcher::new(&[("cube.mtl", MTL.as_bytes()), ("cube.obj", OBJ.as_bytes())]);
        let mut events = Vec::new();
        let object = load_scene(&mut fetcher, "cube.mtl", "cube.obj", &mut |e| events.push(e))
            .expect("load succeeds");

        assert_eq!(fetcher.fetched, vec!["cube.mtl", "cube.obj"]);
        assert!(object.mesh.is_valid());
        assert_eq!(object.mesh.material_name.as_deref(), Some("white"));
        // Dissolve from the file is overridden.
        assert_eq!(object.material().unwrap().dissolve, 1.0);
        // Progress flowed for both stages through the one callback.
        assert!(events.iter().any(|e| e.source == "cube.mtl"));
        assert!(events.iter().any(|e| e.source == "cube.obj"));
    }

    #[test]
    fn material_failure_skips_geometry_fetch() {
        let mut fetcher = ScriptedFetcher::new(&[("cube.obj", OBJ.as_bytes())]);
        let err = load_scene(&mut fetcher, "cube.mtl", "cube.obj", &mut |_| {})
            .expect_err("mtl is missing");
        assert_eq!(err.resource, "cube.mtl");
        assert_eq!(fetcher.fetched, vec!["cube.mtl"]);
    }

    #[test]
    fn geometry_failure_fails_the_whole_load() {
        let mut fetcher = ScriptedFetcher::new(&[
            ("cube.mtl", MTL.as_bytes()),
            ("cube.obj", b"f 9 9 9\n".as_slice()),
        ]);
        let err = load_scene(&mut fetcher, "cube.mtl", "cube.obj", &mut |_| {})
            .expect_err("obj is malformed");
        assert_eq!(err.resource, "cube.obj");
    }

    #[test]
    fn referenced_textures_are_fetched_between_stages() {
        let png = tiny_png();
        let mtl = "newmtl a\nmap_Kd checker.png\n";
        let obj = "usemtl a\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mut fetcher = ScriptedFetcher::new(&[
            ("cube.mtl", mtl.as_bytes()),
            ("checker.png", png.as_slice()),
            ("cube.obj", obj.as_bytes()),
        ]);
        let object = load_scene(&mut fetcher, "cube.mtl", "cube.obj", &mut |_| {})
            .expect("load succeeds");

        assert_eq!(fetcher.fetched, vec!["cube.mtl", "checker.png", "cube.obj"]);
        let tex = object.diffuse_texture().expect("decoded texture");
        assert_eq!((tex.width, tex.height), (1, 1));
    }

    #[test]
    fn undecodable_texture_fails_stage_one() {
        let mtl = "newmtl a\nmap_Kd checker.png\n";
        let mut fetcher = ScriptedFetcher::new(&[
            ("cube.mtl", mtl.as_bytes()),
            ("checker.png", b"garbage".as_slice()),
            ("cube.obj", OBJ.as_bytes()),
        ]);
        let err = load_scene(&mut fetcher, "cube.mtl", "cube.obj", &mut |_| {})
            .expect_err("texture is garbage");
        assert_eq!(err.resource, "checker.png");
        assert!(!fetcher.fetched.contains(&"cube.obj".to_string()));
    }

    #[test]
    fn fs_fetcher_streams_chunked_progress() {
        let dir = tempfile::tempdir().expect("tempdir");
        let payload = vec![7u8; 100];
        std::fs::write(dir.path().join("blob.bin"), &payload).expect("write blob");

        let mut fetcher = FsFetcher::with_chunk_size(dir.path(), 32);
        let mut events = Vec::new();
        let data = fetcher
            .fetch("blob.bin", &mut |e| events.push(e))
            .expect("fetch succeeds");

        assert_eq!(data, payload);
        assert_eq!(events.len(), 4); // 32 + 32 + 32 + 4
        assert!(events.windows(2).all(|w| w[0].loaded < w[1].loaded));
        let last = events.last().unwrap();
        assert_eq!(last.loaded, 100);
        assert_eq!(last.total, 100);
    }

    #[test]
    fn fs_fetcher_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut fetcher = FsFetcher::new(dir.path());
        let err = fetcher
            .fetch("missing.obj", &mut |_| {})
            .expect_err("file does not exist");
        assert_eq!(err.resource, "missing.obj");
    }

    #[test]
    fn fs_fetcher_strips_leading_separator() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("cube.mtl"), MTL).expect("write mtl");
        let mut fetcher = FsFetcher::new(dir.path());
        assert!(fetcher.fetch("/cube.mtl", &mut |_| {}).is_ok());
    }
}
