//! glTF mesh loading
//!
//! Flattens every triangle primitive reachable from the default scene into a
//! single indexed mesh holding positions and normals.

use std::path::Path;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use super::AssetError;
use crate::foundation::math::{Mat3, Mat4, Vec3};

bitflags! {
    /// Post-processing applied while loading a model
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileLoadingFlags: u32 {
        /// Bake node transforms into vertex positions and normals
        const PRE_TRANSFORM_VERTICES = 1 << 0;
        /// Negate the Y component of positions and normals
        const FLIP_Y = 1 << 1;
    }
}

/// Vertex layout consumed by the PBR pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position (location 0)
    pub position: [f32; 3],
    /// Object-space normal (location 1)
    pub normal: [f32; 3],
}

impl Vertex {
    /// Size of one vertex in the vertex buffer
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;
    /// Byte offset of the position attribute
    pub const POSITION_OFFSET: u32 = 0;
    /// Byte offset of the normal attribute
    pub const NORMAL_OFFSET: u32 = 12;
}

/// CPU-side mesh ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of indices to draw
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Loads glTF files into [`MeshData`]
pub struct ModelLoader;

impl ModelLoader {
    /// Load a `.gltf` or `.glb` file, resolving external buffers relative to it
    pub fn load<P: AsRef<Path>>(path: P, flags: FileLoadingFlags) -> Result<MeshData, AssetError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        log::debug!("Loading model {name} with {flags:?}");

        let (document, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Import {
            path: name.clone(),
            source,
        })?;

        let mesh = Self::flatten(&document, &buffers, flags, &name)?;
        log::info!(
            "Loaded {name}: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.indices.len()
        );
        Ok(mesh)
    }

    /// Load a self-contained glTF document from memory
    pub fn load_slice(bytes: &[u8], flags: FileLoadingFlags) -> Result<MeshData, AssetError> {
        let (document, buffers, _images) = gltf::import_slice(bytes).map_err(|source| AssetError::Import {
            path: "<memory>".to_string(),
            source,
        })?;

        Self::flatten(&document, &buffers, flags, "<memory>")
    }

    fn flatten(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        flags: FileLoadingFlags,
        name: &str,
    ) -> Result<MeshData, AssetError> {
        let mut mesh = MeshData::default();

        let scene = document.default_scene().or_else(|| document.scenes().next());
        match scene {
            Some(scene) => {
                for node in scene.nodes() {
                    Self::load_node(&node, &Mat4::identity(), buffers, flags, &mut mesh)?;
                }
            }
            None => {
                // No scene graph: take the meshes as they are
                for gltf_mesh in document.meshes() {
                    Self::append_mesh(&gltf_mesh, &Mat4::identity(), buffers, flags, &mut mesh)?;
                }
            }
        }

        if mesh.indices.is_empty() {
            return Err(AssetError::EmptyModel(name.to_string()));
        }
        Ok(mesh)
    }

    fn load_node(
        node: &gltf::Node<'_>,
        parent: &Mat4,
        buffers: &[gltf::buffer::Data],
        flags: FileLoadingFlags,
        mesh: &mut MeshData,
    ) -> Result<(), AssetError> {
        let local = parent * Mat4::from(node.transform().matrix());

        if let Some(gltf_mesh) = node.mesh() {
            Self::append_mesh(&gltf_mesh, &local, buffers, flags, mesh)?;
        }
        for child in node.children() {
            Self::load_node(&child, &local, buffers, flags, mesh)?;
        }
        Ok(())
    }

    fn append_mesh(
        gltf_mesh: &gltf::Mesh<'_>,
        transform: &Mat4,
        buffers: &[gltf::buffer::Data],
        flags: FileLoadingFlags,
        mesh: &mut MeshData,
    ) -> Result<(), AssetError> {
        let mesh_name = gltf_mesh.name().unwrap_or("unnamed").to_string();
        let normal_matrix: Mat3 = transform.fixed_view::<3, 3>(0, 0).into_owned();

        for primitive in gltf_mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping {:?} primitive in mesh '{mesh_name}'", primitive.mode());
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
            let positions = reader.read_positions().ok_or_else(|| AssetError::MissingAttribute {
                mesh: mesh_name.clone(),
                attribute: "POSITION",
            })?;
            let normals: Vec<[f32; 3]> = reader.read_normals().map(Iterator::collect).unwrap_or_default();

            let base_vertex = mesh.vertices.len() as u32;
            for (i, position) in positions.enumerate() {
                let mut position = Vec3::from(position);
                let mut normal = normals.get(i).copied().map_or_else(Vec3::zeros, Vec3::from);

                if flags.contains(FileLoadingFlags::PRE_TRANSFORM_VERTICES) {
                    position = transform.transform_point(&position.into()).coords;
                    let transformed = normal_matrix * normal;
                    normal = transformed.try_normalize(f32::EPSILON).unwrap_or(transformed);
                }
                if flags.contains(FileLoadingFlags::FLIP_Y) {
                    position.y = -position.y;
                    normal.y = -normal.y;
                }

                mesh.vertices.push(Vertex {
                    position: position.into(),
                    normal: normal.into(),
                });
            }

            let vertex_count = mesh.vertices.len() as u32 - base_vertex;
            match reader.read_indices() {
                Some(indices) => mesh.indices.extend(indices.into_u32().map(|index| index + base_vertex)),
                None => mesh.indices.extend(base_vertex..base_vertex + vertex_count),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TRIANGLE: &[u8] = include_bytes!("../../tests/fixtures/triangle.gltf");

    fn fixture_path() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/triangle.gltf")
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(Vertex::STRIDE, 24);
        assert_eq!(std::mem::offset_of!(Vertex, normal) as u32, Vertex::NORMAL_OFFSET);
    }

    #[test]
    fn test_load_raw() {
        let mesh = ModelLoader::load_slice(TRIANGLE, FileLoadingFlags::empty()).unwrap();

        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_pre_transform_and_flip() {
        let flags = FileLoadingFlags::PRE_TRANSFORM_VERTICES | FileLoadingFlags::FLIP_Y;
        let mesh = ModelLoader::load(fixture_path(), flags).unwrap();

        let positions: Vec<_> = mesh.vertices.iter().map(|v| Vec3::from(v.position)).collect();
        assert_relative_eq!(positions[0], Vec3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(positions[1], Vec3::new(1.0, -1.0, 0.0));
        assert_relative_eq!(positions[2], Vec3::new(0.0, -2.0, 0.0));

        // Translation leaves normals alone; flipping Y on (0,0,1) is a no-op
        assert_relative_eq!(Vec3::from(mesh.vertices[0].normal), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_flip_without_pre_transform() {
        let mesh = ModelLoader::load_slice(TRIANGLE, FileLoadingFlags::FLIP_Y).unwrap();
        assert_eq!(mesh.vertices[2].position, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_missing_file() {
        let result = ModelLoader::load("does/not/exist.gltf", FileLoadingFlags::default());
        assert!(matches!(result, Err(AssetError::Import { .. })));
    }
}
