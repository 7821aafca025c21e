//! GPU-resident meshes for the selectable objects

use ash::{vk, Device};

use super::buffer::Buffer;
use super::context::PhysicalDeviceInfo;
use crate::assets::{FileLoadingFlags, MeshData, ModelLoader};
use crate::core::config::AssetConfig;
use crate::render::{ObjectKind, RenderResult};

/// Vertex and index buffers for one model
pub struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

impl GpuMesh {
    /// Upload loaded mesh data into host-visible buffers
    pub fn upload(device: &Device, physical_device: &PhysicalDeviceInfo, mesh: &MeshData) -> RenderResult<Self> {
        let vertex_buffer = Buffer::with_data(
            device.clone(),
            physical_device,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            &mesh.vertices,
        )?;
        let index_buffer = Buffer::with_data(
            device.clone(),
            physical_device,
            vk::BufferUsageFlags::INDEX_BUFFER,
            &mesh.indices,
        )?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        })
    }

    /// Vertex buffer handle
    pub fn vertex_buffer(&self) -> vk::Buffer {
        self.vertex_buffer.handle()
    }

    /// Index buffer handle; indices are u32
    pub fn index_buffer(&self) -> vk::Buffer {
        self.index_buffer.handle()
    }

    /// Indices drawn per instance
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// One mesh per [`ObjectKind`], in catalog order
pub struct SceneMeshes {
    meshes: Vec<GpuMesh>,
}

impl SceneMeshes {
    /// Load every object model from the assets directory
    pub fn load(device: &Device, physical_device: &PhysicalDeviceInfo, assets: &AssetConfig) -> RenderResult<Self> {
        let flags = FileLoadingFlags::PRE_TRANSFORM_VERTICES | FileLoadingFlags::FLIP_Y;

        let meshes = ObjectKind::ALL
            .iter()
            .map(|object| {
                let data = ModelLoader::load(assets.model_path(object.file_name()), flags)?;
                GpuMesh::upload(device, physical_device, &data)
            })
            .collect::<RenderResult<Vec<_>>>()?;

        log::info!("Uploaded {} object meshes", meshes.len());
        Ok(Self { meshes })
    }

    /// Mesh for `object`
    pub fn get(&self, object: ObjectKind) -> Option<&GpuMesh> {
        self.meshes.get(object.index())
    }
}
