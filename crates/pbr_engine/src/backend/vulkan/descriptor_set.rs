//! Descriptor layout, pool and the one set binding the uniform buffers
//!
//! Set 0 holds the camera record at binding 0 (vertex and fragment) and the
//! light record at binding 1 (fragment only). It is written once; the buffers
//! behind it are updated in place through their mappings.

use ash::{vk, Device};

use super::context::{VulkanError, VulkanResult};

/// Descriptor set layout builder
#[derive(Default)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a uniform buffer binding
    pub fn add_uniform_buffer(mut self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Bindings added so far
    pub fn bindings(&self) -> &[vk::DescriptorSetLayoutBinding] {
        &self.bindings
    }

    /// Build the descriptor set layout
    pub fn build(self, device: &Device) -> VulkanResult<DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);
        let layout = unsafe { device.create_descriptor_set_layout(&layout_info, None)? };

        Ok(DescriptorSetLayout {
            layout,
            device: device.clone(),
        })
    }
}

/// Descriptor set layout wrapper with automatic cleanup
pub struct DescriptorSetLayout {
    layout: vk::DescriptorSetLayout,
    device: Device,
}

impl DescriptorSetLayout {
    /// Get the layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Descriptor pool for uniform buffer sets
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    device: Device,
}

impl DescriptorPool {
    /// Create a pool with room for `uniform_buffers` descriptors across `max_sets` sets
    pub fn new(device: Device, uniform_buffers: u32, max_sets: u32) -> VulkanResult<Self> {
        let pool_sizes = [vk::DescriptorPoolSize::builder()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(uniform_buffers)
            .build()];

        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(max_sets)
            .pool_sizes(&pool_sizes);

        let pool = unsafe { device.create_descriptor_pool(&pool_info, None)? };
        Ok(Self { pool, device })
    }

    /// Allocate one set per layout
    pub fn allocate_descriptor_sets(&self, layouts: &[vk::DescriptorSetLayout]) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        Ok(unsafe { self.device.allocate_descriptor_sets(&alloc_info)? })
    }

    /// Get the pool handle
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Uniform buffer descriptors
pub const UNIFORM_DESCRIPTOR_COUNT: u32 = 4;
/// Sets the pool can hand out
pub const MAX_DESCRIPTOR_SETS: u32 = 2;

/// Pool, layout and the single allocated set
///
/// The set is freed together with the pool.
pub struct PbrDescriptors {
    /// Layout shared with the pipeline layout
    pub layout: DescriptorSetLayout,
    /// Pool the set came from
    pub pool: DescriptorPool,
    /// Set bound for every draw
    pub set: vk::DescriptorSet,
}

/// Layout bindings for the camera and light records
pub fn pbr_layout_builder() -> DescriptorSetLayoutBuilder {
    DescriptorSetLayoutBuilder::new()
        .add_uniform_buffer(0, vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
        .add_uniform_buffer(1, vk::ShaderStageFlags::FRAGMENT)
}

/// Create the pool, layout and set, and point the set at both buffers
pub fn build_descriptors(
    device: &Device,
    camera_buffer: (vk::Buffer, vk::DeviceSize),
    light_buffer: (vk::Buffer, vk::DeviceSize),
) -> VulkanResult<PbrDescriptors> {
    let pool = DescriptorPool::new(device.clone(), UNIFORM_DESCRIPTOR_COUNT, MAX_DESCRIPTOR_SETS)?;
    let layout = pbr_layout_builder().build(device)?;

    let set = pool
        .allocate_descriptor_sets(&[layout.handle()])?
        .into_iter()
        .next()
        .ok_or_else(|| VulkanError::InitializationFailed("Descriptor pool returned no sets".to_string()))?;

    let camera_info = [vk::DescriptorBufferInfo {
        buffer: camera_buffer.0,
        offset: 0,
        range: camera_buffer.1,
    }];
    let light_info = [vk::DescriptorBufferInfo {
        buffer: light_buffer.0,
        offset: 0,
        range: light_buffer.1,
    }];

    let writes = [
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(0)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&camera_info)
            .build(),
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(1)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&light_info)
            .build(),
    ];
    unsafe { device.update_descriptor_sets(&writes, &[]) };

    log::debug!("Descriptor set written (camera {} bytes, lights {} bytes)", camera_buffer.1, light_buffer.1);
    Ok(PbrDescriptors { layout, pool, set })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbr_layout_bindings() {
        let builder = pbr_layout_builder();
        let bindings = builder.bindings();

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].binding, 0);
        assert_eq!(
            bindings[0].stage_flags,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
        );
        assert_eq!(bindings[1].binding, 1);
        assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
        assert!(bindings
            .iter()
            .all(|b| b.descriptor_type == vk::DescriptorType::UNIFORM_BUFFER && b.descriptor_count == 1));
    }
}
