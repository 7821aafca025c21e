//! Framebuffers and the depth attachment they share

use ash::{vk, Device};

use super::context::{PhysicalDeviceInfo, VulkanResult};

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a framebuffer over `attachments`
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.create_framebuffer(&create_info, None)? };
        Ok(Self { device, framebuffer })
    }

    /// One framebuffer per swapchain image, all sharing `depth_view`
    pub fn for_swapchain(
        device: &Device,
        render_pass: vk::RenderPass,
        color_views: &[vk::ImageView],
        depth_view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> VulkanResult<Vec<Self>> {
        color_views
            .iter()
            .map(|&color_view| Self::new(device.clone(), render_pass, &[color_view, depth_view], extent))
            .collect()
    }

    /// Get the framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// Depth image, memory and view with RAII cleanup
pub struct DepthBuffer {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    image_view: vk::ImageView,
    format: vk::Format,
}

impl DepthBuffer {
    /// Create a device-local depth buffer of `format`
    pub fn new(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe { device.create_image(&image_create_info, None)? };
        let memory_requirements = unsafe { device.get_image_memory_requirements(image) };

        let memory = release_on_error(
            physical_device
                .find_memory_type(memory_requirements.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)
                .and_then(|memory_type_index| {
                    let alloc_info = vk::MemoryAllocateInfo::builder()
                        .allocation_size(memory_requirements.size)
                        .memory_type_index(memory_type_index);
                    Ok(unsafe { device.allocate_memory(&alloc_info, None)? })
                }),
            || unsafe { device.destroy_image(image, None) },
        )?;

        // From here on Drop releases the image and memory; a null view is skipped by Vulkan
        let mut depth_buffer = Self {
            device,
            image,
            memory,
            image_view: vk::ImageView::null(),
            format,
        };
        unsafe { depth_buffer.device.bind_image_memory(image, memory, 0)? };

        let image_view_create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        depth_buffer.image_view = unsafe { depth_buffer.device.create_image_view(&image_view_create_info, None)? };
        Ok(depth_buffer)
    }

    /// Get the image view handle
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Depth format in use
    pub fn format(&self) -> vk::Format {
        self.format
    }
}

/// Run `release` when `result` is an error, then pass the result through
fn release_on_error<T>(result: VulkanResult<T>, release: impl FnOnce()) -> VulkanResult<T> {
    if result.is_err() {
        release();
    }
    result
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::vulkan::context::VulkanError;

    #[test]
    fn test_release_on_error_only_runs_for_errors() {
        let mut released = false;
        let result = release_on_error(Ok(7), || released = true);
        assert_eq!(result.ok(), Some(7));
        assert!(!released);

        let result: VulkanResult<u32> =
            release_on_error(Err(VulkanError::NoSuitableMemoryType), || released = true);
        assert!(matches!(result, Err(VulkanError::NoSuitableMemoryType)));
        assert!(released);
    }
}
