//! Buffer management for mesh data and uniforms
//!
//! Everything lives in HOST_VISIBLE | HOST_COHERENT memory. Uniform buffers
//! stay mapped for their whole lifetime so per-frame updates are plain copies.

use std::marker::PhantomData;

use ash::{vk, Device};
use bytemuck::Pod;

use super::context::{PhysicalDeviceInfo, VulkanResult};
use crate::render::uniforms::{copy_to_mapped, read_from_mapped};
use crate::render::RenderResult;

/// Buffer wrapper with its own memory allocation
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory to it
    pub fn new(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&buffer_info, None)? };
        let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory = physical_device
            .find_memory_type(mem_requirements.memory_type_bits, properties)
            .and_then(|memory_type_index| {
                let alloc_info = vk::MemoryAllocateInfo::builder()
                    .allocation_size(mem_requirements.size)
                    .memory_type_index(memory_type_index);
                Ok(unsafe { device.allocate_memory(&alloc_info, None)? })
            });
        let memory = match memory {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        // From here on Drop releases both handles
        let result = Self {
            device,
            buffer,
            memory,
            size,
        };
        unsafe { result.device.bind_buffer_memory(buffer, memory, 0)? };
        Ok(result)
    }

    /// Host-visible buffer initialised with `data`
    pub fn with_data<T: Pod>(
        device: Device,
        physical_device: &PhysicalDeviceInfo,
        usage: vk::BufferUsageFlags,
        data: &[T],
    ) -> VulkanResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = Self::new(
            device,
            physical_device,
            bytes.len() as vk::DeviceSize,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        buffer.write_bytes(bytes)?;
        Ok(buffer)
    }

    /// Map, copy `bytes` to the start of the buffer, unmap
    pub fn write_bytes(&self, bytes: &[u8]) -> VulkanResult<()> {
        let len = bytes.len().min(self.size as usize);
        unsafe {
            let ptr = self
                .device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.cast::<u8>(), len);
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Persistently mapped uniform buffer holding one `T`
pub struct UniformBuffer<T: Pod> {
    buffer: Buffer,
    mapped: *mut u8,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    /// Allocate and map a buffer sized for `T`
    pub fn new(device: Device, physical_device: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let size = std::mem::size_of::<T>() as vk::DeviceSize;
        let buffer = Buffer::new(
            device,
            physical_device,
            size,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        let mapped = unsafe {
            buffer
                .device
                .map_memory(buffer.memory, 0, size, vk::MemoryMapFlags::empty())?
        };
        log::debug!("Uniform buffer of {size} bytes mapped");

        Ok(Self {
            buffer,
            mapped: mapped.cast::<u8>(),
            _marker: PhantomData,
        })
    }

    fn mapped_mut(&mut self) -> &mut [u8] {
        // The mapping covers exactly size_of::<T>() bytes until drop
        unsafe { std::slice::from_raw_parts_mut(self.mapped, self.buffer.size as usize) }
    }

    fn mapped(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.mapped, self.buffer.size as usize) }
    }

    /// Copy `value` into the mapped memory
    pub fn write(&mut self, value: &T) -> RenderResult<()> {
        copy_to_mapped(self.mapped_mut(), value)
    }

    /// Read the current contents back
    pub fn read(&self) -> RenderResult<T> {
        read_from_mapped(self.mapped())
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Get size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.buffer.size()
    }
}

impl<T: Pod> Drop for UniformBuffer<T> {
    fn drop(&mut self) {
        unsafe {
            self.buffer.device.unmap_memory(self.buffer.memory);
        }
    }
}
