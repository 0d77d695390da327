// Vertex buffer creation
//
// Vertex data goes through a host-visible staging buffer into device-local
// memory. The copy is a one-time submit that waits for the queue to go idle,
// so the staging buffer can be freed before returning.

use super::commands;
use crate::renderer::error::{RendererError, Result, VkResultExt};
use crate::renderer::VertexPC;
use ash::vk;

/// Device-local vertex buffer plus the number of vertices it holds
pub struct VertexBuffer {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub vertex_count: u32,
}

impl VertexBuffer {
    pub fn destroy(&self, device: &ash::Device) {
        unsafe {
            device.destroy_buffer(self.buffer, None);
            device.free_memory(self.memory, None);
        }
    }
}

/// Find a memory type index allowed by `type_filter` with all `properties`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> Result<u32> {
    (0..memory_properties.memory_type_count)
        .find(|&i| {
            let has_type = (type_filter & (1 << i)) != 0;
            let has_properties = memory_properties.memory_types[i as usize]
                .property_flags
                .contains(properties);
            has_type && has_properties
        })
        .ok_or(RendererError::NoSuitableMemoryType(properties))
}

/// Create a buffer with bound memory. Nothing leaks on failure.
pub fn create_buffer(
    device: &ash::Device,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    properties: vk::MemoryPropertyFlags,
) -> Result<(vk::Buffer, vk::DeviceMemory)> {
    let buffer_info = vk::BufferCreateInfo::builder()
        .size(size)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);

    let buffer = unsafe { device.create_buffer(&buffer_info, None) }
        .context("Failed to create buffer")?;

    let allocate = || -> Result<vk::DeviceMemory> {
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory_type_index =
            find_memory_type(memory_properties, requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe { device.allocate_memory(&alloc_info, None) }
            .context("Failed to allocate buffer memory")?;

        if let Err(e) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
            unsafe { device.free_memory(memory, None) };
            return Err(e).context("Failed to bind buffer memory");
        }
        Ok(memory)
    };

    match allocate() {
        Ok(memory) => Ok((buffer, memory)),
        Err(e) => {
            unsafe { device.destroy_buffer(buffer, None) };
            Err(e)
        }
    }
}

/// Upload `vertices` into a new device-local vertex buffer.
pub fn create_vertex_buffer(
    device: &ash::Device,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    command_pool: vk::CommandPool,
    queue: vk::Queue,
    vertices: &[VertexPC],
) -> Result<VertexBuffer> {
    if vertices.is_empty() {
        return Err(RendererError::EmptyVertexData);
    }

    let bytes: &[u8] = bytemuck::cast_slice(vertices);
    let size = bytes.len() as vk::DeviceSize;

    // Staging buffer (CPU-visible)
    let (staging, staging_memory) = create_buffer(
        device,
        memory_properties,
        size,
        vk::BufferUsageFlags::TRANSFER_SRC,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    )?;

    let upload = || -> Result<VertexBuffer> {
        unsafe {
            let ptr = device
                .map_memory(staging_memory, 0, size, vk::MemoryMapFlags::empty())
                .context("Failed to map staging memory")? as *mut u8;
            ptr.copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
            device.unmap_memory(staging_memory);
        }

        // Destination buffer (GPU-only)
        let (buffer, memory) = create_buffer(
            device,
            memory_properties,
            size,
            vk::BufferUsageFlags::TRANSFER_DST | vk::BufferUsageFlags::VERTEX_BUFFER,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        let copied = commands::one_time_submit(device, command_pool, queue, |cmd| unsafe {
            let region = vk::BufferCopy::builder().size(size).build();
            device.cmd_copy_buffer(cmd, staging, buffer, &[region]);
        });

        let vertex_buffer = VertexBuffer {
            buffer,
            memory,
            vertex_count: vertices.len() as u32,
        };

        match copied {
            Ok(()) => Ok(vertex_buffer),
            Err(e) => {
                vertex_buffer.destroy(device);
                Err(e)
            }
        }
    };

    let result = upload();

    unsafe {
        device.destroy_buffer(staging, None);
        device.free_memory(staging_memory, None);
    }

    if let Ok(vertex_buffer) = &result {
        log::debug!(
            "Uploaded vertex buffer: {} vertices, {} bytes",
            vertex_buffer.vertex_count,
            size
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_properties(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags.len() as u32,
            ..Default::default()
        };
        for (i, &property_flags) in flags.iter().enumerate() {
            props.memory_types[i] = vk::MemoryType {
                property_flags,
                heap_index: 0,
            };
        }
        props
    }

    #[test]
    fn test_memory_type_respects_filter() {
        let props = memory_properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            vk::MemoryPropertyFlags::DEVICE_LOCAL | vk::MemoryPropertyFlags::HOST_VISIBLE,
        ]);

        let local = vk::MemoryPropertyFlags::DEVICE_LOCAL;
        assert_eq!(find_memory_type(&props, 0b111, local).unwrap(), 0);
        // type 0 masked out by the resource's requirements
        assert_eq!(find_memory_type(&props, 0b110, local).unwrap(), 2);

        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        assert_eq!(find_memory_type(&props, 0b111, host).unwrap(), 1);
    }

    #[test]
    fn test_no_memory_type() {
        let props = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        let wanted = vk::MemoryPropertyFlags::HOST_VISIBLE;
        assert!(matches!(
            find_memory_type(&props, 0b1, wanted),
            Err(RendererError::NoSuitableMemoryType(flags)) if flags == wanted
        ));
        // type count bounds the search even when the filter allows more
        assert!(find_memory_type(&props, u32::MAX, wanted).is_err());
    }
}
