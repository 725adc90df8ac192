/// Buffer - persistently mapped, device-addressable Vulkan buffer

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use shader_binding::binding::descriptor::{BufferUsage, MappedBuffer};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan buffer backing descriptor and resource data
pub struct Buffer {
    /// Shared GPU context (device, allocator)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation (host visible, mapped)
    pub(crate) allocation: Option<Allocation>,
    /// Requested size (the allocation may be larger)
    pub(crate) size: u64,
    pub(crate) address: vk::DeviceAddress,
    pub(crate) usage: BufferUsage,
}

impl Buffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
        address: vk::DeviceAddress,
        usage: BufferUsage,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
            address,
            usage,
        }
    }

    /// Vulkan buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }
}

impl MappedBuffer for Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn device_address(&self) -> u64 {
        self.address
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn mapped_bytes(&self) -> &[u8] {
        let size = self.size as usize;
        self.allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_slice())
            .map(|bytes| &bytes[..size])
            .unwrap_or(&[])
    }

    fn mapped_bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size as usize;
        match self.allocation.as_mut().and_then(|allocation| allocation.mapped_slice_mut()) {
            Some(bytes) => &mut bytes[..size],
            None => &mut [],
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
