/// GpuContext - Shared device state for every Vulkan binding object
///
/// Holds the device, the memory allocator, the descriptor buffer extension
/// loader and the implementation limits queried when the context is built.
/// Buffers and set layouts keep an `Arc` to it so they can release their
/// driver objects on drop.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use shader_binding::binding::{Error, ImplementationLimits, Result};
use shader_binding::{engine_error, engine_info};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::vulkan_limits::query_limits;

const SOURCE: &str = "shader_binding::vulkan";

/// Shared GPU context for all Vulkan binding resources.
///
/// Note: the device and instance belong to the application. They must
/// outlive this context and every object built from it.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety)
    /// Wrapped in ManuallyDrop so it is released before the device goes away
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// VK_EXT_descriptor_buffer entry points
    pub descriptor_buffer: ash::ext::descriptor_buffer::Device,

    /// Descriptor sizes and alignments reported by the device
    pub limits: ImplementationLimits,

    pub physical_device: vk::PhysicalDevice,
}

impl GpuContext {
    /// Create a context for `device`
    ///
    /// # Arguments
    ///
    /// * `instance` - Vulkan instance the device was created from
    /// * `physical_device` - Physical device backing `device`
    /// * `device` - Logical device with descriptor buffers and buffer device addresses enabled
    pub fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
    ) -> Result<Self> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: true,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| {
            engine_error!(SOURCE, "Failed to create GPU allocator: {:?}", e);
            Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
        })?;

        let limits = query_limits(instance, physical_device);
        let descriptor_buffer = ash::ext::descriptor_buffer::Device::new(instance, &device);

        engine_info!(
            SOURCE,
            "Descriptor buffer context ready (UBO {} B, SSBO {} B, image {} B, offset alignment {})",
            limits.uniform_buffer_descriptor_size,
            limits.storage_buffer_descriptor_size,
            limits.combined_image_sampler_descriptor_size,
            limits.descriptor_buffer_offset_alignment
        );

        Ok(Self {
            device,
            allocator: ManuallyDrop::new(Arc::new(Mutex::new(allocator))),
            descriptor_buffer,
            limits,
            physical_device,
        })
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        // Every buffer holds an Arc to this context, so no allocation is alive here
        unsafe {
            ManuallyDrop::drop(&mut self.allocator);
        }
    }
}
