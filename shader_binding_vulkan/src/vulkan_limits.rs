/// Implementation limits of a physical device

use ash::vk;
use shader_binding::binding::ImplementationLimits;

/// Query the descriptor buffer properties of `physical_device`
pub fn query_limits(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> ImplementationLimits {
    let mut descriptor_buffer = vk::PhysicalDeviceDescriptorBufferPropertiesEXT::default();
    let device_limits = {
        let mut properties = vk::PhysicalDeviceProperties2::default().push_next(&mut descriptor_buffer);
        unsafe {
            instance.get_physical_device_properties2(physical_device, &mut properties);
        }
        properties.properties.limits
    };

    limits_from_properties(&descriptor_buffer, &device_limits)
}

/// Convert raw device properties into `ImplementationLimits`
pub fn limits_from_properties(
    descriptor_buffer: &vk::PhysicalDeviceDescriptorBufferPropertiesEXT<'_>,
    device_limits: &vk::PhysicalDeviceLimits,
) -> ImplementationLimits {
    ImplementationLimits {
        uniform_buffer_descriptor_size: descriptor_buffer.uniform_buffer_descriptor_size as u64,
        storage_buffer_descriptor_size: descriptor_buffer.storage_buffer_descriptor_size as u64,
        combined_image_sampler_descriptor_size: descriptor_buffer.combined_image_sampler_descriptor_size as u64,
        // Some drivers report 0 when any offset works
        descriptor_buffer_offset_alignment: descriptor_buffer.descriptor_buffer_offset_alignment.max(1),
        min_uniform_buffer_offset_alignment: device_limits.min_uniform_buffer_offset_alignment.max(1),
        min_storage_buffer_offset_alignment: device_limits.min_storage_buffer_offset_alignment.max(1),
        max_descriptor_buffer_bindings: descriptor_buffer.max_descriptor_buffer_bindings,
        max_push_constants_size: device_limits.max_push_constants_size,
    }
}

#[cfg(test)]
#[path = "vulkan_limits_tests.rs"]
mod tests;
