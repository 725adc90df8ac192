use super::*;

fn device_limits(ubo_alignment: u64, ssbo_alignment: u64) -> vk::PhysicalDeviceLimits {
    vk::PhysicalDeviceLimits::default()
        .min_uniform_buffer_offset_alignment(ubo_alignment)
        .min_storage_buffer_offset_alignment(ssbo_alignment)
        .max_push_constants_size(256)
}

#[test]
fn test_limits_from_desktop_properties() {
    let descriptor_buffer = vk::PhysicalDeviceDescriptorBufferPropertiesEXT::default()
        .uniform_buffer_descriptor_size(16)
        .storage_buffer_descriptor_size(16)
        .combined_image_sampler_descriptor_size(32)
        .descriptor_buffer_offset_alignment(64)
        .max_descriptor_buffer_bindings(32);

    let limits = limits_from_properties(&descriptor_buffer, &device_limits(64, 16));

    assert_eq!(limits, ImplementationLimits {
        max_push_constants_size: 256,
        ..ImplementationLimits::default()
    });
}

#[test]
fn test_zero_alignments_become_one() {
    let descriptor_buffer = vk::PhysicalDeviceDescriptorBufferPropertiesEXT::default()
        .uniform_buffer_descriptor_size(8)
        .descriptor_buffer_offset_alignment(0);

    let limits = limits_from_properties(&descriptor_buffer, &device_limits(0, 0));

    assert_eq!(limits.uniform_buffer_descriptor_size, 8);
    assert_eq!(limits.descriptor_buffer_offset_alignment, 1);
    assert_eq!(limits.min_uniform_buffer_offset_alignment, 1);
    assert_eq!(limits.min_storage_buffer_offset_alignment, 1);
}
