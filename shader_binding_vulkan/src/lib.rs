/*!
# Shader Binding - Vulkan Backend

`DescriptorBackend` implementation on top of `VK_EXT_descriptor_buffer`.

The application owns the instance and device. It must create the device
with the `VK_EXT_descriptor_buffer` extension and the `bufferDeviceAddress`
and `descriptorBuffer` features enabled, then hand both to `GpuContext::new`.
*/

mod vulkan_context;
mod vulkan_limits;
mod vulkan_buffer;
mod vulkan_handle;
mod vulkan_format;
mod vulkan_backend;

pub use vulkan_context::GpuContext;
pub use vulkan_limits::{limits_from_properties, query_limits};
pub use vulkan_buffer::Buffer;
pub use vulkan_handle::{DeviceObject, PipelineLayout, SetLayout, VkHandle};
pub use vulkan_backend::VulkanDescriptorBackend;
pub use vulkan_format::{
    buffer_usage_to_vk, descriptor_kind_to_vk, image_layout_to_vk, pipeline_bind_point_to_vk,
    stage_flags_to_vk, vertex_format_to_vk, vertex_input_to_vk,
};
