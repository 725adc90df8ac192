/// Conversions from backend-free binding types to Vulkan enums and flags

use ash::vk;
use shader_binding::binding::descriptor::{BufferUsage, DescriptorKind, ImageLayout, PipelineBindPoint};
use shader_binding::binding::layout::{VertexFormat, VertexInputDescription, VertexInputRate};
use shader_binding::binding::ShaderStageFlags;

/// Convert a vertex attribute format
pub fn vertex_format_to_vk(format: VertexFormat) -> vk::Format {
    match format {
        // Half float formats
        VertexFormat::R16_SFLOAT => vk::Format::R16_SFLOAT,
        VertexFormat::R16G16_SFLOAT => vk::Format::R16G16_SFLOAT,
        VertexFormat::R16G16B16_SFLOAT => vk::Format::R16G16B16_SFLOAT,
        VertexFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        // Float formats
        VertexFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        VertexFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        VertexFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
        VertexFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        // Double formats
        VertexFormat::R64_SFLOAT => vk::Format::R64_SFLOAT,
        VertexFormat::R64G64_SFLOAT => vk::Format::R64G64_SFLOAT,
        VertexFormat::R64G64B64_SFLOAT => vk::Format::R64G64B64_SFLOAT,
        VertexFormat::R64G64B64A64_SFLOAT => vk::Format::R64G64B64A64_SFLOAT,
        // Short formats
        VertexFormat::R16_SINT => vk::Format::R16_SINT,
        VertexFormat::R16G16_SINT => vk::Format::R16G16_SINT,
        VertexFormat::R16G16B16_SINT => vk::Format::R16G16B16_SINT,
        VertexFormat::R16G16B16A16_SINT => vk::Format::R16G16B16A16_SINT,
        VertexFormat::R16_UINT => vk::Format::R16_UINT,
        VertexFormat::R16G16_UINT => vk::Format::R16G16_UINT,
        VertexFormat::R16G16B16_UINT => vk::Format::R16G16B16_UINT,
        VertexFormat::R16G16B16A16_UINT => vk::Format::R16G16B16A16_UINT,
        // Integer formats
        VertexFormat::R32_SINT => vk::Format::R32_SINT,
        VertexFormat::R32G32_SINT => vk::Format::R32G32_SINT,
        VertexFormat::R32G32B32_SINT => vk::Format::R32G32B32_SINT,
        VertexFormat::R32G32B32A32_SINT => vk::Format::R32G32B32A32_SINT,
        VertexFormat::R32_UINT => vk::Format::R32_UINT,
        VertexFormat::R32G32_UINT => vk::Format::R32G32_UINT,
        VertexFormat::R32G32B32_UINT => vk::Format::R32G32B32_UINT,
        VertexFormat::R32G32B32A32_UINT => vk::Format::R32G32B32A32_UINT,
        // Long formats
        VertexFormat::R64_SINT => vk::Format::R64_SINT,
        VertexFormat::R64G64_SINT => vk::Format::R64G64_SINT,
        VertexFormat::R64G64B64_SINT => vk::Format::R64G64B64_SINT,
        VertexFormat::R64G64B64A64_SINT => vk::Format::R64G64B64A64_SINT,
        VertexFormat::R64_UINT => vk::Format::R64_UINT,
        VertexFormat::R64G64_UINT => vk::Format::R64G64_UINT,
        VertexFormat::R64G64B64_UINT => vk::Format::R64G64B64_UINT,
        VertexFormat::R64G64B64A64_UINT => vk::Format::R64G64B64A64_UINT,
    }
}

/// Convert a synthesized vertex layout into pipeline vertex input descriptions
pub fn vertex_input_to_vk(
    description: &VertexInputDescription,
) -> (Vec<vk::VertexInputBindingDescription>, Vec<vk::VertexInputAttributeDescription>) {
    let bindings = description
        .bindings
        .iter()
        .map(|binding| {
            vk::VertexInputBindingDescription::default()
                .binding(binding.binding)
                .stride(binding.stride)
                .input_rate(match binding.input_rate {
                    VertexInputRate::Vertex => vk::VertexInputRate::VERTEX,
                    VertexInputRate::Instance => vk::VertexInputRate::INSTANCE,
                })
        })
        .collect();

    let attributes = description
        .attributes
        .iter()
        .map(|attribute| {
            vk::VertexInputAttributeDescription::default()
                .location(attribute.location)
                .binding(attribute.binding)
                .format(vertex_format_to_vk(attribute.format))
                .offset(attribute.offset)
        })
        .collect();

    (bindings, attributes)
}

pub fn descriptor_kind_to_vk(kind: DescriptorKind) -> vk::DescriptorType {
    match kind {
        DescriptorKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

/// Convert a stage visibility mask
pub fn stage_flags_to_vk(flags: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut vk_flags = vk::ShaderStageFlags::empty();
    if flags.contains(ShaderStageFlags::VERTEX) { vk_flags |= vk::ShaderStageFlags::VERTEX; }
    if flags.contains(ShaderStageFlags::FRAGMENT) { vk_flags |= vk::ShaderStageFlags::FRAGMENT; }
    if flags.contains(ShaderStageFlags::COMPUTE) { vk_flags |= vk::ShaderStageFlags::COMPUTE; }
    vk_flags
}

pub fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut vk_usage = vk::BufferUsageFlags::empty();
    if usage.contains(BufferUsage::UNIFORM) { vk_usage |= vk::BufferUsageFlags::UNIFORM_BUFFER; }
    if usage.contains(BufferUsage::STORAGE) { vk_usage |= vk::BufferUsageFlags::STORAGE_BUFFER; }
    if usage.contains(BufferUsage::RESOURCE_DESCRIPTORS) {
        vk_usage |= vk::BufferUsageFlags::RESOURCE_DESCRIPTOR_BUFFER_EXT;
    }
    if usage.contains(BufferUsage::SAMPLER_DESCRIPTORS) {
        vk_usage |= vk::BufferUsageFlags::SAMPLER_DESCRIPTOR_BUFFER_EXT;
    }
    if usage.contains(BufferUsage::DEVICE_ADDRESS) {
        vk_usage |= vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS;
    }
    vk_usage
}

pub fn pipeline_bind_point_to_vk(bind_point: PipelineBindPoint) -> vk::PipelineBindPoint {
    match bind_point {
        PipelineBindPoint::Graphics => vk::PipelineBindPoint::GRAPHICS,
        PipelineBindPoint::Compute => vk::PipelineBindPoint::COMPUTE,
    }
}

pub fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::General => vk::ImageLayout::GENERAL,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
