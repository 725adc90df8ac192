/// VulkanDescriptorBackend - DescriptorBackend over VK_EXT_descriptor_buffer

use ash::vk;
use ash::vk::Handle;
use shader_binding::binding::descriptor::{
    BindingInfo, BufferUsage, DescriptorBackend, DescriptorKind, DescriptorResource, PipelineBindPoint,
};
use shader_binding::binding::layout::{PipelineLayouts, SetLayoutDesc};
use shader_binding::binding::{Error, ImplementationLimits, Result};
use shader_binding::{engine_bail, engine_err, engine_error, engine_trace};
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    buffer_usage_to_vk, descriptor_kind_to_vk, image_layout_to_vk, pipeline_bind_point_to_vk,
    stage_flags_to_vk,
};
use crate::vulkan_handle::{PipelineLayout, SetLayout};

const SOURCE: &str = "shader_binding::vulkan";

/// Vulkan descriptor backend
pub struct VulkanDescriptorBackend {
    ctx: Arc<GpuContext>,
}

impl VulkanDescriptorBackend {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    /// Pipeline-level set layout handles in set index order, for `vkCreatePipelineLayout`
    pub fn set_layout_handles(&self, layouts: &PipelineLayouts<Self>) -> Vec<vk::DescriptorSetLayout> {
        layouts.sets().iter().map(|layout| layout.raw().raw()).collect()
    }

    /// Create a pipeline layout over every set of `layouts`
    pub fn create_pipeline_layout(
        &self,
        layouts: &PipelineLayouts<Self>,
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> Result<PipelineLayout> {
        let set_layouts = self.set_layout_handles(layouts);
        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(push_constant_ranges);

        let layout = unsafe { self.ctx.device.create_pipeline_layout(&create_info, None) }
            .map_err(|e| engine_err!(SOURCE, "Failed to create pipeline layout: {:?}", e))?;

        Ok(PipelineLayout::new(Arc::clone(&self.ctx), layout))
    }

    /// Free `allocation` and destroy `buffer` after a failed creation step
    fn discard_buffer(&self, buffer: vk::Buffer, allocation: Option<gpu_allocator::vulkan::Allocation>) {
        unsafe {
            if let Some(allocation) = allocation {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(buffer, None);
        }
    }
}

impl DescriptorBackend for VulkanDescriptorBackend {
    type SetLayout = SetLayout;
    type Buffer = Buffer;
    type CommandBuffer = vk::CommandBuffer;
    type PipelineLayout = vk::PipelineLayout;

    fn limits(&self) -> &ImplementationLimits {
        &self.ctx.limits
    }

    fn create_set_layout(&self, desc: &SetLayoutDesc) -> Result<SetLayout> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .bindings
            .iter()
            .map(|binding| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(binding.binding)
                    .descriptor_type(descriptor_kind_to_vk(binding.kind))
                    .descriptor_count(binding.count)
                    .stage_flags(stage_flags_to_vk(binding.stage_flags))
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(vk::DescriptorSetLayoutCreateFlags::DESCRIPTOR_BUFFER_EXT)
            .bindings(&bindings);

        let layout = unsafe { self.ctx.device.create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| engine_err!(SOURCE, "Failed to create descriptor set layout for set {}: {:?}", desc.set, e))?;

        Ok(SetLayout::new(Arc::clone(&self.ctx), layout))
    }

    fn set_layout_size(&self, layout: &SetLayout) -> u64 {
        unsafe {
            self.ctx
                .descriptor_buffer
                .get_descriptor_set_layout_size(layout.raw())
        }
    }

    fn set_layout_binding_offset(&self, layout: &SetLayout, binding: u32) -> u64 {
        unsafe {
            self.ctx
                .descriptor_buffer
                .get_descriptor_set_layout_binding_offset(layout.raw(), binding)
        }
    }

    fn create_buffer(&self, size: u64, usage: BufferUsage, name: &str) -> Result<Buffer> {
        if size == 0 {
            engine_bail!(SOURCE, "Buffer '{}' has zero size", name);
        }

        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(buffer_usage_to_vk(usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { self.ctx.device.create_buffer(&create_info, None) }
            .map_err(|e| engine_err!(SOURCE, "Failed to create buffer '{}' of size {} bytes: {:?}", name, size, e))?;

        let requirements = unsafe { self.ctx.device.get_buffer_memory_requirements(buffer) };

        let allocation = self
            .ctx
            .allocator
            .lock()
            .map_err(|_| engine_err!(SOURCE, "GPU allocator lock poisoned"))
            .and_then(|mut allocator| {
                allocator
                    .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                        name,
                        requirements,
                        location: gpu_allocator::MemoryLocation::CpuToGpu,
                        linear: true,
                        allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_e| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        engine_error!(SOURCE, "Out of GPU memory for buffer '{}' (required: {:.2} MB)", name, size_mb);
                        Error::OutOfMemory
                    })
            });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                self.discard_buffer(buffer, None);
                return Err(e);
            }
        };

        if allocation.mapped_ptr().is_none() {
            self.discard_buffer(buffer, Some(allocation));
            engine_bail!(SOURCE, "Buffer '{}' memory is not host visible", name);
        }

        if let Err(e) = unsafe {
            self.ctx
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
        } {
            self.discard_buffer(buffer, Some(allocation));
            engine_bail!(SOURCE, "Failed to bind memory of buffer '{}': {:?}", name, e);
        }

        let address = if usage.contains(BufferUsage::DEVICE_ADDRESS) {
            unsafe {
                self.ctx
                    .device
                    .get_buffer_device_address(&vk::BufferDeviceAddressInfo::default().buffer(buffer))
            }
        } else {
            0
        };

        engine_trace!(SOURCE, "Created buffer '{}' ({} bytes at 0x{:x})", name, size, address);

        Ok(Buffer::new(Arc::clone(&self.ctx), buffer, allocation, size, address, usage))
    }

    fn write_descriptor(
        &self,
        kind: DescriptorKind,
        resource: &DescriptorResource,
        destination: &mut [u8],
    ) -> Result<()> {
        let expected = self.descriptor_byte_size(kind) as usize;
        if destination.len() < expected {
            engine_error!(
                SOURCE,
                "{:?} descriptor needs {} bytes, destination holds {}",
                kind,
                expected,
                destination.len()
            );
            return Err(Error::InvalidResource(format!(
                "descriptor destination of {} bytes, {} required",
                destination.len(),
                expected
            )));
        }
        let destination = &mut destination[..expected];

        match (kind, resource) {
            (DescriptorKind::UniformBuffer | DescriptorKind::StorageBuffer, DescriptorResource::Buffer(subdata)) => {
                let address_info = vk::DescriptorAddressInfoEXT::default()
                    .address(subdata.device_address())
                    .range(subdata.size)
                    .format(vk::Format::UNDEFINED);
                let data = if kind == DescriptorKind::UniformBuffer {
                    vk::DescriptorDataEXT { p_uniform_buffer: &address_info }
                } else {
                    vk::DescriptorDataEXT { p_storage_buffer: &address_info }
                };
                let info = vk::DescriptorGetInfoEXT::default()
                    .ty(descriptor_kind_to_vk(kind))
                    .data(data);
                unsafe { self.ctx.descriptor_buffer.get_descriptor(&info, destination) };
            }
            (DescriptorKind::CombinedImageSampler, DescriptorResource::CombinedImageSampler(image)) => {
                let image_info = vk::DescriptorImageInfo::default()
                    .sampler(vk::Sampler::from_raw(image.sampler))
                    .image_view(vk::ImageView::from_raw(image.image_view))
                    .image_layout(image_layout_to_vk(image.image_layout));
                let info = vk::DescriptorGetInfoEXT::default()
                    .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .data(vk::DescriptorDataEXT { p_combined_image_sampler: &image_info });
                unsafe { self.ctx.descriptor_buffer.get_descriptor(&info, destination) };
            }
            _ => {
                engine_error!(SOURCE, "Cannot write a {:?} descriptor from {:?}", kind, resource);
                return Err(Error::UnsupportedDescriptorType(format!("{:?} with {:?}", kind, resource)));
            }
        }

        Ok(())
    }

    fn cmd_bind_descriptor_buffers(&self, command_buffer: vk::CommandBuffer, buffers: &[BindingInfo]) {
        let binding_infos: Vec<vk::DescriptorBufferBindingInfoEXT> = buffers
            .iter()
            .map(|info| {
                vk::DescriptorBufferBindingInfoEXT::default()
                    .address(info.device_address)
                    .usage(buffer_usage_to_vk(info.usage))
            })
            .collect();

        unsafe {
            self.ctx
                .descriptor_buffer
                .cmd_bind_descriptor_buffers(command_buffer, &binding_infos);
        }
    }

    fn cmd_set_descriptor_buffer_offsets(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: PipelineBindPoint,
        pipeline_layout: vk::PipelineLayout,
        first_set: u32,
        buffer_indices: &[u32],
        offsets: &[u64],
    ) {
        unsafe {
            self.ctx.descriptor_buffer.cmd_set_descriptor_buffer_offsets(
                command_buffer,
                pipeline_bind_point_to_vk(bind_point),
                pipeline_layout,
                first_set,
                buffer_indices,
                offsets,
            );
        }
    }
}
