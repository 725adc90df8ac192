/// Descriptor buffer: the opaque descriptors of one set layout, written into
/// a mapped GPU buffer and bound by device address.

use crate::config::MismatchPolicy;
use crate::descriptor::{
    BindingInfo, BufferUsage, DescriptorBackend, DescriptorBufferBinding, DescriptorResource, MappedBuffer,
    PipelineBindPoint,
};
use crate::error::{Error, Result};
use crate::layout::DescriptorSetLayout;
use crate::limits::align_up;
use crate::{engine_debug, engine_error, engine_warn};

const SOURCE: &str = "shader_binding::descriptor_buffer";

/// Descriptors of one set layout, ready to bind
///
/// An unusable descriptor buffer (see `is_usable`) owns no GPU buffer and
/// binding it records nothing.
pub struct DescriptorBuffer<B: DescriptorBackend> {
    buffer: Option<B::Buffer>,
    binding_info: Option<BindingInfo>,
    set: u32,
    bind_point: PipelineBindPoint,
}

impl<B: DescriptorBackend> DescriptorBuffer<B> {
    /// Write one descriptor per binding element of `layout` from `data`
    ///
    /// `data` holds one resource per descriptor, in binding order (array
    /// bindings take `count` consecutive entries). A length mismatch is
    /// handled according to `policy`.
    pub fn build(
        backend: &B,
        layout: &DescriptorSetLayout<B>,
        data: &[DescriptorResource],
        bind_point: PipelineBindPoint,
        policy: MismatchPolicy,
    ) -> Result<Self> {
        let set = layout.set_index();
        let expected: usize = layout.bindings().iter().map(|b| b.count as usize).sum();

        if data.len() != expected {
            engine_error!(
                SOURCE,
                "Descriptor data for set {} has {} entries, layout expects {}",
                set,
                data.len(),
                expected
            );
            return match policy {
                MismatchPolicy::Fatal => Err(Error::BindingDataMismatch {
                    expected,
                    actual: data.len(),
                }),
                MismatchPolicy::Degrade => Ok(Self::unusable(set, bind_point)),
            };
        }

        if layout.is_empty() {
            engine_debug!(SOURCE, "Set {} has no bindings, no descriptor buffer created", set);
            return Ok(Self::unusable(set, bind_point));
        }

        // Check every resource against its binding before touching the device
        let mut usage = BufferUsage::DEVICE_ADDRESS;
        let mut resources = data.iter();
        for binding in layout.bindings() {
            usage |= binding.kind.descriptor_buffer_usage();
            for resource in resources.by_ref().take(binding.count as usize) {
                let matches = match resource {
                    DescriptorResource::Buffer(_) => binding.kind.is_buffer(),
                    DescriptorResource::CombinedImageSampler(_) => !binding.kind.is_buffer(),
                };
                if !matches {
                    engine_error!(
                        SOURCE,
                        "Binding {} of set {} is {:?}, got {:?}",
                        binding.binding,
                        set,
                        binding.kind,
                        resource
                    );
                    return Err(Error::UnsupportedDescriptorType(format!(
                        "{:?} written to a {:?} binding",
                        resource, binding.kind
                    )));
                }
            }
        }

        let limits = backend.limits();
        let size = align_up(layout.size(), limits.descriptor_buffer_offset_alignment);
        let mut buffer =
            backend.create_buffer(size, usage, &format!("descriptor buffer (set {})", set))?;

        let mut resources = data.iter();
        for binding in layout.bindings() {
            let descriptor_size = backend.descriptor_byte_size(binding.kind) as usize;
            let binding_offset = backend.set_layout_binding_offset(layout.raw(), binding.binding) as usize;

            for (element, resource) in resources.by_ref().take(binding.count as usize).enumerate() {
                let start = binding_offset + element * descriptor_size;
                let end = start + descriptor_size;
                let mapped = buffer.mapped_bytes_mut();
                if end > mapped.len() {
                    engine_error!(
                        SOURCE,
                        "Descriptor for binding {} of set {} ends at {}, buffer holds {} bytes",
                        binding.binding,
                        set,
                        end,
                        mapped.len()
                    );
                    return Err(Error::InvalidResource(format!(
                        "descriptor range {}..{} outside buffer of {} bytes",
                        start,
                        end,
                        mapped.len()
                    )));
                }
                backend.write_descriptor(binding.kind, resource, &mut mapped[start..end])?;
            }
        }

        let binding_info = BindingInfo {
            device_address: buffer.device_address(),
            usage,
        };

        engine_debug!(
            SOURCE,
            "Wrote {} descriptors for set {} into {} bytes at 0x{:x}",
            data.len(),
            set,
            size,
            binding_info.device_address
        );

        Ok(Self {
            buffer: Some(buffer),
            binding_info: Some(binding_info),
            set,
            bind_point,
        })
    }

    fn unusable(set: u32, bind_point: PipelineBindPoint) -> Self {
        Self {
            buffer: None,
            binding_info: None,
            set,
            bind_point,
        }
    }

    /// Whether the buffer holds descriptors and can be bound
    pub fn is_usable(&self) -> bool {
        self.binding_info.is_some()
    }

    /// Byte size of the GPU buffer (0 when unusable)
    pub fn size(&self) -> u64 {
        self.buffer.as_ref().map(|b| b.size()).unwrap_or(0)
    }

    pub fn binding_info(&self) -> Option<&BindingInfo> {
        self.binding_info.as_ref()
    }

    pub fn set_index(&self) -> u32 {
        self.set
    }

    pub fn bind_point(&self) -> PipelineBindPoint {
        self.bind_point
    }

    /// Mapped descriptor bytes (empty when unusable)
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_ref().map(|b| b.mapped_bytes()).unwrap_or(&[])
    }

    /// Buffer and set to hand to `bind_descriptor_buffers` (None when unusable)
    pub fn binding(&self) -> Option<DescriptorBufferBinding> {
        self.binding_info.map(|info| DescriptorBufferBinding {
            info,
            set: self.set,
            offset: 0,
        })
    }

    /// Record the bind of this buffer alone to its set, at offset 0
    ///
    /// This replaces every descriptor buffer bound before on `command_buffer`.
    /// Pipelines reading several sets bind them together through
    /// `bind_descriptor_buffers`.
    pub fn bind(&self, backend: &B, command_buffer: B::CommandBuffer, pipeline_layout: B::PipelineLayout) {
        let Some(binding) = self.binding() else {
            engine_warn!(SOURCE, "Skipping bind of unusable descriptor buffer for set {}", self.set);
            return;
        };
        bind_descriptor_buffers(backend, command_buffer, self.bind_point, pipeline_layout, &[binding]);
    }
}

/// Bind the descriptor buffers of several sets at once
///
/// Every bind call replaces the previously bound descriptor buffers, so the
/// buffers read by one draw go through a single call. Entries sharing a
/// buffer share its index. Each entry then points its set at its offset.
pub fn bind_descriptor_buffers<B: DescriptorBackend>(
    backend: &B,
    command_buffer: B::CommandBuffer,
    bind_point: PipelineBindPoint,
    pipeline_layout: B::PipelineLayout,
    bindings: &[DescriptorBufferBinding],
) {
    if bindings.is_empty() {
        return;
    }

    let mut infos: Vec<BindingInfo> = Vec::with_capacity(bindings.len());
    let indices: Vec<u32> = bindings
        .iter()
        .map(|binding| match infos.iter().position(|info| *info == binding.info) {
            Some(index) => index as u32,
            None => {
                infos.push(binding.info);
                infos.len() as u32 - 1
            }
        })
        .collect();

    let max_buffers = backend.limits().max_descriptor_buffer_bindings as usize;
    if infos.len() > max_buffers {
        engine_warn!(
            SOURCE,
            "Binding {} descriptor buffers, the device binds at most {}",
            infos.len(),
            max_buffers
        );
    }

    backend.cmd_bind_descriptor_buffers(command_buffer, &infos);
    for (binding, index) in bindings.iter().zip(indices) {
        backend.cmd_set_descriptor_buffer_offsets(
            command_buffer,
            bind_point,
            pipeline_layout,
            binding.set,
            &[index],
            &[binding.offset],
        );
    }
}

#[cfg(test)]
#[path = "descriptor_buffer_tests.rs"]
mod tests;
