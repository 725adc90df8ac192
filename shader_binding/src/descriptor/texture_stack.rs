/// Texture descriptor slot stack
///
/// One mapped buffer with room for `capacity` combined image sampler
/// descriptors, each in its own aligned slot. Registering a texture writes
/// its descriptor into a free slot and returns the slot index, which stays
/// valid until the texture is unregistered. Vacated slots are reused before
/// the stack grows.
///
/// Every slot is a full copy of a one-binding set layout, so a texture is
/// bound by pointing its set at the slot's offset.

use crate::config::BindingConfig;
use crate::descriptor::{
    bind_descriptor_buffers, BindingInfo, BufferUsage, DescriptorBackend, DescriptorBufferBinding, DescriptorKind,
    DescriptorResource, ImageDescriptor, MappedBuffer, PipelineBindPoint,
};
use crate::error::{Error, Result};
use crate::layout::{DescriptorSetLayout, SetLayoutDesc};
use crate::limits::align_up;
use crate::stage::ShaderStageFlags;
use crate::utils::SlotAllocator;
use crate::{engine_error, engine_info, engine_warn};

const SOURCE: &str = "shader_binding::texture_stack";

/// Stable slot indices for registered texture descriptors
pub struct TextureDescriptorStack<B: DescriptorBackend> {
    buffer: B::Buffer,
    layout: DescriptorSetLayout<B>,
    slots: SlotAllocator,
    /// Index = slot
    binding_infos: Vec<BindingInfo>,
    /// Byte distance between two slots
    stride: u64,
    /// Descriptor offset of binding 0 inside a slot
    descriptor_offset: u64,
    descriptor_size: u64,
}

impl<B: DescriptorBackend> TextureDescriptorStack<B> {
    /// Create a stack holding up to `capacity` textures visible to `stage_flags`
    pub fn new(backend: &B, capacity: u32, stage_flags: ShaderStageFlags) -> Result<Self> {
        if capacity == 0 {
            engine_error!(SOURCE, "Texture descriptor stack needs a capacity of at least 1");
            return Err(Error::InvalidResource("texture stack capacity is 0".to_string()));
        }

        let limits = backend.limits();
        let descriptor_size = backend.descriptor_byte_size(DescriptorKind::CombinedImageSampler);
        let layout = DescriptorSetLayout::build(backend, SetLayoutDesc::single_texture(0, stage_flags))?;
        let descriptor_offset = backend.set_layout_binding_offset(layout.raw(), 0);
        let stride = align_up(
            layout.size().max(descriptor_offset + descriptor_size),
            limits.descriptor_buffer_offset_alignment,
        );

        let buffer = backend.create_buffer(
            stride * capacity as u64,
            BufferUsage::SAMPLER_DESCRIPTORS | BufferUsage::DEVICE_ADDRESS,
            "texture descriptors",
        )?;

        engine_info!(
            SOURCE,
            "Texture descriptor stack: {} slots of {} bytes at 0x{:x}",
            capacity,
            stride,
            buffer.device_address()
        );

        Ok(Self {
            buffer,
            layout,
            slots: SlotAllocator::with_capacity(capacity),
            binding_infos: Vec::new(),
            stride,
            descriptor_offset,
            descriptor_size,
        })
    }

    /// Create a stack sized by `config.max_textures`
    pub fn from_config(backend: &B, config: &BindingConfig, stage_flags: ShaderStageFlags) -> Result<Self> {
        Self::new(backend, config.max_textures, stage_flags)
    }

    /// Copy pre-serialized descriptor bytes into a free slot
    pub fn register(&mut self, descriptor: &[u8]) -> Result<u32> {
        if descriptor.len() as u64 > self.descriptor_size {
            engine_error!(
                SOURCE,
                "Texture descriptor of {} bytes exceeds the {} byte descriptor size",
                descriptor.len(),
                self.descriptor_size
            );
            return Err(Error::InvalidResource(format!(
                "descriptor of {} bytes exceeds {} bytes",
                descriptor.len(),
                self.descriptor_size
            )));
        }

        let slot = self.alloc_slot()?;
        let start = self.descriptor_start(slot);
        let destination = &mut self.buffer.mapped_bytes_mut()[start..start + self.descriptor_size as usize];
        destination[..descriptor.len()].copy_from_slice(descriptor);
        destination[descriptor.len()..].fill(0);

        self.record_slot(slot);
        Ok(slot)
    }

    /// Have the backend write the descriptor of `image` into a free slot
    pub fn register_texture(&mut self, backend: &B, image: ImageDescriptor) -> Result<u32> {
        let slot = self.alloc_slot()?;
        let start = self.descriptor_start(slot);
        let end = start + self.descriptor_size as usize;

        let written = backend.write_descriptor(
            DescriptorKind::CombinedImageSampler,
            &DescriptorResource::CombinedImageSampler(image),
            &mut self.buffer.mapped_bytes_mut()[start..end],
        );
        if let Err(err) = written {
            self.slots.free(slot);
            return Err(err);
        }

        self.record_slot(slot);
        Ok(slot)
    }

    /// Give `slot` back. Its bytes stay in place until the slot is reused.
    pub fn unregister(&mut self, slot: u32) -> Result<()> {
        if !self.slots.free(slot) {
            engine_warn!(SOURCE, "Texture slot {} is not registered", slot);
            return Err(Error::InvalidResource(format!("texture slot {} is not registered", slot)));
        }
        Ok(())
    }

    /// Stack buffer with `set` pointing at `slot`, for `bind_descriptor_buffers`
    pub fn slot_binding(&self, set: u32, slot: u32) -> Result<DescriptorBufferBinding> {
        if !self.slots.is_live(slot) {
            engine_error!(SOURCE, "Binding texture slot {} which is not registered", slot);
            return Err(Error::InvalidResource(format!("texture slot {} is not registered", slot)));
        }
        Ok(DescriptorBufferBinding {
            info: self.buffer_info(),
            set,
            offset: slot as u64 * self.stride,
        })
    }

    /// Record binding the stack buffer alone with `set` pointing at `slot`
    ///
    /// Like every descriptor buffer bind this replaces the buffers bound
    /// before. To keep other sets bound, pass `slot_binding` together with
    /// their bindings to `bind_descriptor_buffers`.
    pub fn bind(
        &self,
        backend: &B,
        command_buffer: B::CommandBuffer,
        bind_point: PipelineBindPoint,
        pipeline_layout: B::PipelineLayout,
        set: u32,
        slot: u32,
    ) -> Result<()> {
        let binding = self.slot_binding(set, slot)?;
        bind_descriptor_buffers(backend, command_buffer, bind_point, pipeline_layout, &[binding]);
        Ok(())
    }

    /// Address/usage of the whole stack buffer
    pub fn buffer_info(&self) -> BindingInfo {
        BindingInfo {
            device_address: self.buffer.device_address(),
            usage: self.buffer.usage(),
        }
    }

    /// Address/usage of a registered slot
    pub fn binding_info(&self, slot: u32) -> Option<&BindingInfo> {
        if self.slots.is_live(slot) {
            self.binding_infos.get(slot as usize)
        } else {
            None
        }
    }

    /// Descriptor bytes currently stored in `slot` (registered or vacated)
    pub fn slot_bytes(&self, slot: u32) -> Option<&[u8]> {
        if slot >= self.slots.high_water_mark() {
            return None;
        }
        let start = self.descriptor_start(slot);
        Some(&self.buffer.mapped_bytes()[start..start + self.descriptor_size as usize])
    }

    /// One-binding layout every slot follows
    pub fn layout(&self) -> &DescriptorSetLayout<B> {
        &self.layout
    }

    pub fn is_registered(&self, slot: u32) -> bool {
        self.slots.is_live(slot)
    }

    /// Number of registered textures
    pub fn len(&self) -> u32 {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> u32 {
        self.slots.capacity()
    }

    /// Byte distance between two slots
    pub fn stride(&self) -> u64 {
        self.stride
    }

    fn alloc_slot(&mut self) -> Result<u32> {
        self.slots.alloc().ok_or_else(|| {
            engine_error!(
                SOURCE,
                "Texture descriptor stack is full ({} slots)",
                self.slots.capacity()
            );
            Error::OutOfDescriptorSlots(self.slots.capacity())
        })
    }

    fn descriptor_start(&self, slot: u32) -> usize {
        (slot as u64 * self.stride + self.descriptor_offset) as usize
    }

    fn record_slot(&mut self, slot: u32) {
        let info = BindingInfo {
            device_address: self.buffer.device_address() + slot as u64 * self.stride,
            usage: self.buffer.usage(),
        };
        match self.binding_infos.get_mut(slot as usize) {
            Some(existing) => *existing = info,
            None => self.binding_infos.push(info),
        }
    }
}

#[cfg(test)]
#[path = "texture_stack_tests.rs"]
mod tests;
