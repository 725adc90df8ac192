/// Descriptor kinds, bindings and the resource references written into descriptors

use bitflags::bitflags;

use crate::stage::ShaderStageFlags;

/// Type of resource bound at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DescriptorKind {
    /// Uniform buffer (read-only structured data)
    UniformBuffer,
    /// Storage buffer (read/write structured data)
    StorageBuffer,
    /// Combined image sampler (texture + sampler in one binding)
    CombinedImageSampler,
}

impl DescriptorKind {
    /// Whether the descriptor references a buffer region
    pub fn is_buffer(self) -> bool {
        matches!(self, DescriptorKind::UniformBuffer | DescriptorKind::StorageBuffer)
    }

    /// Usage bit a descriptor buffer holding this kind must carry
    pub fn descriptor_buffer_usage(self) -> BufferUsage {
        if self.is_buffer() {
            BufferUsage::RESOURCE_DESCRIPTORS
        } else {
            BufferUsage::SAMPLER_DESCRIPTORS
        }
    }
}

/// One binding slot of a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBinding {
    /// Binding number (corresponds to `layout(binding = N)` in GLSL)
    pub binding: u32,
    /// Type of resource at this binding
    pub kind: DescriptorKind,
    /// Number of descriptors at this binding (>1 for arrays)
    pub count: u32,
    /// Shader stages that access this binding (union across stages)
    pub stage_flags: ShaderStageFlags,
}

bitflags! {
    /// Usage of a GPU buffer created through a descriptor backend
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const UNIFORM = 0x01;
        const STORAGE = 0x02;
        /// Holds uniform/storage buffer descriptors
        const RESOURCE_DESCRIPTORS = 0x04;
        /// Holds sampler/combined image sampler descriptors
        const SAMPLER_DESCRIPTORS = 0x08;
        const DEVICE_ADDRESS = 0x10;
    }
}

/// A byte range inside a buffer the range does not own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSubdata {
    /// Device address of the owning buffer
    pub buffer_address: u64,
    /// Offset of the range from the start of the owning buffer
    pub offset: u64,
    /// Size of the range in bytes
    pub size: u64,
}

impl BufferSubdata {
    /// Device address of the first byte of the range
    pub fn device_address(&self) -> u64 {
        self.buffer_address + self.offset
    }
}

/// Address + usage of a descriptor buffer, as handed to the bind command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingInfo {
    pub device_address: u64,
    pub usage: BufferUsage,
}

/// A descriptor buffer bound for a draw: the set reading it and the byte
/// offset of that set's descriptors inside the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBufferBinding {
    pub info: BindingInfo,
    pub set: u32,
    pub offset: u64,
}

/// Layout an image is in when sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    ShaderReadOnly,
    General,
}

/// Sampler + image view pair for a combined image sampler descriptor
///
/// Handles are raw backend handles (e.g. `vk::Sampler::as_raw()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub sampler: u64,
    pub image_view: u64,
    pub image_layout: ImageLayout,
}

/// A concrete resource whose descriptor gets written into a descriptor buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorResource {
    /// Uniform or storage buffer region
    Buffer(BufferSubdata),
    /// Sampled texture
    CombinedImageSampler(ImageDescriptor),
}

impl From<BufferSubdata> for DescriptorResource {
    fn from(subdata: BufferSubdata) -> Self {
        DescriptorResource::Buffer(subdata)
    }
}

impl From<ImageDescriptor> for DescriptorResource {
    fn from(image: ImageDescriptor) -> Self {
        DescriptorResource::CombinedImageSampler(image)
    }
}

/// Pipeline type descriptor buffers are bound for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineBindPoint {
    Graphics,
    Compute,
}
