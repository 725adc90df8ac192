//! Implementation-reported constants for the buffer-resident descriptor model
//!
//! Captured once when the device is created and handed to every builder
//! through the backend. Never mutated afterwards.

use crate::descriptor::DescriptorKind;

/// Round `value` up to the next multiple of `alignment`
///
/// `alignment` must be a power of two (Vulkan guarantees this for every
/// alignment it reports).
#[inline]
pub fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two(), "alignment {} is not a power of two", alignment);
    (value + alignment - 1) & !(alignment - 1)
}

/// Immutable device constants for descriptor sizing and placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplementationLimits {
    /// Byte size of one uniform buffer descriptor
    pub uniform_buffer_descriptor_size: u64,
    /// Byte size of one storage buffer descriptor
    pub storage_buffer_descriptor_size: u64,
    /// Byte size of one combined image sampler descriptor
    pub combined_image_sampler_descriptor_size: u64,
    /// Required alignment of descriptor buffer offsets
    pub descriptor_buffer_offset_alignment: u64,
    /// Required alignment of uniform buffer descriptor addresses
    pub min_uniform_buffer_offset_alignment: u64,
    /// Required alignment of storage buffer descriptor addresses
    pub min_storage_buffer_offset_alignment: u64,
    /// Maximum number of descriptor buffers bound at once
    pub max_descriptor_buffer_bindings: u32,
    /// Maximum push constant block size in bytes
    pub max_push_constants_size: u32,
}

impl ImplementationLimits {
    /// Descriptor byte size for one descriptor of `kind`
    pub fn descriptor_size(&self, kind: DescriptorKind) -> u64 {
        match kind {
            DescriptorKind::UniformBuffer => self.uniform_buffer_descriptor_size,
            DescriptorKind::StorageBuffer => self.storage_buffer_descriptor_size,
            DescriptorKind::CombinedImageSampler => self.combined_image_sampler_descriptor_size,
        }
    }

    /// Aligned stride of one descriptor of `kind` inside a descriptor buffer
    pub fn descriptor_stride(&self, kind: DescriptorKind) -> u64 {
        align_up(self.descriptor_size(kind), self.descriptor_buffer_offset_alignment)
    }

    /// Required start alignment for a data range backing a descriptor of `kind`
    pub fn data_offset_alignment(&self, kind: DescriptorKind) -> u64 {
        match kind {
            DescriptorKind::UniformBuffer => self.min_uniform_buffer_offset_alignment,
            DescriptorKind::StorageBuffer => self.min_storage_buffer_offset_alignment,
            DescriptorKind::CombinedImageSampler => 1,
        }
    }
}

impl Default for ImplementationLimits {
    /// Values reported by a typical desktop driver
    fn default() -> Self {
        Self {
            uniform_buffer_descriptor_size: 16,
            storage_buffer_descriptor_size: 16,
            combined_image_sampler_descriptor_size: 32,
            descriptor_buffer_offset_alignment: 64,
            min_uniform_buffer_offset_alignment: 64,
            min_storage_buffer_offset_alignment: 16,
            max_descriptor_buffer_bindings: 32,
            max_push_constants_size: 128,
        }
    }
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
