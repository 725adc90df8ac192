/// Capability interface over a buffer-resident descriptor model
///
/// Reflection, merging and layout logic never touch the driver directly.
/// Everything that needs the device goes through `DescriptorBackend`, which
/// the Vulkan crate implements on top of VK_EXT_descriptor_buffer and the
/// unit tests implement with a recording mock.

use crate::descriptor::{BindingInfo, BufferUsage, DescriptorKind, DescriptorResource, PipelineBindPoint};
use crate::error::Result;
use crate::layout::SetLayoutDesc;
use crate::limits::ImplementationLimits;

// ===== MAPPED BUFFER =====

/// Host-visible, persistently mapped GPU buffer with a device address
pub trait MappedBuffer {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Device address of the first byte
    fn device_address(&self) -> u64;

    /// Usage the buffer was created with
    fn usage(&self) -> BufferUsage;

    /// Mapped memory
    fn mapped_bytes(&self) -> &[u8];

    /// Mapped memory (writable, host coherent)
    fn mapped_bytes_mut(&mut self) -> &mut [u8];
}

// ===== DESCRIPTOR BACKEND =====

/// Device-side operations needed to build and bind descriptor buffers
pub trait DescriptorBackend {
    /// Driver set layout object
    type SetLayout;
    /// Mapped buffer type
    type Buffer: MappedBuffer;
    /// Command buffer handle bind commands are recorded into
    type CommandBuffer: Copy;
    /// Pipeline layout handle bind commands refer to
    type PipelineLayout: Copy;

    /// Implementation constants captured at device creation
    fn limits(&self) -> &ImplementationLimits;

    /// Byte size of one descriptor of `kind`
    fn descriptor_byte_size(&self, kind: DescriptorKind) -> u64 {
        self.limits().descriptor_size(kind)
    }

    /// Create a set layout flagged for buffer-resident descriptor storage
    fn create_set_layout(&self, desc: &SetLayoutDesc) -> Result<Self::SetLayout>;

    /// Total byte size descriptors of `layout` occupy in a descriptor buffer
    fn set_layout_size(&self, layout: &Self::SetLayout) -> u64;

    /// Byte offset of `binding` inside a descriptor buffer laid out for `layout`
    fn set_layout_binding_offset(&self, layout: &Self::SetLayout, binding: u32) -> u64;

    /// Create a host-visible, mapped, device-addressable buffer
    fn create_buffer(&self, size: u64, usage: BufferUsage, name: &str) -> Result<Self::Buffer>;

    /// Serialize the opaque descriptor for `resource` into `destination`
    ///
    /// `destination` is exactly `descriptor_byte_size(kind)` bytes long.
    fn write_descriptor(
        &self,
        kind: DescriptorKind,
        resource: &DescriptorResource,
        destination: &mut [u8],
    ) -> Result<()>;

    /// Record a "bind descriptor buffers" command
    fn cmd_bind_descriptor_buffers(&self, command_buffer: Self::CommandBuffer, buffers: &[BindingInfo]);

    /// Record a "set descriptor buffer offsets" command
    #[allow(clippy::too_many_arguments)]
    fn cmd_set_descriptor_buffer_offsets(
        &self,
        command_buffer: Self::CommandBuffer,
        bind_point: PipelineBindPoint,
        pipeline_layout: Self::PipelineLayout,
        first_set: u32,
        buffer_indices: &[u32],
        offsets: &[u64],
    );
}
