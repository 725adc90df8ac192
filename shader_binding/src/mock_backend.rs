/// Mock descriptor backend for unit tests (no GPU required)
///
/// Buffers live in host memory and get fake, non-overlapping device
/// addresses. Set layouts pack their bindings back to back, each descriptor
/// taking its aligned stride. Descriptor writes encode the resource into the
/// destination bytes so tests can read them back, and bind commands are
/// recorded in order.

use std::cell::{Cell, RefCell};

use crate::descriptor::{
    BindingInfo, BufferUsage, DescriptorBackend, DescriptorKind, DescriptorResource, MappedBuffer,
    PipelineBindPoint,
};
use crate::error::{Error, Result};
use crate::layout::SetLayoutDesc;
use crate::limits::{align_up, ImplementationLimits};
use crate::engine_bail;

// ============================================================================
// Mock Set Layout
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockSetLayout {
    pub id: u32,
    pub desc: SetLayoutDesc,
    /// (binding, offset) in declaration order
    pub offsets: Vec<(u32, u64)>,
    pub size: u64,
}

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub name: String,
    pub usage: BufferUsage,
    pub address: u64,
    pub bytes: Vec<u8>,
}

impl MappedBuffer for MockBuffer {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn device_address(&self) -> u64 {
        self.address
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn mapped_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn mapped_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

// ============================================================================
// Recorded commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCommand {
    BindDescriptorBuffers {
        command_buffer: u64,
        buffers: Vec<BindingInfo>,
    },
    SetDescriptorBufferOffsets {
        command_buffer: u64,
        bind_point: PipelineBindPoint,
        pipeline_layout: u64,
        first_set: u32,
        buffer_indices: Vec<u32>,
        offsets: Vec<u64>,
    },
}

// ============================================================================
// Mock Backend
// ============================================================================

pub struct MockBackend {
    pub limits: ImplementationLimits,
    /// Fail every create_buffer call
    pub fail_buffer_creation: bool,
    layouts_created: Cell<u32>,
    buffers_created: Cell<u32>,
    descriptor_writes: Cell<u32>,
    next_address: Cell<u64>,
    commands: RefCell<Vec<MockCommand>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_limits(ImplementationLimits::default())
    }

    pub fn with_limits(limits: ImplementationLimits) -> Self {
        Self {
            limits,
            fail_buffer_creation: false,
            layouts_created: Cell::new(0),
            buffers_created: Cell::new(0),
            descriptor_writes: Cell::new(0),
            next_address: Cell::new(0x1000_0000),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn layouts_created(&self) -> u32 {
        self.layouts_created.get()
    }

    pub fn buffers_created(&self) -> u32 {
        self.buffers_created.get()
    }

    pub fn descriptor_writes(&self) -> u32 {
        self.descriptor_writes.get()
    }

    pub fn commands(&self) -> Vec<MockCommand> {
        self.commands.borrow().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.borrow_mut().clear();
    }

    /// Bytes the mock writes for a buffer descriptor: address then size, little-endian
    pub fn encode_buffer(address: u64, size: u64) -> Vec<u8> {
        let mut bytes = address.to_le_bytes().to_vec();
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes
    }

    /// Bytes the mock writes for an image descriptor: sampler then view, little-endian
    pub fn encode_image(sampler: u64, image_view: u64) -> Vec<u8> {
        let mut bytes = sampler.to_le_bytes().to_vec();
        bytes.extend_from_slice(&image_view.to_le_bytes());
        bytes
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorBackend for MockBackend {
    type SetLayout = MockSetLayout;
    type Buffer = MockBuffer;
    type CommandBuffer = u64;
    type PipelineLayout = u64;

    fn limits(&self) -> &ImplementationLimits {
        &self.limits
    }

    fn create_set_layout(&self, desc: &SetLayoutDesc) -> Result<MockSetLayout> {
        let mut offsets = Vec::with_capacity(desc.bindings.len());
        let mut cursor = 0;
        for binding in &desc.bindings {
            offsets.push((binding.binding, cursor));
            cursor += self.limits.descriptor_stride(binding.kind) * binding.count as u64;
        }

        let id = self.layouts_created.get();
        self.layouts_created.set(id + 1);

        Ok(MockSetLayout {
            id,
            desc: desc.clone(),
            offsets,
            size: cursor,
        })
    }

    fn set_layout_size(&self, layout: &MockSetLayout) -> u64 {
        layout.size
    }

    fn set_layout_binding_offset(&self, layout: &MockSetLayout, binding: u32) -> u64 {
        layout
            .offsets
            .iter()
            .find(|(b, _)| *b == binding)
            .map(|(_, offset)| *offset)
            .unwrap_or(0)
    }

    fn create_buffer(&self, size: u64, usage: BufferUsage, name: &str) -> Result<MockBuffer> {
        if self.fail_buffer_creation {
            return Err(Error::OutOfMemory);
        }
        if size == 0 {
            engine_bail!("shader_binding::mock", "Buffer '{}' has zero size", name);
        }

        let address = self.next_address.get();
        self.next_address.set(address + align_up(size, 0x1000) + 0x1000);
        self.buffers_created.set(self.buffers_created.get() + 1);

        Ok(MockBuffer {
            name: name.to_string(),
            usage,
            address,
            bytes: vec![0; size as usize],
        })
    }

    fn write_descriptor(
        &self,
        kind: DescriptorKind,
        resource: &DescriptorResource,
        destination: &mut [u8],
    ) -> Result<()> {
        let encoded = match (kind, resource) {
            (DescriptorKind::UniformBuffer | DescriptorKind::StorageBuffer, DescriptorResource::Buffer(subdata)) => {
                Self::encode_buffer(subdata.device_address(), subdata.size)
            }
            (DescriptorKind::CombinedImageSampler, DescriptorResource::CombinedImageSampler(image)) => {
                Self::encode_image(image.sampler, image.image_view)
            }
            _ => {
                return Err(Error::UnsupportedDescriptorType(format!(
                    "{:?} with {:?}",
                    kind, resource
                )))
            }
        };

        let count = encoded.len().min(destination.len());
        destination[..count].copy_from_slice(&encoded[..count]);
        self.descriptor_writes.set(self.descriptor_writes.get() + 1);
        Ok(())
    }

    fn cmd_bind_descriptor_buffers(&self, command_buffer: u64, buffers: &[BindingInfo]) {
        self.commands.borrow_mut().push(MockCommand::BindDescriptorBuffers {
            command_buffer,
            buffers: buffers.to_vec(),
        });
    }

    fn cmd_set_descriptor_buffer_offsets(
        &self,
        command_buffer: u64,
        bind_point: PipelineBindPoint,
        pipeline_layout: u64,
        first_set: u32,
        buffer_indices: &[u32],
        offsets: &[u64],
    ) {
        self.commands.borrow_mut().push(MockCommand::SetDescriptorBufferOffsets {
            command_buffer,
            bind_point,
            pipeline_layout,
            first_set,
            buffer_indices: buffer_indices.to_vec(),
            offsets: offsets.to_vec(),
        });
    }
}
