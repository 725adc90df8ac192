/// Resource data buffer: one mapped GPU buffer holding the actual uniform
/// and storage data of a pipeline, split into stable per-input ranges.

use crate::descriptor::{
    BufferSubdata, BufferUsage, DescriptorBackend, DescriptorKind, DescriptorResource, MappedBuffer,
};
use crate::error::{Error, Result};
use crate::layout::SetLayoutDesc;
use crate::limits::align_up;
use crate::merge::UniquePipelineInputs;
use crate::reflect::ShaderInput;
use crate::{engine_debug, engine_error};

const SOURCE: &str = "shader_binding::resource_buffer";

/// Byte range backing one uniform or storage buffer input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRange {
    pub kind: DescriptorKind,
    pub set: u32,
    pub binding: u32,
    pub subdata: BufferSubdata,
}

/// Uniform/storage data of a pipeline, laid out once and never moved
pub struct ResourceDescriptorBuffer<B: DescriptorBackend> {
    /// None when the pipeline has no buffer input
    buffer: Option<B::Buffer>,
    ranges: Vec<ResourceRange>,
}

impl<B: DescriptorBackend> ResourceDescriptorBuffer<B> {
    /// Lay out every unique uniform buffer, then every storage buffer
    ///
    /// Each range starts at the implementation's minimum offset alignment
    /// for its kind. Inputs sharing a (set, binding) get one range. The
    /// buffer is allocated once, at the final cursor.
    pub fn build(backend: &B, inputs: &UniquePipelineInputs) -> Result<Self> {
        let limits = backend.limits();
        let mut ranges = Vec::with_capacity(inputs.uniform_buffers.len() + inputs.storage_buffers.len());
        let mut cursor = 0u64;

        let groups: [(DescriptorKind, &[ShaderInput]); 2] = [
            (DescriptorKind::UniformBuffer, inputs.uniform_buffers.as_slice()),
            (DescriptorKind::StorageBuffer, inputs.storage_buffers.as_slice()),
        ];
        for (kind, group) in groups {
            let alignment = limits.data_offset_alignment(kind);
            for (set, binding, size) in shared_ranges(kind, group)? {
                cursor = align_up(cursor, alignment);
                ranges.push(ResourceRange {
                    kind,
                    set,
                    binding,
                    subdata: BufferSubdata {
                        buffer_address: 0,
                        offset: cursor,
                        size,
                    },
                });
                cursor += size;
            }
        }

        if cursor == 0 {
            engine_debug!(SOURCE, "No uniform or storage data, no resource buffer created");
            return Ok(Self { buffer: None, ranges });
        }

        let buffer = backend.create_buffer(
            cursor,
            BufferUsage::UNIFORM | BufferUsage::STORAGE | BufferUsage::DEVICE_ADDRESS,
            "resource data",
        )?;
        let address = buffer.device_address();
        for range in &mut ranges {
            range.subdata.buffer_address = address;
        }

        engine_debug!(
            SOURCE,
            "Laid out {} resource ranges in {} bytes at 0x{:x}",
            ranges.len(),
            cursor,
            address
        );

        Ok(Self {
            buffer: Some(buffer),
            ranges,
        })
    }

    /// Every range, uniform buffers first, in unique-input order
    pub fn ranges(&self) -> &[ResourceRange] {
        &self.ranges
    }

    pub fn range(&self, index: usize) -> Option<&ResourceRange> {
        self.ranges.get(index)
    }

    /// Index and range serving (set, binding)
    pub fn find(&self, set: u32, binding: u32) -> Option<(usize, &ResourceRange)> {
        self.ranges
            .iter()
            .enumerate()
            .find(|(_, r)| r.set == set && r.binding == binding)
    }

    /// Total byte size (0 when no buffer was needed)
    pub fn size(&self) -> u64 {
        self.buffer.as_ref().map(|b| b.size()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_none()
    }

    /// Copy `bytes` to the start of range `index`
    pub fn write(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        let Some(range) = self.ranges.get(index) else {
            engine_error!(SOURCE, "Resource range {} does not exist ({} ranges)", index, self.ranges.len());
            return Err(Error::InvalidResource(format!("resource range {} does not exist", index)));
        };
        if bytes.len() as u64 > range.subdata.size {
            engine_error!(
                SOURCE,
                "Writing {} bytes into resource range {} of {} bytes",
                bytes.len(),
                index,
                range.subdata.size
            );
            return Err(Error::InvalidResource(format!(
                "{} bytes do not fit range {} ({} bytes)",
                bytes.len(),
                index,
                range.subdata.size
            )));
        }

        let start = range.subdata.offset as usize;
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.mapped_bytes_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        }
        Ok(())
    }

    /// Copy a plain-old-data value to the start of range `index`
    pub fn write_pod<T: bytemuck::Pod>(&mut self, index: usize, value: &T) -> Result<()> {
        self.write(index, bytemuck::bytes_of(value))
    }

    /// Current contents of range `index`
    pub fn read(&self, index: usize) -> Option<&[u8]> {
        let range = self.ranges.get(index)?;
        let buffer = self.buffer.as_ref()?;
        let start = range.subdata.offset as usize;
        Some(&buffer.mapped_bytes()[start..start + range.subdata.size as usize])
    }

    /// Descriptor data for every binding of `layout`, taken from this buffer's ranges
    ///
    /// Fails on an image binding or a binding this buffer does not serve.
    pub fn descriptor_resources(&self, layout: &SetLayoutDesc) -> Result<Vec<DescriptorResource>> {
        let mut resources = Vec::with_capacity(layout.bindings.len());
        for binding in &layout.bindings {
            let range = self
                .find(layout.set, binding.binding)
                .map(|(_, range)| range)
                .filter(|range| range.kind == binding.kind)
                .ok_or_else(|| {
                    engine_error!(
                        SOURCE,
                        "No {:?} resource range for (set={}, binding={})",
                        binding.kind,
                        layout.set,
                        binding.binding
                    );
                    Error::InvalidResource(format!(
                        "no resource range for set {} binding {}",
                        layout.set, binding.binding
                    ))
                })?;
            if range.subdata.size == 0 || range.subdata.buffer_address == 0 {
                engine_error!(
                    SOURCE,
                    "Resource range for (set={}, binding={}) is not backed by GPU memory",
                    layout.set,
                    binding.binding
                );
                return Err(Error::InvalidResource(format!(
                    "empty resource range for set {} binding {}",
                    layout.set, binding.binding
                )));
            }
            resources.push(DescriptorResource::Buffer(range.subdata));
        }
        Ok(resources)
    }
}

/// One (set, binding, byte size) per distinct binding of `group`, first-seen order
///
/// Stages may declare the same block with different lengths (a prefix in one
/// stage, the full block in another). They share one range sized to the
/// largest declaration. A block without a fixed size (trailing runtime array)
/// cannot be laid out and fails the build.
fn shared_ranges(kind: DescriptorKind, group: &[ShaderInput]) -> Result<Vec<(u32, u32, u64)>> {
    let mut shared: Vec<(u32, u32, u64)> = Vec::with_capacity(group.len());
    for input in group {
        let (set, binding) = (input.descriptor_set, input.descriptor_binding);
        if input.is_runtime_sized() {
            engine_error!(
                SOURCE,
                "{:?} at (set={}, binding={}) is runtime-sized and cannot get a fixed range",
                kind,
                set,
                binding
            );
            return Err(Error::InvalidResource(format!(
                "runtime-sized {:?} at set {} binding {}",
                kind, set, binding
            )));
        }
        let size = input.byte_size as u64;
        match shared.iter_mut().find(|(s, b, _)| *s == set && *b == binding) {
            Some(entry) => {
                if entry.2 != size {
                    engine_debug!(
                        SOURCE,
                        "{:?} at (set={}, binding={}) declared as {} and {} bytes, using the larger",
                        kind,
                        set,
                        binding,
                        entry.2,
                        size
                    );
                }
                entry.2 = entry.2.max(size);
            }
            None => shared.push((set, binding, size)),
        }
    }
    Ok(shared)
}

#[cfg(test)]
#[path = "resource_buffer_tests.rs"]
mod tests;
