/// Reflected shader inputs (vertex attributes and descriptor resources)
///
/// Equality and hashing are structural over every field, members included,
/// so two stages declaring the same block produce equal values.

use crate::descriptor::DescriptorKind;

/// What kind of interface variable a ShaderInput describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Per-vertex attribute read by the vertex stage
    StageInput,
    /// Uniform buffer block
    UniformBuffer,
    /// Storage buffer block
    StorageBuffer,
    /// Texture + sampler binding
    CombinedImageSampler,
}

impl InputType {
    /// Descriptor kind backing this input (None for stage inputs)
    pub fn descriptor_kind(self) -> Option<DescriptorKind> {
        match self {
            InputType::StageInput => None,
            InputType::UniformBuffer => Some(DescriptorKind::UniformBuffer),
            InputType::StorageBuffer => Some(DescriptorKind::StorageBuffer),
            InputType::CombinedImageSampler => Some(DescriptorKind::CombinedImageSampler),
        }
    }
}

/// Element type of an input or struct member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int16,
    Int32,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Struct,
    Image,
    SampledImage,
    Sampler,
}

/// One member of a struct-typed block, laid out as the bytecode declares it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructMember {
    pub scalar_type: ScalarType,
    /// Vector component count (1 for scalars)
    pub rows: u32,
    /// Matrix column count (1 for scalars and vectors)
    pub columns: u32,
    /// Array length (1 when not an array, 0 for runtime-sized arrays)
    pub array_dimension: u32,
    pub byte_size: u32,
    pub byte_offset: u32,
    /// Members of a nested struct (empty otherwise)
    pub members: Vec<StructMember>,
}

/// One reflected resource or vertex attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderInput {
    pub descriptor_set: u32,
    /// Attribute location (stage inputs only)
    pub descriptor_location: u32,
    pub descriptor_binding: u32,
    pub input_type: InputType,
    pub scalar_type: ScalarType,
    pub rows: u32,
    pub columns: u32,
    pub array_dimension: u32,
    pub byte_size: u32,
    pub members: Vec<StructMember>,
}

impl ShaderInput {
    /// Vertex attribute at `location`
    pub fn stage_input(location: u32, scalar_type: ScalarType, rows: u32, byte_size: u32) -> Self {
        Self {
            descriptor_set: 0,
            descriptor_location: location,
            descriptor_binding: 0,
            input_type: InputType::StageInput,
            scalar_type,
            rows,
            columns: 1,
            array_dimension: 1,
            byte_size,
            members: Vec::new(),
        }
    }

    /// Struct-typed buffer block at (set, binding)
    pub fn buffer(
        input_type: InputType,
        set: u32,
        binding: u32,
        byte_size: u32,
        members: Vec<StructMember>,
    ) -> Self {
        Self {
            descriptor_set: set,
            descriptor_location: 0,
            descriptor_binding: binding,
            input_type,
            scalar_type: ScalarType::Struct,
            rows: 1,
            columns: 1,
            array_dimension: 1,
            byte_size,
            members,
        }
    }

    /// Combined image sampler at (set, binding)
    pub fn combined_image_sampler(set: u32, binding: u32) -> Self {
        Self {
            descriptor_set: set,
            descriptor_location: 0,
            descriptor_binding: binding,
            input_type: InputType::CombinedImageSampler,
            scalar_type: ScalarType::SampledImage,
            rows: 1,
            columns: 1,
            array_dimension: 1,
            byte_size: 0,
            members: Vec::new(),
        }
    }

    /// Whether the block has no fixed byte size (empty, or ending in a runtime-sized array)
    pub fn is_runtime_sized(&self) -> bool {
        self.byte_size == 0 || self.members.last().is_some_and(|m| m.array_dimension == 0)
    }
}
