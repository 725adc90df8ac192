/// Vertex input layout synthesis
///
/// Packs the vertex stage's attributes tightly into a single interleaved
/// binding (binding 0, per-vertex), in location order.

use crate::error::{Error, Result};
use crate::reflect::{InputType, ScalarType, ShaderInput};
use crate::engine_error;

const SOURCE: &str = "shader_binding::vertex_layout";

/// Vertex attribute data format (data type and component count)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum VertexFormat {
    // 16-bit float
    R16_SFLOAT,
    R16G16_SFLOAT,
    R16G16B16_SFLOAT,
    R16G16B16A16_SFLOAT,

    // 32-bit float
    R32_SFLOAT,          // float (4 bytes)
    R32G32_SFLOAT,       // vec2 (8 bytes)
    R32G32B32_SFLOAT,    // vec3 (12 bytes)
    R32G32B32A32_SFLOAT, // vec4 (16 bytes)

    // 64-bit float
    R64_SFLOAT,
    R64G64_SFLOAT,
    R64G64B64_SFLOAT,
    R64G64B64A64_SFLOAT,

    // 16-bit integer
    R16_SINT,
    R16G16_SINT,
    R16G16B16_SINT,
    R16G16B16A16_SINT,
    R16_UINT,
    R16G16_UINT,
    R16G16B16_UINT,
    R16G16B16A16_UINT,

    // 32-bit integer
    R32_SINT,
    R32G32_SINT,
    R32G32B32_SINT,
    R32G32B32A32_SINT,
    R32_UINT,
    R32G32_UINT,
    R32G32B32_UINT,
    R32G32B32A32_UINT,

    // 64-bit integer
    R64_SINT,
    R64G64_SINT,
    R64G64B64_SINT,
    R64G64B64A64_SINT,
    R64_UINT,
    R64G64_UINT,
    R64G64B64_UINT,
    R64G64B64A64_UINT,
}

impl VertexFormat {
    /// Format for `components` (1..=4) values of `scalar_type`
    pub fn from_components(scalar_type: ScalarType, components: u32) -> Option<Self> {
        use VertexFormat::*;

        let table: [VertexFormat; 4] = match scalar_type {
            ScalarType::Float16 => [R16_SFLOAT, R16G16_SFLOAT, R16G16B16_SFLOAT, R16G16B16A16_SFLOAT],
            ScalarType::Float32 => [R32_SFLOAT, R32G32_SFLOAT, R32G32B32_SFLOAT, R32G32B32A32_SFLOAT],
            ScalarType::Float64 => [R64_SFLOAT, R64G64_SFLOAT, R64G64B64_SFLOAT, R64G64B64A64_SFLOAT],
            ScalarType::Int16 => [R16_SINT, R16G16_SINT, R16G16B16_SINT, R16G16B16A16_SINT],
            ScalarType::UInt16 => [R16_UINT, R16G16_UINT, R16G16B16_UINT, R16G16B16A16_UINT],
            ScalarType::Int32 => [R32_SINT, R32G32_SINT, R32G32B32_SINT, R32G32B32A32_SINT],
            ScalarType::UInt32 => [R32_UINT, R32G32_UINT, R32G32B32_UINT, R32G32B32A32_UINT],
            ScalarType::Int64 => [R64_SINT, R64G64_SINT, R64G64B64_SINT, R64G64B64A64_SINT],
            ScalarType::UInt64 => [R64_UINT, R64G64_UINT, R64G64B64_UINT, R64G64B64A64_UINT],
            _ => return None,
        };

        match components {
            1..=4 => Some(table[components as usize - 1]),
            _ => None,
        }
    }

    /// Number of components (1 to 4)
    pub fn component_count(&self) -> u32 {
        use VertexFormat::*;
        match self {
            R16_SFLOAT | R32_SFLOAT | R64_SFLOAT | R16_SINT | R16_UINT | R32_SINT | R32_UINT
            | R64_SINT | R64_UINT => 1,
            R16G16_SFLOAT | R32G32_SFLOAT | R64G64_SFLOAT | R16G16_SINT | R16G16_UINT
            | R32G32_SINT | R32G32_UINT | R64G64_SINT | R64G64_UINT => 2,
            R16G16B16_SFLOAT | R32G32B32_SFLOAT | R64G64B64_SFLOAT | R16G16B16_SINT
            | R16G16B16_UINT | R32G32B32_SINT | R32G32B32_UINT | R64G64B64_SINT
            | R64G64B64_UINT => 3,
            _ => 4,
        }
    }

    /// Byte size of one component
    pub fn component_size(&self) -> u32 {
        use VertexFormat::*;
        match self {
            R16_SFLOAT | R16G16_SFLOAT | R16G16B16_SFLOAT | R16G16B16A16_SFLOAT | R16_SINT
            | R16G16_SINT | R16G16B16_SINT | R16G16B16A16_SINT | R16_UINT | R16G16_UINT
            | R16G16B16_UINT | R16G16B16A16_UINT => 2,
            R64_SFLOAT | R64G64_SFLOAT | R64G64B64_SFLOAT | R64G64B64A64_SFLOAT | R64_SINT
            | R64G64_SINT | R64G64B64_SINT | R64G64B64A64_SINT | R64_UINT | R64G64_UINT
            | R64G64B64_UINT | R64G64B64A64_UINT => 8,
            _ => 4,
        }
    }

    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        self.component_count() * self.component_size()
    }

    /// Shader locations one attribute of this format occupies
    ///
    /// 64-bit formats with three or four components take two locations.
    pub fn location_count(&self) -> u32 {
        if self.size_bytes() > 16 {
            2
        } else {
            1
        }
    }
}

/// Vertex input rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexInputRate {
    /// Data is per-vertex
    Vertex,
    /// Data is per-instance
    Instance,
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Binding index
    pub binding: u32,
    pub format: VertexFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex binding description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub binding: u32,
    /// Stride in bytes between consecutive elements
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

/// Vertex input layout of one pipeline
///
/// Empty (no binding, no attribute) when the vertex stage pulls no attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexInputDescription {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexInputDescription {
    /// Stride of binding 0 (0 when empty)
    pub fn stride(&self) -> u32 {
        self.bindings.first().map(|b| b.stride).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Build the interleaved vertex layout for `inputs` (vertex stage inputs, sorted by location)
///
/// Offsets are the prefix sums of the input byte sizes. The binding stride
/// is the total, unless `fixed_stride` gives the size of a known vertex
/// struct, which may not be smaller than the total.
pub fn synthesize(inputs: &[ShaderInput], fixed_stride: Option<u32>) -> Result<VertexInputDescription> {
    if inputs.is_empty() {
        return Ok(VertexInputDescription::default());
    }

    let mut attributes = Vec::with_capacity(inputs.len());
    let mut cursor = 0u32;
    // First location not yet claimed by an earlier attribute
    let mut next_location = 0u32;

    for input in inputs {
        if input.input_type != InputType::StageInput {
            engine_error!(
                SOURCE,
                "{:?} at (set={}, binding={}) is not a vertex stage input",
                input.input_type,
                input.descriptor_set,
                input.descriptor_binding
            );
            return Err(Error::UnsupportedVertexInput(format!(
                "{:?} is not a stage input",
                input.input_type
            )));
        }

        let format = VertexFormat::from_components(input.scalar_type, input.rows).ok_or_else(|| {
            engine_error!(
                SOURCE,
                "Vertex input at location {} has no vertex format ({:?} x {})",
                input.descriptor_location,
                input.scalar_type,
                input.rows
            );
            Error::UnsupportedVertexInput(format!(
                "location {}: {:?} x {}",
                input.descriptor_location, input.scalar_type, input.rows
            ))
        })?;

        // Matrices take one attribute per column
        let columns = input.columns.max(1) * input.array_dimension.max(1);
        let column_size = if input.byte_size > 0 {
            input.byte_size / columns
        } else {
            format.size_bytes()
        };

        if input.descriptor_location < next_location {
            engine_error!(
                SOURCE,
                "Vertex input at location {} overlaps the previous attribute (next free location {})",
                input.descriptor_location,
                next_location
            );
            return Err(Error::UnsupportedVertexInput(format!(
                "location {} overlaps location {}",
                input.descriptor_location,
                next_location - 1
            )));
        }

        let mut location = input.descriptor_location;
        for _ in 0..columns {
            attributes.push(VertexAttribute {
                location,
                binding: 0,
                format,
                offset: cursor,
            });
            location += format.location_count();
            cursor += column_size;
        }
        next_location = location;
    }

    let stride = match fixed_stride {
        Some(stride) if stride < cursor => {
            engine_error!(
                SOURCE,
                "Vertex stride {} is smaller than the {} bytes the shader reads",
                stride,
                cursor
            );
            return Err(Error::InvalidResource(format!(
                "vertex stride {} < attribute size {}",
                stride, cursor
            )));
        }
        Some(stride) => stride,
        None => cursor,
    };

    Ok(VertexInputDescription {
        bindings: vec![VertexBinding {
            binding: 0,
            stride,
            input_rate: VertexInputRate::Vertex,
        }],
        attributes,
    })
}

#[cfg(test)]
#[path = "vertex_layout_tests.rs"]
mod tests;
