/// SPIR-V reflection via spirq
///
/// Extracts active vertex inputs and descriptor resources from one compiled
/// shader stage. Unreferenced interface variables are dropped, unknown
/// element types are skipped with a warning, and bytecode that cannot be
/// parsed is rejected.

use spirq::ty::{DescriptorType, ScalarType as SpirqScalarType, Type};
use spirq::var::Variable;
use spirq::ReflectConfig;

use crate::error::{Error, Result};
use crate::reflect::{InputType, ScalarType, ShaderInput, StructMember};
use crate::stage::ShaderStage;
use crate::{engine_debug, engine_error, engine_warn};

const SOURCE: &str = "shader_binding::reflect";

/// One compiled shader stage as handed over by the bytecode compiler
#[derive(Debug, Clone, Copy)]
pub struct ShaderBytecode<'a> {
    /// SPIR-V bytecode (little-endian words)
    pub code: &'a [u8],
    /// Stage the bytecode was compiled for
    pub stage: ShaderStage,
}

/// Reflection result for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedShader {
    pub stage: ShaderStage,
    /// Entry point symbol declared by the module (needed to create the driver shader object)
    pub entry_point: String,
    /// Stage inputs by ascending location, then descriptors by ascending (set, binding)
    pub inputs: Vec<ShaderInput>,
}

/// Reflect one stage and return its inputs
pub fn reflect(bytecode: &[u8], stage: ShaderStage) -> Result<Vec<ShaderInput>> {
    Ok(reflect_shader(bytecode, stage)?.inputs)
}

/// Reflect one stage and return its inputs together with the entry point symbol
pub fn reflect_shader(bytecode: &[u8], stage: ShaderStage) -> Result<ReflectedShader> {
    let words = bytecode_to_words(bytecode)?;
    reflect_words(&words, stage)
}

/// Reflect one stage given as SPIR-V words
pub fn reflect_words(words: &[u32], stage: ShaderStage) -> Result<ReflectedShader> {
    let entry_points = ReflectConfig::new()
        .spv(words)
        .ref_all_rscs(false)
        .reflect()
        .map_err(|e| {
            engine_error!(SOURCE, "SPIR-V reflection failed for {:?} stage: {:?}", stage, e);
            Error::MalformedBytecode(format!("{:?}", e))
        })?;

    let wanted = match stage {
        ShaderStage::Vertex => "Vertex",
        ShaderStage::Fragment => "Fragment",
        ShaderStage::Compute => "GLCompute",
    };
    let entry_point = entry_points
        .iter()
        .find(|ep| format!("{:?}", ep.exec_model) == wanted)
        .or_else(|| entry_points.first())
        .ok_or_else(|| {
            engine_error!(SOURCE, "SPIR-V module for {:?} stage declares no entry point", stage);
            Error::MalformedBytecode("no entry point".to_string())
        })?;

    let mut stage_inputs = Vec::new();
    let mut descriptors = Vec::new();

    for var in entry_point.vars.iter() {
        match var {
            Variable::Input { location, ty, .. } if stage == ShaderStage::Vertex => {
                if let Some(input) = translate_stage_input(location.loc(), ty) {
                    stage_inputs.push(input);
                }
            }
            Variable::Descriptor { desc_bind, desc_ty, ty, nbind, .. } => {
                if let Some(input) =
                    translate_descriptor(desc_bind.set(), desc_bind.bind(), desc_ty, ty, *nbind)
                {
                    descriptors.push(input);
                }
            }
            _ => {}
        }
    }

    stage_inputs.sort_by_key(|input| input.descriptor_location);
    descriptors.sort_by_key(|input| (input.descriptor_set, input.descriptor_binding));

    engine_debug!(
        SOURCE,
        "Reflected {:?} stage '{}': {} stage inputs, {} descriptors",
        stage,
        entry_point.name,
        stage_inputs.len(),
        descriptors.len()
    );

    stage_inputs.extend(descriptors);
    Ok(ReflectedShader {
        stage,
        entry_point: entry_point.name.clone(),
        inputs: stage_inputs,
    })
}

/// Reinterpret a byte blob as little-endian SPIR-V words
pub fn bytecode_to_words(bytecode: &[u8]) -> Result<Vec<u32>> {
    if bytecode.is_empty() || bytecode.len() % 4 != 0 {
        engine_error!(
            SOURCE,
            "Shader bytecode size {} is not a non-zero multiple of 4",
            bytecode.len()
        );
        return Err(Error::MalformedBytecode(format!(
            "size {} is not a non-zero multiple of 4",
            bytecode.len()
        )));
    }
    Ok(bytecode
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

// ===== TYPE TRANSLATION =====

/// Shape of a reflected type once mapped onto our scalar table
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TypeShape {
    pub scalar_type: ScalarType,
    pub rows: u32,
    pub columns: u32,
    pub array_dimension: u32,
    pub members: Vec<StructMember>,
}

/// Fixed scalar translation table (None = unrecognized)
pub(crate) fn translate_scalar(scalar: &SpirqScalarType) -> Option<ScalarType> {
    match scalar {
        SpirqScalarType::Boolean => Some(ScalarType::Bool),
        SpirqScalarType::Integer { bits: 16, is_signed: true } => Some(ScalarType::Int16),
        SpirqScalarType::Integer { bits: 32, is_signed: true } => Some(ScalarType::Int32),
        SpirqScalarType::Integer { bits: 64, is_signed: true } => Some(ScalarType::Int64),
        SpirqScalarType::Integer { bits: 16, is_signed: false } => Some(ScalarType::UInt16),
        SpirqScalarType::Integer { bits: 32, is_signed: false } => Some(ScalarType::UInt32),
        SpirqScalarType::Integer { bits: 64, is_signed: false } => Some(ScalarType::UInt64),
        SpirqScalarType::Float { bits: 16 } => Some(ScalarType::Float16),
        SpirqScalarType::Float { bits: 32 } => Some(ScalarType::Float32),
        SpirqScalarType::Float { bits: 64 } => Some(ScalarType::Float64),
        _ => None,
    }
}

/// Recursively map a spirq type onto (scalar type, rows, columns, array length, members)
pub(crate) fn translate_type(ty: &Type) -> Option<TypeShape> {
    match ty {
        Type::Scalar(scalar) => Some(TypeShape {
            scalar_type: translate_scalar(scalar)?,
            rows: 1,
            columns: 1,
            array_dimension: 1,
            members: Vec::new(),
        }),
        Type::Vector(vector) => Some(TypeShape {
            scalar_type: translate_scalar(&vector.scalar_ty)?,
            rows: vector.nscalar,
            columns: 1,
            array_dimension: 1,
            members: Vec::new(),
        }),
        Type::Matrix(matrix) => Some(TypeShape {
            scalar_type: translate_scalar(&matrix.vector_ty.scalar_ty)?,
            rows: matrix.vector_ty.nscalar,
            columns: matrix.nvector,
            array_dimension: 1,
            members: Vec::new(),
        }),
        Type::Array(array) => {
            let element = translate_type(&array.element_ty)?;
            // Runtime-sized arrays have no element count
            let count = array.nelement.unwrap_or(0);
            Some(TypeShape {
                array_dimension: element.array_dimension * count,
                ..element
            })
        }
        Type::Struct(structure) => {
            let mut members = Vec::with_capacity(structure.members.len());
            for member in structure.members.iter() {
                let shape = translate_type(&member.ty)?;
                members.push(StructMember {
                    scalar_type: shape.scalar_type,
                    rows: shape.rows,
                    columns: shape.columns,
                    array_dimension: shape.array_dimension,
                    byte_size: member.ty.nbyte().unwrap_or(0) as u32,
                    byte_offset: member.offset.unwrap_or(0) as u32,
                    members: shape.members,
                });
            }
            Some(TypeShape {
                scalar_type: ScalarType::Struct,
                rows: 1,
                columns: 1,
                array_dimension: 1,
                members,
            })
        }
        _ => None,
    }
}

fn translate_stage_input(location: u32, ty: &Type) -> Option<ShaderInput> {
    let Some(shape) = translate_type(ty) else {
        engine_warn!(SOURCE, "Skipping stage input at location {}: unsupported type {:?}", location, ty);
        return None;
    };
    Some(ShaderInput {
        descriptor_set: 0,
        descriptor_location: location,
        descriptor_binding: 0,
        input_type: InputType::StageInput,
        scalar_type: shape.scalar_type,
        rows: shape.rows,
        columns: shape.columns,
        array_dimension: shape.array_dimension,
        byte_size: ty.nbyte().unwrap_or(0) as u32,
        members: shape.members,
    })
}

fn translate_descriptor(
    set: u32,
    binding: u32,
    desc_ty: &DescriptorType,
    ty: &Type,
    nbind: u32,
) -> Option<ShaderInput> {
    let (input_type, shape) = match desc_ty {
        DescriptorType::UniformBuffer() => (InputType::UniformBuffer, translate_type(ty)),
        DescriptorType::StorageBuffer(..) => (InputType::StorageBuffer, translate_type(ty)),
        DescriptorType::CombinedImageSampler() => (
            InputType::CombinedImageSampler,
            Some(handle_shape(ScalarType::SampledImage)),
        ),
        // Separate images/samplers are bound as combined image samplers
        DescriptorType::SampledImage() => (
            InputType::CombinedImageSampler,
            Some(handle_shape(ScalarType::Image)),
        ),
        DescriptorType::Sampler() => (
            InputType::CombinedImageSampler,
            Some(handle_shape(ScalarType::Sampler)),
        ),
        other => {
            engine_warn!(
                SOURCE,
                "Skipping descriptor (set={}, binding={}): unsupported descriptor type {:?}",
                set,
                binding,
                other
            );
            return None;
        }
    };

    let Some(shape) = shape else {
        engine_warn!(
            SOURCE,
            "Skipping descriptor (set={}, binding={}): unsupported element type {:?}",
            set,
            binding,
            ty
        );
        return None;
    };

    let byte_size = match input_type {
        InputType::CombinedImageSampler => 0,
        _ => ty.nbyte().unwrap_or(0) as u32,
    };

    Some(ShaderInput {
        descriptor_set: set,
        descriptor_location: 0,
        descriptor_binding: binding,
        input_type,
        scalar_type: shape.scalar_type,
        rows: shape.rows,
        columns: shape.columns,
        array_dimension: nbind.max(1) * shape.array_dimension,
        byte_size,
        members: shape.members,
    })
}

fn handle_shape(scalar_type: ScalarType) -> TypeShape {
    TypeShape {
        scalar_type,
        rows: 1,
        columns: 1,
        array_dimension: 1,
        members: Vec::new(),
    }
}

#[cfg(test)]
#[path = "reflector_tests.rs"]
mod tests;
