/// End-to-end construction of a pipeline's binding resources
///
/// Reflects every stage, merges the stages' inputs, synthesizes the vertex
/// layout, builds the shared set layouts, lays out the resource data buffer
/// and writes a descriptor buffer for every layout the data buffer serves.

use crate::config::BindingConfig;
use crate::descriptor::{DescriptorBackend, DescriptorBuffer, PipelineBindPoint, ResourceDescriptorBuffer};
use crate::error::Result;
use crate::layout::{build_pipeline_layouts, synthesize, PipelineLayouts, VertexInputDescription};
use crate::merge::{StageInputMerger, UniquePipelineInputs};
use crate::reflect::{reflect_shader, ShaderBytecode};
use crate::stage::ShaderStage;
use crate::{engine_debug, engine_info};

const SOURCE: &str = "shader_binding::pipeline";

/// Everything needed to bind one pipeline's resources
pub struct PipelineResources<B: DescriptorBackend> {
    /// Entry point symbol of every stage, in input order
    pub entry_points: Vec<(ShaderStage, String)>,
    pub unique_inputs: UniquePipelineInputs,
    pub set_layouts: PipelineLayouts<B>,
    pub vertex_input: VertexInputDescription,
    /// One per buffer-only pipeline set, in set index order
    pub descriptor_buffers: Vec<DescriptorBuffer<B>>,
    pub resource_buffer: ResourceDescriptorBuffer<B>,
    pub bind_point: PipelineBindPoint,
}

impl<B: DescriptorBackend> PipelineResources<B> {
    /// Entry point of `stage`
    pub fn entry_point(&self, stage: ShaderStage) -> Option<&str> {
        self.entry_points
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, name)| name.as_str())
    }

    /// Descriptor buffer written for `set`
    pub fn descriptor_buffer(&self, set: u32) -> Option<&DescriptorBuffer<B>> {
        self.descriptor_buffers.iter().find(|b| b.set_index() == set)
    }
}

/// Build the binding resources of the pipeline made of `bytecodes`
///
/// Layouts containing image bindings get no descriptor buffer here: their
/// images belong to the caller, who writes them with `DescriptorBuffer::build`
/// or binds them through a `TextureDescriptorStack`.
pub fn build_pipeline_resources<B: DescriptorBackend>(
    backend: &B,
    bytecodes: &[ShaderBytecode<'_>],
    config: &BindingConfig,
) -> Result<PipelineResources<B>> {
    let reflected = bytecodes
        .iter()
        .map(|bytecode| reflect_shader(bytecode.code, bytecode.stage))
        .collect::<Result<Vec<_>>>()?;

    let bind_point = if reflected.iter().any(|r| r.stage == ShaderStage::Compute) {
        PipelineBindPoint::Compute
    } else {
        PipelineBindPoint::Graphics
    };

    let merger = StageInputMerger::from_reflected(&reflected);
    let unique_inputs = merger.unique_inputs();
    let stage_layouts = merger.descriptor_layouts()?;
    let vertex_input = synthesize(&merger.vertex_inputs(), config.vertex_stride)?;

    let set_layouts = build_pipeline_layouts(backend, &stage_layouts)?;
    let resource_buffer = ResourceDescriptorBuffer::build(backend, &unique_inputs)?;

    let mut descriptor_buffers = Vec::new();
    for layout in set_layouts.sets() {
        if layout.is_empty() {
            continue;
        }
        if layout.bindings().iter().any(|b| !b.kind.is_buffer()) {
            engine_debug!(
                SOURCE,
                "Set {} holds image bindings, its descriptor buffer is left to the caller",
                layout.set_index()
            );
            continue;
        }
        let data = resource_buffer.descriptor_resources(layout.desc())?;
        descriptor_buffers.push(DescriptorBuffer::build(
            backend,
            layout,
            &data,
            bind_point,
            config.mismatch_policy,
        )?);
    }

    engine_info!(
        SOURCE,
        "Pipeline resources: {} stages, {} set layouts, {} descriptor buffers, {} vertex attributes, {} bytes of resource data",
        reflected.len(),
        set_layouts.unique_layouts().len(),
        descriptor_buffers.len(),
        vertex_input.attributes.len(),
        resource_buffer.size()
    );

    Ok(PipelineResources {
        entry_points: reflected
            .into_iter()
            .map(|shader| (shader.stage, shader.entry_point))
            .collect(),
        unique_inputs,
        set_layouts,
        vertex_input,
        descriptor_buffers,
        resource_buffer,
        bind_point,
    })
}

#[cfg(test)]
#[path = "pipeline_resources_tests.rs"]
mod tests;
