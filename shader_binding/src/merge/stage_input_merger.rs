/// Cross-stage deduplication and merging of reflected inputs
///
/// Takes the reflected inputs of every stage of one pipeline and produces
/// the three unique resource lists the resource data buffer is sized from,
/// the per-stage set layout descriptions, and the vertex stage's attributes.

use rustc_hash::FxHashSet;

use crate::descriptor::DescriptorBinding;
use crate::error::{Error, Result};
use crate::layout::{SetLayoutDesc, StageSetLayouts};
use crate::reflect::{InputType, ReflectedShader, ShaderInput};
use crate::stage::ShaderStage;
use crate::{engine_debug, engine_error};

const SOURCE: &str = "shader_binding::merge";

/// Structurally unique descriptor inputs of a pipeline, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniquePipelineInputs {
    pub uniform_buffers: Vec<ShaderInput>,
    pub storage_buffers: Vec<ShaderInput>,
    pub combined_image_samplers: Vec<ShaderInput>,
}

impl UniquePipelineInputs {
    /// Total number of unique descriptor inputs
    pub fn len(&self) -> usize {
        self.uniform_buffers.len() + self.storage_buffers.len() + self.combined_image_samplers.len()
    }

    /// Whether the pipeline declares no descriptor input at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Merges (stage, input) pairs spanning every stage of one pipeline
#[derive(Debug, Clone, Default)]
pub struct StageInputMerger {
    /// Stages in first-seen order (including stages without any input)
    stages: Vec<ShaderStage>,
    pairs: Vec<(ShaderStage, ShaderInput)>,
}

impl StageInputMerger {
    /// Create a merger over explicit (stage, input) pairs
    pub fn new(pairs: Vec<(ShaderStage, ShaderInput)>) -> Self {
        let mut stages = Vec::new();
        for (stage, _) in &pairs {
            if !stages.contains(stage) {
                stages.push(*stage);
            }
        }
        Self { stages, pairs }
    }

    /// Create a merger over reflected stages, in the given stage order
    pub fn from_reflected(shaders: &[ReflectedShader]) -> Self {
        let mut stages = Vec::new();
        let mut pairs = Vec::new();
        for shader in shaders {
            if !stages.contains(&shader.stage) {
                stages.push(shader.stage);
            }
            pairs.extend(shader.inputs.iter().map(|input| (shader.stage, input.clone())));
        }
        Self { stages, pairs }
    }

    /// Stages in first-seen order
    pub fn stages(&self) -> &[ShaderStage] {
        &self.stages
    }

    /// All (stage, input) pairs in insertion order
    pub fn pairs(&self) -> &[(ShaderStage, ShaderInput)] {
        &self.pairs
    }

    /// Structurally unique uniform/storage/sampler inputs, first-seen order
    pub fn unique_inputs(&self) -> UniquePipelineInputs {
        let mut unique = UniquePipelineInputs::default();
        let mut seen: FxHashSet<&ShaderInput> = FxHashSet::default();

        for (_, input) in &self.pairs {
            let list = match input.input_type {
                InputType::StageInput => continue,
                InputType::UniformBuffer => &mut unique.uniform_buffers,
                InputType::StorageBuffer => &mut unique.storage_buffers,
                InputType::CombinedImageSampler => &mut unique.combined_image_samplers,
            };
            // input_type is part of the structural identity, so one set covers all lists
            if seen.insert(input) {
                list.push(input.clone());
            }
        }

        unique
    }

    /// Per-stage set layout descriptions with cross-stage merged bindings
    ///
    /// Every stage gets one entry per set index in `0..=max_set`, empty sets
    /// included, so set indices stay stable across stages. A set only lists
    /// the bindings whose merged stage mask includes that stage.
    pub fn descriptor_layouts(&self) -> Result<Vec<StageSetLayouts>> {
        // (set, merged binding) in first-seen order
        let mut merged: Vec<(u32, DescriptorBinding)> = Vec::new();

        for (stage, input) in &self.pairs {
            let Some(kind) = input.input_type.descriptor_kind() else {
                continue;
            };
            let set = input.descriptor_set;
            let candidate = DescriptorBinding {
                binding: input.descriptor_binding,
                kind,
                count: descriptor_count(input),
                stage_flags: stage.flag(),
            };

            match merged
                .iter_mut()
                .find(|(s, b)| *s == set && b.binding == candidate.binding)
            {
                Some((_, existing)) => {
                    if existing.kind != candidate.kind || existing.count != candidate.count {
                        engine_error!(
                            SOURCE,
                            "Binding (set={}, binding={}) declared as {:?}[{}] and {:?}[{}] in {:?} stage",
                            set,
                            candidate.binding,
                            existing.kind,
                            existing.count,
                            candidate.kind,
                            candidate.count,
                            stage
                        );
                        return Err(Error::ConflictingBinding {
                            set,
                            binding: candidate.binding,
                        });
                    }
                    existing.stage_flags |= candidate.stage_flags;
                }
                None => merged.push((set, candidate)),
            }
        }

        let num_sets = merged.iter().map(|(set, _)| set + 1).max().unwrap_or(0);

        let layouts = self
            .stages
            .iter()
            .map(|&stage| {
                let sets = (0..num_sets)
                    .map(|set| {
                        let mut bindings: Vec<DescriptorBinding> = merged
                            .iter()
                            .filter(|(s, b)| *s == set && b.stage_flags.includes(stage))
                            .map(|(_, b)| *b)
                            .collect();
                        bindings.sort_by_key(|b| b.binding);
                        SetLayoutDesc::new(set, bindings)
                    })
                    .collect();
                StageSetLayouts { stage, sets }
            })
            .collect::<Vec<_>>();

        engine_debug!(
            SOURCE,
            "Merged {} descriptor bindings into {} sets across {} stages",
            merged.len(),
            num_sets,
            self.stages.len()
        );

        Ok(layouts)
    }

    /// Vertex stage attributes sorted by location
    pub fn vertex_inputs(&self) -> Vec<ShaderInput> {
        let mut inputs: Vec<ShaderInput> = self
            .pairs
            .iter()
            .filter(|(stage, input)| {
                *stage == ShaderStage::Vertex && input.input_type == InputType::StageInput
            })
            .map(|(_, input)| input.clone())
            .collect();
        inputs.sort_by_key(|input| input.descriptor_location);
        inputs
    }
}

/// Descriptor array length of a reflected input (1 unless declared as an array)
fn descriptor_count(input: &ShaderInput) -> u32 {
    input.array_dimension.max(1)
}

#[cfg(test)]
#[path = "stage_input_merger_tests.rs"]
mod tests;
