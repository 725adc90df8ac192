/// Descriptor set layout descriptions and their driver objects
///
/// `SetLayoutDesc` is the backend-free description the merger produces.
/// `DescriptorSetLayout` owns the driver object built from it. Pipelines
/// share one driver object between identical descriptions, so a binding
/// merged across stages ends up in a single layout, and every set index
/// gets one pipeline-level layout holding all of its bindings.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::descriptor::{DescriptorBackend, DescriptorBinding, DescriptorKind};
use crate::error::{Error, Result};
use crate::stage::{ShaderStage, ShaderStageFlags};
use crate::{engine_debug, engine_error};

const SOURCE: &str = "shader_binding::layout";

// ===== DESCRIPTIONS =====

/// Bindings of one descriptor set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetLayoutDesc {
    /// Set index the layout occupies
    pub set: u32,
    /// Bindings, ordered by binding index
    pub bindings: Vec<DescriptorBinding>,
}

impl SetLayoutDesc {
    pub fn new(set: u32, bindings: Vec<DescriptorBinding>) -> Self {
        Self { set, bindings }
    }

    /// Single combined image sampler at binding 0
    pub fn single_texture(set: u32, stage_flags: ShaderStageFlags) -> Self {
        Self::new(
            set,
            vec![DescriptorBinding {
                binding: 0,
                kind: DescriptorKind::CombinedImageSampler,
                count: 1,
                stage_flags,
            }],
        )
    }

    /// Placeholder set without bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binding entry for `binding`, if present
    pub fn binding(&self, binding: u32) -> Option<&DescriptorBinding> {
        self.bindings.iter().find(|b| b.binding == binding)
    }

    /// Reject descriptions the driver cannot turn into a layout
    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for binding in &self.bindings {
            if !seen.insert(binding.binding) {
                engine_error!(
                    SOURCE,
                    "Set {} declares binding {} more than once",
                    self.set,
                    binding.binding
                );
                return Err(Error::InvalidResource(format!(
                    "duplicate binding {} in set {}",
                    binding.binding, self.set
                )));
            }
            if binding.count == 0 {
                engine_error!(
                    SOURCE,
                    "Binding {} of set {} has zero descriptors",
                    binding.binding,
                    self.set
                );
                return Err(Error::InvalidResource(format!(
                    "binding {} of set {} has count 0",
                    binding.binding, self.set
                )));
            }
        }
        Ok(())
    }
}

/// Ordered set layout descriptions of one stage (one per set index)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSetLayouts {
    pub stage: ShaderStage,
    pub sets: Vec<SetLayoutDesc>,
}

// ===== DRIVER OBJECTS =====

/// Driver set layout flagged for buffer-resident descriptors
pub struct DescriptorSetLayout<B: DescriptorBackend> {
    raw: B::SetLayout,
    desc: SetLayoutDesc,
    /// Byte size reported by the driver for this layout
    size: u64,
}

impl<B: DescriptorBackend> DescriptorSetLayout<B> {
    /// Create the driver object for `desc`
    pub fn build(backend: &B, desc: SetLayoutDesc) -> Result<Self> {
        desc.validate()?;
        let raw = backend.create_set_layout(&desc)?;
        let size = backend.set_layout_size(&raw);

        engine_debug!(
            SOURCE,
            "Created set layout for set {} ({} bindings, {} bytes)",
            desc.set,
            desc.bindings.len(),
            size
        );

        Ok(Self { raw, desc, size })
    }

    /// Driver object
    pub fn raw(&self) -> &B::SetLayout {
        &self.raw
    }

    pub fn desc(&self) -> &SetLayoutDesc {
        &self.desc
    }

    pub fn set_index(&self) -> u32 {
        self.desc.set
    }

    pub fn bindings(&self) -> &[DescriptorBinding] {
        &self.desc.bindings
    }

    /// Driver-reported byte size of the layout's descriptors
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.desc.is_empty()
    }
}

/// Set layouts of one stage, in set index order
pub struct StageLayouts<B: DescriptorBackend> {
    pub stage: ShaderStage,
    pub set_layouts: Vec<Arc<DescriptorSetLayout<B>>>,
}

/// Driver set layouts of every stage of a pipeline
pub struct PipelineLayouts<B: DescriptorBackend> {
    stages: Vec<StageLayouts<B>>,
    /// Pipeline-level layout of every set index: the union of all stages' bindings
    sets: Vec<Arc<DescriptorSetLayout<B>>>,
    /// Distinct layout objects, in creation order
    unique: Vec<Arc<DescriptorSetLayout<B>>>,
}

impl<B: DescriptorBackend> PipelineLayouts<B> {
    pub fn stages(&self) -> &[StageLayouts<B>] {
        &self.stages
    }

    /// Set layouts of `stage`
    pub fn stage(&self, stage: ShaderStage) -> Option<&StageLayouts<B>> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Distinct layout objects shared by the stages and the pipeline sets
    pub fn unique_layouts(&self) -> &[Arc<DescriptorSetLayout<B>>] {
        &self.unique
    }

    /// Pipeline-level layouts in set index order, empty placeholders included
    ///
    /// These are the layouts a pipeline layout is created from and the
    /// layouts descriptor buffers are written against.
    pub fn sets(&self) -> &[Arc<DescriptorSetLayout<B>>] {
        &self.sets
    }

    /// Pipeline-level layout of `set`, holding every binding any stage declares in it
    pub fn set_layout(&self, set: u32) -> Option<&Arc<DescriptorSetLayout<B>>> {
        self.sets.get(set as usize)
    }

    /// Highest set count across stages
    pub fn set_count(&self) -> u32 {
        self.sets.len() as u32
    }
}

/// Build the driver set layouts of every stage and of the pipeline
///
/// Identical (set, bindings) descriptions share one driver object, whichever
/// stage they come from. Each set index also gets a pipeline-level layout
/// listing the bindings of every stage, so a set whose bindings are split
/// between stages still reaches the pipeline layout whole.
pub fn build_pipeline_layouts<B: DescriptorBackend>(
    backend: &B,
    stage_layouts: &[StageSetLayouts],
) -> Result<PipelineLayouts<B>> {
    let max_sets = backend.limits().max_descriptor_buffer_bindings;
    let mut cache = LayoutCache::default();
    let mut stages = Vec::with_capacity(stage_layouts.len());

    for stage_desc in stage_layouts {
        if stage_desc.sets.len() as u32 > max_sets {
            engine_error!(
                SOURCE,
                "{:?} stage uses {} descriptor sets, the device binds at most {}",
                stage_desc.stage,
                stage_desc.sets.len(),
                max_sets
            );
            return Err(Error::InvalidResource(format!(
                "{} descriptor sets exceed the limit of {}",
                stage_desc.sets.len(),
                max_sets
            )));
        }

        let set_layouts = stage_desc
            .sets
            .iter()
            .map(|desc| cache.get_or_build(backend, desc))
            .collect::<Result<Vec<_>>>()?;

        stages.push(StageLayouts {
            stage: stage_desc.stage,
            set_layouts,
        });
    }

    let set_count = stage_layouts.iter().map(|s| s.sets.len()).max().unwrap_or(0);
    let sets = (0..set_count as u32)
        .map(|set| {
            let desc = union_desc(set, stage_layouts)?;
            cache.get_or_build(backend, &desc)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PipelineLayouts {
        stages,
        sets,
        unique: cache.unique,
    })
}

/// Driver layouts keyed by description, plus their creation order
struct LayoutCache<B: DescriptorBackend> {
    by_desc: FxHashMap<SetLayoutDesc, Arc<DescriptorSetLayout<B>>>,
    unique: Vec<Arc<DescriptorSetLayout<B>>>,
}

impl<B: DescriptorBackend> Default for LayoutCache<B> {
    fn default() -> Self {
        Self {
            by_desc: FxHashMap::default(),
            unique: Vec::new(),
        }
    }
}

impl<B: DescriptorBackend> LayoutCache<B> {
    fn get_or_build(&mut self, backend: &B, desc: &SetLayoutDesc) -> Result<Arc<DescriptorSetLayout<B>>> {
        if let Some(layout) = self.by_desc.get(desc) {
            return Ok(Arc::clone(layout));
        }
        let layout = Arc::new(DescriptorSetLayout::build(backend, desc.clone())?);
        self.by_desc.insert(desc.clone(), Arc::clone(&layout));
        self.unique.push(Arc::clone(&layout));
        Ok(layout)
    }
}

/// Every binding of `set` across stages, stage masks merged, ordered by binding
fn union_desc(set: u32, stage_layouts: &[StageSetLayouts]) -> Result<SetLayoutDesc> {
    let mut bindings: Vec<DescriptorBinding> = Vec::new();
    for stage_desc in stage_layouts {
        let Some(desc) = stage_desc.sets.get(set as usize) else {
            continue;
        };
        for binding in &desc.bindings {
            match bindings.iter_mut().find(|b| b.binding == binding.binding) {
                Some(existing) if existing.kind == binding.kind && existing.count == binding.count => {
                    existing.stage_flags |= binding.stage_flags;
                }
                Some(existing) => {
                    engine_error!(
                        SOURCE,
                        "Binding (set={}, binding={}) declared as {:?}[{}] and {:?}[{}] in {:?} stage",
                        set,
                        binding.binding,
                        existing.kind,
                        existing.count,
                        binding.kind,
                        binding.count,
                        stage_desc.stage
                    );
                    return Err(Error::ConflictingBinding {
                        set,
                        binding: binding.binding,
                    });
                }
                None => bindings.push(*binding),
            }
        }
    }
    bindings.sort_by_key(|b| b.binding);
    Ok(SetLayoutDesc::new(set, bindings))
}

#[cfg(test)]
#[path = "descriptor_set_layout_tests.rs"]
mod tests;
