/// Cross-stage input merging

pub mod stage_input_merger;

pub use stage_input_merger::{StageInputMerger, UniquePipelineInputs};
