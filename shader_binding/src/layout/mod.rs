/// Vertex input and descriptor set layouts

pub mod vertex_layout;
pub mod descriptor_set_layout;

pub use vertex_layout::{
    synthesize, VertexAttribute, VertexBinding, VertexFormat, VertexInputDescription,
    VertexInputRate,
};
pub use descriptor_set_layout::{
    build_pipeline_layouts, DescriptorSetLayout, PipelineLayouts, SetLayoutDesc, StageLayouts,
    StageSetLayouts,
};
