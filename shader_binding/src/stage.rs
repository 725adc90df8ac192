/// Shader stages and stage visibility masks

use bitflags::bitflags;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment/Pixel shader
    Fragment,
    /// Compute shader
    Compute,
}

impl ShaderStage {
    /// Visibility mask containing only this stage
    pub fn flag(self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => ShaderStageFlags::FRAGMENT,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

bitflags! {
    /// Shader stage visibility flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x01;
        const FRAGMENT = 0x02;
        const COMPUTE = 0x04;
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

impl ShaderStageFlags {
    /// Build a mask from a list of stages
    pub fn from_stages(stages: &[ShaderStage]) -> Self {
        stages.iter().fold(Self::empty(), |flags, stage| flags | stage.flag())
    }

    /// Whether `stage` can see a binding carrying this mask
    pub fn includes(self, stage: ShaderStage) -> bool {
        self.contains(stage.flag())
    }
}
