/*!
# Shader Binding

Backend-agnostic resource binding core for a buffer-resident descriptor
model (Vulkan `VK_EXT_descriptor_buffer`).

At pipeline load time this crate discovers which buffers, textures and
vertex attributes a set of compiled shader stages need, merges those
requirements across stages and lays them out the way the driver expects.

## Architecture

- **reflect**: SPIR-V reflection of one stage (vertex inputs, uniform/storage buffers, samplers)
- **merge**: cross-stage deduplication and stage-mask merging
- **layout**: vertex input layout synthesis and descriptor set layouts
- **descriptor**: descriptor buffers, resource data buffer, texture slot stack
- **DescriptorBackend**: capability trait a GPU backend implements

`build_pipeline_resources` runs the whole chain for one pipeline.
*/

// Internal modules
mod error;
pub mod log;
pub mod limits;
pub mod stage;
pub mod config;
pub mod reflect;
pub mod merge;
pub mod layout;
pub mod descriptor;
pub mod pipeline_resources;
pub mod utils;

#[cfg(test)]
mod mock_backend;

pub use error::{Error, Result};

// Main binding namespace module
pub mod binding {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration and device constants
    pub use crate::config::{BindingConfig, MismatchPolicy};
    pub use crate::limits::{align_up, ImplementationLimits};
    pub use crate::stage::{ShaderStage, ShaderStageFlags};

    // End-to-end construction
    pub use crate::pipeline_resources::{build_pipeline_resources, PipelineResources};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Reflection sub-module
    pub mod reflect {
        pub use crate::reflect::*;
    }

    // Merge sub-module
    pub mod merge {
        pub use crate::merge::*;
    }

    // Layout sub-module
    pub mod layout {
        pub use crate::layout::*;
    }

    // Descriptor sub-module
    pub mod descriptor {
        pub use crate::descriptor::*;
    }
}
