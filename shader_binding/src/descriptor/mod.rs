/// Descriptor model: kinds, resources, backend capability and descriptor buffers

pub mod types;
pub mod backend;
pub mod descriptor_buffer;
pub mod resource_buffer;
pub mod texture_stack;

pub use types::*;
pub use backend::{DescriptorBackend, MappedBuffer};
pub use descriptor_buffer::{bind_descriptor_buffers, DescriptorBuffer};
pub use resource_buffer::{ResourceDescriptorBuffer, ResourceRange};
pub use texture_stack::TextureDescriptorStack;
