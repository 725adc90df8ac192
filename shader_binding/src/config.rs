/// Configuration for pipeline resource construction

/// What happens when descriptor data does not match its layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Log an error and fail the build
    #[default]
    Fatal,
    /// Log an error and return an unusable descriptor buffer
    Degrade,
}

/// Binding core configuration
#[derive(Debug, Clone)]
pub struct BindingConfig {
    /// Handling of a binding/data count mismatch in descriptor buffer writes
    pub mismatch_policy: MismatchPolicy,

    /// Capacity of a texture descriptor stack built with `TextureDescriptorStack::from_config`
    pub max_textures: u32,

    /// Fixed vertex struct size, when the mesh layout is known up front
    pub vertex_stride: Option<u32>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            mismatch_policy: MismatchPolicy::Fatal,
            max_textures: 4096,
            vertex_stride: None,
        }
    }
}
