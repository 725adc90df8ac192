//! Error types for the shader binding core
//!
//! This module defines the error types raised while reflecting shader
//! bytecode, merging stage inputs and building descriptor layouts/buffers.

use std::fmt;

/// Result type for shader binding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Shader binding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer range, slot index, layout description, etc.)
    InvalidResource(String),

    /// Initialization failed (backend, limits query)
    InitializationFailed(String),

    /// Shader bytecode could not be parsed
    MalformedBytecode(String),

    /// A vertex stage input has a type that cannot become a vertex attribute
    UnsupportedVertexInput(String),

    /// The same (set, binding) was declared with different types across stages
    ConflictingBinding {
        set: u32,
        binding: u32,
    },

    /// Descriptor data count does not match the layout's binding count
    BindingDataMismatch {
        expected: usize,
        actual: usize,
    },

    /// Descriptor type not handled by the descriptor writer
    UnsupportedDescriptorType(String),

    /// The texture descriptor stack has no free slot left
    OutOfDescriptorSlots(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::MalformedBytecode(msg) => write!(f, "Malformed shader bytecode: {}", msg),
            Error::UnsupportedVertexInput(msg) => write!(f, "Unsupported vertex input: {}", msg),
            Error::ConflictingBinding { set, binding } => write!(
                f,
                "Conflicting declarations for set={}, binding={}",
                set, binding
            ),
            Error::BindingDataMismatch { expected, actual } => write!(
                f,
                "Binding data mismatch: layout has {} bindings, got {} resources",
                expected, actual
            ),
            Error::UnsupportedDescriptorType(msg) => {
                write!(f, "Unsupported descriptor type: {}", msg)
            }
            Error::OutOfDescriptorSlots(capacity) => write!(
                f,
                "Texture descriptor stack is full ({} slots)",
                capacity
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
