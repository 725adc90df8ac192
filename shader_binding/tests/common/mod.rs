//! Shared helpers for integration tests

pub mod spirv_assembler;
