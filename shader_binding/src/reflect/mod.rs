/// Shader bytecode reflection

pub mod shader_input;
pub mod reflector;

pub use shader_input::*;
pub use reflector::{
    bytecode_to_words, reflect, reflect_shader, reflect_words, ReflectedShader, ShaderBytecode,
};
