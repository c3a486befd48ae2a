/// Shader module - compilation, caching and reflection of GPU shaders

// Module declarations
pub mod shader_stage;
pub mod shader_config;
pub mod shader_desc;
pub mod reflection;
pub mod reflection_printer;
pub mod shader_compiler;
pub mod shader_manager;

// Re-export everything
pub use shader_stage::*;
pub use shader_config::*;
pub use shader_desc::*;
pub use reflection::*;
pub use reflection_printer::*;
pub use shader_compiler::*;
pub use shader_manager::*;
