/*!
# Umbra Engine

Core shader tooling for the Umbra rendering engine.

This crate is platform-agnostic: it turns shader source into SPIR-V bytecode,
keeps compiled shaders in a hot-reloadable cache, and exposes a reflection
model of every shader's bindings so GPU backends can build descriptor layouts
without hand-maintained constants.

## Architecture

- **ShaderCompiler**: source file + entry point + stage -> `ShaderDesc`
- **ShaderManager**: ordered, reload-oriented cache of `ShaderDesc`
- **ShaderReflection / TypeLayout**: owned reflection tree
- **ReflectionPrinter**: human-readable binding dump
- **Engine**: process-wide log channel, redirectable by the host

Backends (`umbra_engine_renderer_vulkan`) consume the bytecode and reflection.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod shader;

// Main umbra namespace module
pub mod umbra {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging front
    pub use crate::engine::Engine;

    // Logging sub-module (types only; engine_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Shader compilation, cache and reflection
    pub mod shader {
        pub use crate::shader::*;
    }
}

// Re-export math library at crate root
pub use glam;
