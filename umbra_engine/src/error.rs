//! Error types for the Umbra engine
//!
//! This module defines the error types used throughout the engine,
//! including shader compilation, cache lookup, and GPU backend plumbing.

use std::fmt;

use crate::shader::ShaderId;

/// Result type for Umbra engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Umbra engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, file system, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, image view, pipeline, etc.)
    InvalidResource(String),

    /// Initialization failed (pass, pipeline, subsystems)
    InitializationFailed(String),

    /// Shader source could not be turned into bytecode
    ShaderCompilation {
        /// Shader source file as requested by the caller
        file: String,
        /// Requested entry point
        entry_point: String,
        /// Compiler diagnostics (may span several lines)
        diagnostics: String,
    },

    /// Shader handle does not refer to a cached shader
    ShaderNotFound(ShaderId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ShaderCompilation { file, entry_point, diagnostics } => write!(
                f,
                "Shader compilation failed ({}:{}): {}",
                file, entry_point, diagnostics
            ),
            Error::ShaderNotFound(id) => write!(f, "Shader not found: {}", id),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
