/// Shader stages and source languages

use std::fmt;
use std::path::Path;

/// Pipeline stage a shader entry point is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Pixel/Fragment shader
    Pixel,
    /// Compute shader
    Compute,
}

impl ShaderStage {
    /// Stage as understood by the compiler front end
    pub fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Pixel => naga::ShaderStage::Fragment,
            ShaderStage::Compute => naga::ShaderStage::Compute,
        }
    }

    /// Inverse of [`ShaderStage::to_naga`]
    pub fn from_naga(stage: naga::ShaderStage) -> Self {
        match stage {
            naga::ShaderStage::Vertex => ShaderStage::Vertex,
            naga::ShaderStage::Fragment => ShaderStage::Pixel,
            naga::ShaderStage::Compute => ShaderStage::Compute,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Pixel => write!(f, "pixel"),
            ShaderStage::Compute => write!(f, "compute"),
        }
    }
}

/// High-level shading language of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// WebGPU Shading Language (`.wgsl`)
    Wgsl,
    /// GLSL 4.x (`.glsl`, `.comp`, `.vert`, `.frag`)
    Glsl,
}

impl SourceLanguage {
    /// Detect the language from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "wgsl" => Some(SourceLanguage::Wgsl),
            "glsl" | "comp" | "vert" | "frag" => Some(SourceLanguage::Glsl),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "shader_stage_tests.rs"]
mod tests;
