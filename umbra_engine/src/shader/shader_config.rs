/// Shader manager configuration

use std::path::{Path, PathBuf};

/// How aggressively the emitted bytecode is stripped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    /// Keep debug names in the bytecode
    None,
    /// Keep debug names only in debug builds of the host
    Default,
    /// Strip debug names
    #[default]
    Maximal,
}

impl OptimizationLevel {
    /// Whether the emitted SPIR-V carries debug names (OpName, OpMemberName)
    pub fn emits_debug_names(self) -> bool {
        match self {
            OptimizationLevel::None => true,
            OptimizationLevel::Default => cfg!(debug_assertions),
            OptimizationLevel::Maximal => false,
        }
    }
}

/// Target bytecode profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderProfile {
    /// SPIR-V version as (major, minor)
    pub spirv_version: (u8, u8),
}

impl Default for ShaderProfile {
    fn default() -> Self {
        Self { spirv_version: (1, 3) }
    }
}

/// Configuration for [`ShaderManager`](crate::shader::ShaderManager)
#[derive(Debug, Clone, Default)]
pub struct ShaderManagerConfig {
    /// Directory relative shader file names are resolved against
    pub shader_root: Option<PathBuf>,
    /// Optimization level (Maximal by default)
    pub optimization: OptimizationLevel,
    /// Target profile (SPIR-V 1.3 by default)
    pub profile: ShaderProfile,
    /// Embed the source text as debug info in the bytecode
    pub debug_info: bool,
    /// Preprocessor defines (GLSL sources only)
    pub defines: Vec<(String, String)>,
}

impl ShaderManagerConfig {
    /// Config resolving relative file names against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            shader_root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Path the compiler reads for `file_name`
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        let path = Path::new(file_name);
        match &self.shader_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
