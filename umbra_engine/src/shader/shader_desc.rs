/// Compiled shader artifacts

use std::fmt;
use std::path::{Path, PathBuf};
use crate::shader::{ShaderReflection, ShaderStage, SourceLanguage};

/// Handle of a shader inside a [`ShaderManager`](crate::shader::ShaderManager)
///
/// Ids are assigned in load order starting at 0 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

impl ShaderId {
    /// Position in the cache
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Compiler-side state behind one successful compile
///
/// Holds the validated IR the bytecode and reflection were produced from.
/// Owned exclusively by its [`ShaderDesc`]; replacing the descriptor on
/// hot-reload drops the previous request.
pub struct CompileRequest {
    path: PathBuf,
    language: SourceLanguage,
    module: naga::Module,
    info: naga::valid::ModuleInfo,
}

impl CompileRequest {
    pub(crate) fn new(
        path: PathBuf,
        language: SourceLanguage,
        module: naga::Module,
        info: naga::valid::ModuleInfo,
    ) -> Self {
        Self { path, language, module, info }
    }

    /// Resolved path the source was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Validated IR
    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    /// Validation results for [`CompileRequest::module`]
    pub fn info(&self) -> &naga::valid::ModuleInfo {
        &self.info
    }
}

impl fmt::Debug for CompileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileRequest")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("entry_points", &self.module.entry_points.len())
            .finish()
    }
}

/// One compiled shader
#[derive(Debug)]
pub struct ShaderDesc {
    /// File name as requested by the caller (identity)
    pub file_name: String,
    /// Entry point name (identity)
    pub entry_point_name: String,
    /// Requested stage (identity)
    pub stage: ShaderStage,
    /// SPIR-V bytecode, little-endian words
    pub code: Vec<u8>,
    /// Stage as understood by the compiler front end
    pub shader_type: naga::ShaderStage,
    /// Owned reflection of the entry point's interface
    pub reflection: ShaderReflection,
    /// Compile request that produced `code` and `reflection`
    pub request: CompileRequest,
}

impl ShaderDesc {
    /// Bytecode length in bytes
    pub fn code_size(&self) -> usize {
        self.code.len()
    }

    /// Bytecode as 32-bit SPIR-V words
    pub fn code_words(&self) -> Vec<u32> {
        self.code
            .chunks_exact(4)
            .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
            .collect()
    }

    /// Whether this descriptor was compiled for `(file_name, entry_point_name, stage)`
    pub fn matches(&self, file_name: &str, entry_point_name: &str, stage: ShaderStage) -> bool {
        self.file_name == file_name && self.entry_point_name == entry_point_name && self.stage == stage
    }
}
