/// Shader compiler: source file -> SPIR-V bytecode + reflection
///
/// One call compiles one (file, entry point, stage) triple:
///
/// 1. read the source (relative names resolve against the configured root)
/// 2. parse it with the front end matching the file extension
/// 3. validate the IR
/// 4. find the entry point by name and stage
/// 5. emit SPIR-V for that entry point only
/// 6. build the owned reflection tree
///
/// Diagnostics are logged at WARN, failures at ERROR. A failed compile is
/// returned as `Error::ShaderCompilation`; it never panics.

use std::fs;
use std::path::Path;
use naga::back::spv;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use crate::error::{Error, Result};
use crate::shader::{
    CompileRequest, ShaderDesc, ShaderManagerConfig, ShaderReflection, ShaderStage, SourceLanguage,
};

const LOG_SOURCE: &str = "umbra::ShaderCompiler";

/// Compilation session
///
/// Owns the front-end and validator state reused across calls. Not shareable
/// between threads while compiling (`compile` takes `&mut self`).
pub struct ShaderCompiler {
    config: ShaderManagerConfig,
    glsl: naga::front::glsl::Frontend,
    validator: Validator,
}

impl ShaderCompiler {
    pub fn new(config: ShaderManagerConfig) -> Self {
        Self {
            config,
            glsl: naga::front::glsl::Frontend::default(),
            validator: Validator::new(ValidationFlags::all(), Capabilities::all()),
        }
    }

    pub fn config(&self) -> &ShaderManagerConfig {
        &self.config
    }

    /// Compile one entry point of `file_name` for `stage`
    pub fn compile(&mut self, file_name: &str, entry_point_name: &str, stage: ShaderStage) -> Result<ShaderDesc> {
        let path = self.config.resolve(file_name);
        let fail = |diagnostics: String| failure(file_name, entry_point_name, diagnostics);

        let language = SourceLanguage::from_path(&path).ok_or_else(|| {
            fail(format!(
                "unsupported shader source '{}' (expected .wgsl, .glsl, .comp, .vert or .frag)",
                path.display()
            ))
        })?;

        let source = fs::read_to_string(&path)
            .map_err(|e| fail(format!("cannot read '{}': {}", path.display(), e)))?;

        let module = self.parse(language, &source, &path, stage).map_err(&fail)?;

        let info = self
            .validator
            .validate(&module)
            .map_err(|e| fail(e.emit_to_string_with_path(&source, &path.display().to_string())))?;

        let entry_index = module
            .entry_points
            .iter()
            .position(|ep| ep.name == entry_point_name && ep.stage == stage.to_naga())
            .ok_or_else(|| fail(missing_entry_point(&module, entry_point_name, stage)))?;

        let code = self.emit_spirv(&module, &info, &source, &path, entry_point_name, stage).map_err(&fail)?;
        if code.is_empty() {
            return Err(fail("compiler returned no bytecode".to_string()));
        }

        let reflection = ShaderReflection::from_module(&module, &info, entry_index)
            .ok_or_else(|| fail(format!("entry point #{} vanished during reflection", entry_index)))?;

        crate::engine_debug!(
            LOG_SOURCE,
            "Compiled {}:{} ({}) -> {} bytes",
            file_name, entry_point_name, stage, code.len()
        );

        Ok(ShaderDesc {
            file_name: file_name.to_string(),
            entry_point_name: entry_point_name.to_string(),
            stage,
            code,
            shader_type: stage.to_naga(),
            reflection,
            request: CompileRequest::new(path, language, module, info),
        })
    }

    fn parse(
        &mut self,
        language: SourceLanguage,
        source: &str,
        path: &Path,
        stage: ShaderStage,
    ) -> std::result::Result<naga::Module, String> {
        match language {
            SourceLanguage::Wgsl => naga::front::wgsl::parse_str(source)
                .map_err(|e| e.emit_to_string_with_path(source, path)),
            SourceLanguage::Glsl => {
                let mut options = naga::front::glsl::Options::from(stage.to_naga());
                for (name, value) in &self.config.defines {
                    options.defines.insert(name.clone(), value.clone());
                }
                self.glsl.parse(&options, source).map_err(|errors| {
                    errors
                        .iter()
                        .map(|e| format!("{}: {}", path.display(), e))
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
        }
    }

    fn emit_spirv(
        &self,
        module: &naga::Module,
        info: &naga::valid::ModuleInfo,
        source: &str,
        path: &Path,
        entry_point_name: &str,
        stage: ShaderStage,
    ) -> std::result::Result<Vec<u8>, String> {
        let mut flags = spv::WriterFlags::LABEL_VARYINGS | spv::WriterFlags::CLAMP_FRAG_DEPTH;
        if self.config.optimization.emits_debug_names() || self.config.debug_info {
            flags |= spv::WriterFlags::DEBUG;
        }

        let options = spv::Options {
            lang_version: self.config.profile.spirv_version,
            flags,
            debug_info: self.config.debug_info.then_some(spv::DebugInfo {
                source_code: source,
                file_name: path,
            }),
            ..spv::Options::default()
        };
        let pipeline = spv::PipelineOptions {
            shader_stage: stage.to_naga(),
            entry_point: entry_point_name.to_string(),
        };

        let words = spv::write_vec(module, info, &options, Some(&pipeline)).map_err(|e| e.to_string())?;
        Ok(words.iter().flat_map(|word| word.to_le_bytes()).collect())
    }
}

/// Log the diagnostics and the failure, then build the error value
fn failure(file_name: &str, entry_point_name: &str, diagnostics: String) -> Error {
    for line in diagnostics.lines().filter(|l| !l.trim().is_empty()) {
        crate::engine_warn!(LOG_SOURCE, "{}", line);
    }
    crate::engine_error!(LOG_SOURCE, "Failed to compile {}:{}", file_name, entry_point_name);
    Error::ShaderCompilation {
        file: file_name.to_string(),
        entry_point: entry_point_name.to_string(),
        diagnostics,
    }
}

fn missing_entry_point(module: &naga::Module, entry_point_name: &str, stage: ShaderStage) -> String {
    let available: Vec<String> = module
        .entry_points
        .iter()
        .map(|ep| format!("{} ({})", ep.name, ShaderStage::from_naga(ep.stage)))
        .collect();
    format!(
        "no {} entry point named '{}' (available: {})",
        stage,
        entry_point_name,
        if available.is_empty() { "none".to_string() } else { available.join(", ") }
    )
}

#[cfg(test)]
#[path = "shader_compiler_tests.rs"]
mod tests;
