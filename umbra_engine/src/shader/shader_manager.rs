/// Shader manager - hot-reloadable cache of compiled shaders
///
/// Every `load_shader` call recompiles: the cache exists to keep stable ids
/// across edits, not to skip work. Shaders are identified by
/// (file name, entry point, stage) and are never removed.

use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::shader::{
    describe_reflection, ShaderCompiler, ShaderDesc, ShaderId, ShaderManagerConfig,
    ShaderReflection, ShaderStage,
};

const LOG_SOURCE: &str = "umbra::ShaderManager";

type ShaderKey = (String, String, ShaderStage);

/// Outcome of [`ShaderManager::reload_all_shaders`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Shaders whose bytecode was replaced
    pub reloaded: Vec<ShaderId>,
    /// Shaders that failed to compile and kept their previous bytecode
    pub failed: Vec<ShaderId>,
}

impl ReloadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered shader cache owning its compilation session
pub struct ShaderManager {
    compiler: ShaderCompiler,
    shaders: Vec<ShaderDesc>,
    index: FxHashMap<ShaderKey, ShaderId>,
}

impl ShaderManager {
    pub fn new(config: ShaderManagerConfig) -> Self {
        Self {
            compiler: ShaderCompiler::new(config),
            shaders: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &ShaderManagerConfig {
        self.compiler.config()
    }

    /// Compile `entry_point_name` of `file_name` and store the result
    ///
    /// Returns the existing id if this identity was loaded before, a new id
    /// otherwise. On failure nothing is stored and a previously loaded
    /// version of the same identity stays untouched.
    pub fn load_shader(&mut self, file_name: &str, entry_point_name: &str, stage: ShaderStage) -> Result<ShaderId> {
        let compiled = self.compiler.compile(file_name, entry_point_name, stage);
        let key: ShaderKey = (file_name.to_string(), entry_point_name.to_string(), stage);

        match (self.index.get(&key).copied(), compiled) {
            (Some(id), Ok(desc)) => {
                // Dropping the old descriptor releases its compile request
                self.shaders[id.index()] = desc;
                crate::engine_debug!(LOG_SOURCE, "Reloaded {} {}:{}", id, file_name, entry_point_name);
                Ok(id)
            }
            (None, Ok(desc)) => {
                let id = ShaderId(self.shaders.len() as u32);
                self.shaders.push(desc);
                self.index.insert(key, id);
                crate::engine_debug!(LOG_SOURCE, "Loaded {} {}:{}", id, file_name, entry_point_name);
                Ok(id)
            }
            (Some(id), Err(err)) => {
                crate::engine_warn!(LOG_SOURCE, "Keeping previous bytecode of {} {}:{}", id, file_name, entry_point_name);
                Err(err)
            }
            (None, Err(err)) => Err(err),
        }
    }

    /// Recompile every cached shader in id order
    pub fn reload_all_shaders(&mut self) -> ReloadReport {
        let identities: Vec<ShaderKey> = self
            .shaders
            .iter()
            .map(|s| (s.file_name.clone(), s.entry_point_name.clone(), s.stage))
            .collect();

        let mut report = ReloadReport::default();
        for (position, (file_name, entry_point_name, stage)) in identities.iter().enumerate() {
            let id = ShaderId(position as u32);
            match self.load_shader(file_name, entry_point_name, *stage) {
                Ok(_) => report.reloaded.push(id),
                Err(_) => report.failed.push(id),
            }
        }

        crate::engine_info!(
            LOG_SOURCE,
            "Reloaded {} shaders ({} failed)",
            report.reloaded.len(),
            report.failed.len()
        );
        report
    }

    /// Bytecode of shader `id`; `None` if `id` is out of range
    ///
    /// The slice stays valid until the next mutation of the manager.
    pub fn get_shader_code(&self, id: ShaderId) -> Option<&[u8]> {
        self.shader(id).map(|s| s.code.as_slice())
    }

    /// Log the reflection of shader `id` at INFO; no-op if out of range
    pub fn print_info(&self, id: ShaderId) {
        if let Some(lines) = self.describe(id) {
            for line in lines {
                crate::engine_info!(LOG_SOURCE, "{}", line);
            }
        }
    }

    /// Lines [`ShaderManager::print_info`] would log
    pub fn describe(&self, id: ShaderId) -> Option<Vec<String>> {
        self.reflection(id).map(describe_reflection)
    }

    pub fn shader(&self, id: ShaderId) -> Option<&ShaderDesc> {
        self.shaders.get(id.index())
    }

    /// Like [`ShaderManager::shader`], for callers that propagate with `?`
    pub fn require(&self, id: ShaderId) -> Result<&ShaderDesc> {
        self.shader(id).ok_or_else(|| {
            crate::engine_warn!(LOG_SOURCE, "Shader {} is not loaded ({} cached)", id, self.shaders.len());
            Error::ShaderNotFound(id)
        })
    }

    pub fn reflection(&self, id: ShaderId) -> Option<&ShaderReflection> {
        self.shader(id).map(|s| &s.reflection)
    }

    /// Id of a previously loaded identity
    pub fn find(&self, file_name: &str, entry_point_name: &str, stage: ShaderStage) -> Option<ShaderId> {
        self.index
            .get(&(file_name.to_string(), entry_point_name.to_string(), stage))
            .copied()
    }

    /// Number of cached shaders
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Ids in load order
    pub fn ids(&self) -> impl Iterator<Item = ShaderId> + '_ {
        (0..self.shaders.len() as u32).map(ShaderId)
    }
}

#[cfg(test)]
#[path = "shader_manager_tests.rs"]
mod tests;
