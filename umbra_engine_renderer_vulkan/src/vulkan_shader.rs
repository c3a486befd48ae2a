/// ComputeShader - Vulkan shader module for one compute entry point

use umbra_engine::umbra::Result;
use umbra_engine::{engine_bail_warn, engine_err};
use ash::vk;
use std::ffi::{CStr, CString};
use std::io::Cursor;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const LOG_SOURCE: &str = "umbra::vulkan::ComputeShader";

/// Shader module plus the entry point the pipeline will call
pub struct ComputeShader {
    /// Shared GPU context (for cleanup)
    ctx: Arc<GpuContext>,
    /// Vulkan shader module
    pub(crate) module: vk::ShaderModule,
    /// Entry point name
    pub(crate) entry_point: CString,
}

impl ComputeShader {
    /// Create a shader module from SPIR-V bytecode
    pub fn new(ctx: Arc<GpuContext>, code: &[u8], entry_point: &str) -> Result<Self> {
        if code.is_empty() || code.len() % 4 != 0 {
            engine_bail_warn!(LOG_SOURCE,
                "Shader code not 4-byte aligned (size: {} bytes)", code.len());
        }

        // read_spv copies into aligned words and checks the magic number
        let words = ash::util::read_spv(&mut Cursor::new(code))
            .map_err(|e| engine_err!(LOG_SOURCE, "Invalid SPIR-V bytecode: {}", e))?;

        let entry_point = CString::new(entry_point)
            .map_err(|_| engine_err!(LOG_SOURCE, "Entry point name '{}' contains a NUL byte", entry_point))?;

        let create_info = vk::ShaderModuleCreateInfo::default()
            .code(&words);

        let module = unsafe {
            ctx.device.create_shader_module(&create_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create shader module: {:?}", e))?
        };

        Ok(Self {
            ctx,
            module,
            entry_point,
        })
    }

    pub fn entry_point(&self) -> &CStr {
        &self.entry_point
    }

    /// Stage description for `vkCreateComputePipelines`
    pub(crate) fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(self.module)
            .name(&self.entry_point)
    }
}

impl Drop for ComputeShader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
