/*!
# Umbra Engine - Vulkan Backend

Vulkan host for the ray-traced shadow compute pass.

Uses the Ash library for Vulkan bindings and gpu-allocator for memory
management. The host application owns the instance, device, command buffers
and scene resources; this crate builds the compute pipeline from bytecode
produced by `umbra_engine::umbra::shader::ShaderManager` and records the
per-frame dispatch.

The shadow kernel source ships with the crate (`shaders/rtshadows.wgsl`, see
[`SHADOW_KERNEL_FILE`]).
*/

mod vulkan_context;
mod vulkan_buffer;
mod vulkan_shader;
mod uniforms;
mod shadow_binding_layout;
mod rt_shadow_pass;

pub use vulkan_context::GpuContext;
pub use vulkan_buffer::Buffer;
pub use vulkan_shader::ComputeShader;
pub use uniforms::{ShadowCamera, UniformBufferObject};
pub use shadow_binding_layout::{
    descriptor_type, dispatch_group_count, ShadowBinding, ShadowBindingLayout, ShadowResource,
    SHADOW_DESCRIPTOR_SET,
};
pub use rt_shadow_pass::{GBuffer, RtShadowPass, RtShadowPassConfig};

/// File name of the shipped shadow kernel
pub const SHADOW_KERNEL_FILE: &str = "rtshadows.wgsl";

/// Entry point of the shipped shadow kernel
pub const SHADOW_KERNEL_ENTRY_POINT: &str = "computeMain";

/// Directory holding the shipped kernel sources
///
/// Suitable as `ShaderManagerConfig::shader_root`.
pub fn shader_dir() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders")
}
