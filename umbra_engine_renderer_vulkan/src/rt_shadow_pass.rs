/// RtShadowPass - ray-traced shadow compute pass
///
/// Owns one compute pipeline built from the shadow kernel bytecode and one
/// descriptor set plus uniform buffer per frame in flight. Scene buffers and
/// image views belong to the host; the pass only stores their handles.
///
/// Descriptor sets are rebuilt lazily: any setter marks every frame slot
/// dirty, and `record` rewrites a slot's set only when that slot is dirty.

use ash::vk;
use std::sync::Arc;
use umbra_engine::umbra::{Error, Result};
use umbra_engine::umbra::shader::ShaderReflection;
use umbra_engine::{engine_bail, engine_debug, engine_err, engine_info, engine_warn};

use crate::shadow_binding_layout::{ShadowBindingLayout, ShadowResource};
use crate::uniforms::{ShadowCamera, UniformBufferObject};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_shader::ComputeShader;

const LOG_SOURCE: &str = "umbra::vulkan::RtShadowPass";

// ============================================================================
// Configuration
// ============================================================================

/// Shadow pass configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtShadowPassConfig {
    /// Number of frame slots (uniform buffers and descriptor sets)
    pub frames_in_flight: usize,
    /// Workgroup size used when the kernel does not report one
    pub workgroup_size_fallback: [u32; 2],
}

impl Default for RtShadowPassConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            workgroup_size_fallback: [16, 16],
        }
    }
}

/// Geometry buffer images sampled by the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GBuffer {
    /// World-space position (w = 0 marks background)
    pub wpos: vk::ImageView,
    /// World-space normal
    pub normal: vk::ImageView,
}

// ============================================================================
// Pass
// ============================================================================

/// GPU objects that exist between `init` and `on_destroy`
struct PassObjects {
    ctx: Arc<GpuContext>,
    layout: ShadowBindingLayout,
    shader: ComputeShader,
    descriptor_set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
    descriptor_pool: vk::DescriptorPool,
    descriptor_sets: Vec<vk::DescriptorSet>,
    uniform_buffers: Vec<Buffer>,
}

pub struct RtShadowPass {
    config: RtShadowPassConfig,
    objects: Option<PassObjects>,

    bvh_nodes: vk::Buffer,
    bvh_triangles: vk::Buffer,
    lights: vk::Buffer,
    gbuffer: GBuffer,
    output_view: vk::ImageView,

    /// One flag per frame slot: its descriptor set must be rewritten
    dirty: Vec<bool>,
}

impl RtShadowPass {
    pub fn new(config: RtShadowPassConfig) -> Self {
        let frames = config.frames_in_flight.max(1);
        Self {
            config: RtShadowPassConfig {
                frames_in_flight: frames,
                ..config
            },
            objects: None,
            bvh_nodes: vk::Buffer::null(),
            bvh_triangles: vk::Buffer::null(),
            lights: vk::Buffer::null(),
            gbuffer: GBuffer::default(),
            output_view: vk::ImageView::null(),
            dirty: vec![true; frames],
        }
    }

    pub fn config(&self) -> &RtShadowPassConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.objects.is_some()
    }

    /// Build the pipeline and per-frame resources
    ///
    /// # Arguments
    ///
    /// * `ctx` - Device and allocator the pass creates its objects with
    /// * `cs_code` - SPIR-V bytecode of the shadow kernel
    /// * `reflection` - Reflection of the same compile
    /// * `descriptor_pool` - Host pool the frame descriptor sets come from.
    ///   It must be created with `vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET`
    ///   since `on_destroy` hands the sets back to it.
    ///
    /// Calling `init` on an initialized pass rebuilds it, which is how a
    /// hot-reloaded kernel is picked up. The pool only ever holds one
    /// generation of sets. On failure the pass is left uninitialized.
    pub fn init(
        &mut self,
        ctx: Arc<GpuContext>,
        cs_code: &[u8],
        reflection: &ShaderReflection,
        descriptor_pool: vk::DescriptorPool,
    ) -> Result<()> {
        self.on_destroy();

        let layout = ShadowBindingLayout::from_reflection(reflection, self.config.workgroup_size_fallback)?;
        let objects = Self::create_objects(ctx, layout, cs_code, descriptor_pool, self.config.frames_in_flight)?;

        engine_info!(LOG_SOURCE,
            "Initialized '{}' with {} frame slots, workgroup {:?}",
            objects.shader.entry_point().to_string_lossy(),
            objects.descriptor_sets.len(),
            objects.layout.workgroup_size());

        self.objects = Some(objects);
        self.mark_all_dirty();
        Ok(())
    }

    fn create_objects(
        ctx: Arc<GpuContext>,
        layout: ShadowBindingLayout,
        cs_code: &[u8],
        descriptor_pool: vk::DescriptorPool,
        frames: usize,
    ) -> Result<PassObjects> {
        let shader = ComputeShader::new(Arc::clone(&ctx), cs_code, layout.entry_point())?;

        let mut uniform_buffers = Vec::with_capacity(frames);
        for slot in 0..frames {
            uniform_buffers.push(Buffer::new_host_visible(
                Arc::clone(&ctx),
                UniformBufferObject::SIZE as u64,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                &format!("rt_shadow_ubo_{}", slot),
            )?);
        }

        let device = &ctx.device;
        unsafe {
            let bindings = layout.layout_bindings();
            let layout_create = vk::DescriptorSetLayoutCreateInfo::default()
                .bindings(&bindings);
            let descriptor_set_layout = device.create_descriptor_set_layout(&layout_create, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create descriptor set layout: {:?}", e))?;

            let set_layouts = [descriptor_set_layout];
            let pipeline_layout_create = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(&set_layouts);
            let pipeline_layout = match device.create_pipeline_layout(&pipeline_layout_create, None) {
                Ok(pipeline_layout) => pipeline_layout,
                Err(e) => {
                    device.destroy_descriptor_set_layout(descriptor_set_layout, None);
                    engine_bail!(LOG_SOURCE, "Failed to create pipeline layout: {:?}", e);
                }
            };

            let pipeline_create_info = vk::ComputePipelineCreateInfo::default()
                .stage(shader.stage_info())
                .layout(pipeline_layout);
            let pipeline = match device.create_compute_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_create_info],
                None,
            ) {
                Ok(pipelines) => pipelines[0],
                Err((_, e)) => {
                    device.destroy_pipeline_layout(pipeline_layout, None);
                    device.destroy_descriptor_set_layout(descriptor_set_layout, None);
                    engine_bail!(LOG_SOURCE, "Failed to create compute pipeline: {:?}", e);
                }
            };

            let set_layouts = vec![descriptor_set_layout; frames];
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(descriptor_pool)
                .set_layouts(&set_layouts);
            let descriptor_sets = match device.allocate_descriptor_sets(&allocate_info) {
                Ok(sets) => sets,
                Err(e) => {
                    device.destroy_pipeline(pipeline, None);
                    device.destroy_pipeline_layout(pipeline_layout, None);
                    device.destroy_descriptor_set_layout(descriptor_set_layout, None);
                    engine_bail!(LOG_SOURCE, "Failed to allocate {} descriptor sets: {:?}", frames, e);
                }
            };

            Ok(PassObjects {
                ctx,
                layout,
                shader,
                descriptor_set_layout,
                pipeline_layout,
                pipeline,
                descriptor_pool,
                descriptor_sets,
                uniform_buffers,
            })
        }
    }

    // ===== EXTERNAL RESOURCES =====

    pub fn set_bvh_buffers(&mut self, nodes: vk::Buffer, triangles: vk::Buffer) {
        self.bvh_nodes = nodes;
        self.bvh_triangles = triangles;
        self.mark_all_dirty();
    }

    pub fn set_lights_buffer(&mut self, lights: vk::Buffer) {
        self.lights = lights;
        self.mark_all_dirty();
    }

    pub fn set_gbuffer(&mut self, gbuffer: GBuffer) {
        self.gbuffer = gbuffer;
        self.mark_all_dirty();
    }

    pub fn set_output_image_view(&mut self, view: vk::ImageView) {
        self.output_view = view;
        self.mark_all_dirty();
    }

    /// Per-slot rebuild flags
    pub fn dirty_flags(&self) -> &[bool] {
        &self.dirty
    }

    fn mark_all_dirty(&mut self) {
        self.dirty.iter_mut().for_each(|flag| *flag = true);
    }

    /// External resources not set yet (null handles), in binding order
    pub fn missing_resources(&self) -> Vec<ShadowResource> {
        ShadowResource::ALL
            .into_iter()
            .filter(|resource| match resource {
                ShadowResource::Uniforms => false,
                ShadowResource::GBufferWorldPosition => self.gbuffer.wpos == vk::ImageView::null(),
                ShadowResource::GBufferNormal => self.gbuffer.normal == vk::ImageView::null(),
                ShadowResource::BvhNodes => self.bvh_nodes == vk::Buffer::null(),
                ShadowResource::BvhTriangles => self.bvh_triangles == vk::Buffer::null(),
                ShadowResource::Lights => self.lights == vk::Buffer::null(),
                ShadowResource::Output => self.output_view == vk::ImageView::null(),
            })
            .collect()
    }

    // ===== PER FRAME =====

    /// Write the camera and frame data of slot `current_image`
    pub fn update_uniform_buffer(
        &self,
        current_image: usize,
        frame_number: u32,
        camera: &ShadowCamera,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let slot = self.check_slot(current_image)?;
        let objects = self.objects()?;
        let ubo = UniformBufferObject::new(frame_number, camera, width, height);
        objects.uniform_buffers[slot].update(0, ubo.as_bytes())
    }

    /// Record the dispatch for slot `image_index` into `cmd`
    ///
    /// Rewrites the slot's descriptor set first if it is dirty. Fails with
    /// `InvalidResource` if the pass is not initialized or an external
    /// resource has not been set.
    pub fn record(&mut self, cmd: vk::CommandBuffer, width: u32, height: u32, image_index: usize) -> Result<()> {
        let slot = self.check_slot(image_index)?;
        self.objects()?;

        if self.dirty[slot] {
            self.write_descriptor_set(slot)?;
            self.dirty[slot] = false;
        }

        let objects = self.objects()?;
        let groups = objects.layout.dispatch_group_count(width, height);
        let device = &objects.ctx.device;
        unsafe {
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::COMPUTE, objects.pipeline);
            device.cmd_bind_descriptor_sets(
                cmd,
                vk::PipelineBindPoint::COMPUTE,
                objects.pipeline_layout,
                0,
                &[objects.descriptor_sets[slot]],
                &[],
            );
            device.cmd_dispatch(cmd, groups[0], groups[1], groups[2]);
        }
        Ok(())
    }

    fn write_descriptor_set(&self, slot: usize) -> Result<()> {
        let missing = self.missing_resources();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|r| r.parameter_name()).collect();
            return Err(invalid(format!("shadow pass resources not set: {}", names.join(", "))));
        }

        let objects = self.objects()?;
        let set = objects.descriptor_sets[slot];

        let buffer_info = |buffer: vk::Buffer| {
            [vk::DescriptorBufferInfo::default()
                .buffer(buffer)
                .offset(0)
                .range(vk::WHOLE_SIZE)]
        };
        let image_info = |view: vk::ImageView, layout: vk::ImageLayout| {
            [vk::DescriptorImageInfo::default()
                .image_view(view)
                .image_layout(layout)]
        };

        let ubo_info = buffer_info(objects.uniform_buffers[slot].handle());
        let nodes_info = buffer_info(self.bvh_nodes);
        let triangles_info = buffer_info(self.bvh_triangles);
        let lights_info = buffer_info(self.lights);
        let wpos_info = image_info(self.gbuffer.wpos, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        let normal_info = image_info(self.gbuffer.normal, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        let output_info = image_info(self.output_view, vk::ImageLayout::GENERAL);

        let writes: Vec<vk::WriteDescriptorSet> = objects
            .layout
            .bindings()
            .iter()
            .map(|b| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(b.binding)
                    .dst_array_element(0)
                    .descriptor_type(b.descriptor_type);
                match b.resource {
                    ShadowResource::Uniforms => write.buffer_info(&ubo_info),
                    ShadowResource::BvhNodes => write.buffer_info(&nodes_info),
                    ShadowResource::BvhTriangles => write.buffer_info(&triangles_info),
                    ShadowResource::Lights => write.buffer_info(&lights_info),
                    ShadowResource::GBufferWorldPosition => write.image_info(&wpos_info),
                    ShadowResource::GBufferNormal => write.image_info(&normal_info),
                    ShadowResource::Output => write.image_info(&output_info),
                }
            })
            .collect();

        unsafe {
            objects.ctx.device.update_descriptor_sets(&writes, &[]);
        }
        engine_debug!(LOG_SOURCE, "Rebuilt descriptor set of frame slot {}", slot);
        Ok(())
    }

    // ===== TEARDOWN =====

    /// Destroy every object created by `init`; safe to call repeatedly
    ///
    /// The caller must make sure the GPU no longer uses the pass and that the
    /// host pool given to `init` is still alive. The frame descriptor sets
    /// are freed back to that pool.
    pub fn on_destroy(&mut self) {
        let Some(objects) = self.objects.take() else {
            return;
        };

        unsafe {
            let device = &objects.ctx.device;
            if let Err(e) = device.free_descriptor_sets(objects.descriptor_pool, &objects.descriptor_sets) {
                engine_warn!(LOG_SOURCE, "Failed to free {} descriptor sets: {:?}", objects.descriptor_sets.len(), e);
            }
            device.destroy_pipeline(objects.pipeline, None);
            device.destroy_pipeline_layout(objects.pipeline_layout, None);
            device.destroy_descriptor_set_layout(objects.descriptor_set_layout, None);
        }
        engine_debug!(LOG_SOURCE, "Destroyed pipeline '{}'", objects.layout.entry_point());

        // Shader module and uniform buffers release themselves
        drop(objects);
        self.mark_all_dirty();
    }

    // ===== HELPERS =====

    fn objects(&self) -> Result<&PassObjects> {
        self.objects
            .as_ref()
            .ok_or_else(|| {
                engine_warn!(LOG_SOURCE, "Shadow pass used before init");
                Error::InitializationFailed("shadow pass used before init".to_string())
            })
    }

    fn check_slot(&self, index: usize) -> Result<usize> {
        if index >= self.config.frames_in_flight {
            return Err(invalid(format!(
                "frame slot {} out of range ({} frames in flight)",
                index, self.config.frames_in_flight
            )));
        }
        Ok(index)
    }
}

impl Drop for RtShadowPass {
    fn drop(&mut self) {
        self.on_destroy();
    }
}

fn invalid(message: String) -> Error {
    engine_warn!(LOG_SOURCE, "{}", message);
    Error::InvalidResource(message)
}

#[cfg(test)]
#[path = "rt_shadow_pass_tests.rs"]
mod tests;
