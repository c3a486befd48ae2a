/// Descriptor layout of the shadow kernel, derived from shader reflection
///
/// The kernel's bindings are looked up by parameter name so the host never
/// hardcodes binding indices: editing the kernel and hot-reloading it only
/// requires the names below to stay declared in set 0.

use ash::vk;
use umbra_engine::umbra::{Error, Result};
use umbra_engine::umbra::shader::{ResourceKind, ShaderReflection, ShaderStage};
use umbra_engine::engine_error;

const LOG_SOURCE: &str = "umbra::vulkan::RtShadowPass";

/// Descriptor set every shadow resource lives in
pub const SHADOW_DESCRIPTOR_SET: u32 = 0;

/// Resources the shadow kernel binds, by reflected parameter name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowResource {
    Uniforms,
    GBufferWorldPosition,
    GBufferNormal,
    BvhNodes,
    BvhTriangles,
    Lights,
    Output,
}

impl ShadowResource {
    pub const ALL: [ShadowResource; 7] = [
        ShadowResource::Uniforms,
        ShadowResource::GBufferWorldPosition,
        ShadowResource::GBufferNormal,
        ShadowResource::BvhNodes,
        ShadowResource::BvhTriangles,
        ShadowResource::Lights,
        ShadowResource::Output,
    ];

    /// Parameter name in `rtshadows.wgsl`
    pub fn parameter_name(self) -> &'static str {
        match self {
            ShadowResource::Uniforms => "ubo",
            ShadowResource::GBufferWorldPosition => "gbWPos",
            ShadowResource::GBufferNormal => "gbNormal",
            ShadowResource::BvhNodes => "bvhNodes",
            ShadowResource::BvhTriangles => "bvhTriangles",
            ShadowResource::Lights => "lights",
            ShadowResource::Output => "output",
        }
    }

    /// Descriptor type the host writes for this resource
    pub fn expected_type(self) -> vk::DescriptorType {
        match self {
            ShadowResource::Uniforms => vk::DescriptorType::UNIFORM_BUFFER,
            ShadowResource::GBufferWorldPosition | ShadowResource::GBufferNormal => {
                vk::DescriptorType::SAMPLED_IMAGE
            }
            ShadowResource::BvhNodes | ShadowResource::BvhTriangles | ShadowResource::Lights => {
                vk::DescriptorType::STORAGE_BUFFER
            }
            ShadowResource::Output => vk::DescriptorType::STORAGE_IMAGE,
        }
    }
}

/// Vulkan descriptor type of a reflected resource
pub fn descriptor_type(kind: ResourceKind) -> vk::DescriptorType {
    match kind {
        ResourceKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        ResourceKind::StorageBuffer { .. } => vk::DescriptorType::STORAGE_BUFFER,
        ResourceKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        ResourceKind::StorageImage { .. } => vk::DescriptorType::STORAGE_IMAGE,
        ResourceKind::Sampler { .. } => vk::DescriptorType::SAMPLER,
        ResourceKind::AccelerationStructure => vk::DescriptorType::ACCELERATION_STRUCTURE_KHR,
    }
}

/// Compute workgroups needed to cover a `width` x `height` image
///
/// Rounds up in both directions; zero-sized workgroup axes count as one.
pub fn dispatch_group_count(width: u32, height: u32, workgroup_size: [u32; 3]) -> [u32; 3] {
    [
        width.div_ceil(workgroup_size[0].max(1)),
        height.div_ceil(workgroup_size[1].max(1)),
        1,
    ]
}

/// One binding of the shadow descriptor set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowBinding {
    pub resource: ShadowResource,
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    pub count: u32,
}

/// Validated binding layout of the shadow kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowBindingLayout {
    bindings: Vec<ShadowBinding>,
    workgroup_size: [u32; 3],
    entry_point: String,
}

impl ShadowBindingLayout {
    /// Derive the layout from the reflection of the compiled kernel
    ///
    /// Fails if the entry point is not a compute shader, a required
    /// resource is missing from set 0, or its reflected kind does not match
    /// the descriptor the host writes for it. A reflected workgroup size
    /// with a zero X or Y axis is replaced by `workgroup_size_fallback`.
    pub fn from_reflection(reflection: &ShaderReflection, workgroup_size_fallback: [u32; 2]) -> Result<Self> {
        if reflection.entry_point.stage != ShaderStage::Compute {
            return Err(invalid(format!(
                "shadow kernel '{}' is a {} shader, expected compute",
                reflection.entry_point.name, reflection.entry_point.stage
            )));
        }

        let mut bindings = Vec::with_capacity(ShadowResource::ALL.len());
        for resource in ShadowResource::ALL {
            let name = resource.parameter_name();
            let descriptor = reflection
                .descriptor(name)
                .ok_or_else(|| invalid(format!("shadow kernel does not declare '{}'", name)))?;

            if descriptor.set != SHADOW_DESCRIPTOR_SET {
                return Err(invalid(format!(
                    "'{}' is bound in set {}, expected set {}",
                    name, descriptor.set, SHADOW_DESCRIPTOR_SET
                )));
            }

            let descriptor_type = descriptor_type(descriptor.kind);
            if descriptor_type != resource.expected_type() {
                return Err(invalid(format!(
                    "'{}' is a {:?} descriptor, expected {:?}",
                    name, descriptor_type, resource.expected_type()
                )));
            }

            bindings.push(ShadowBinding {
                resource,
                binding: descriptor.binding,
                descriptor_type,
                count: descriptor.count,
            });
        }

        let reflected = reflection.entry_point.workgroup_size;
        let workgroup_size = if reflected[0] == 0 || reflected[1] == 0 {
            [workgroup_size_fallback[0], workgroup_size_fallback[1], 1]
        } else {
            reflected
        };

        Ok(Self {
            bindings,
            workgroup_size,
            entry_point: reflection.entry_point.name.clone(),
        })
    }

    pub fn bindings(&self) -> &[ShadowBinding] {
        &self.bindings
    }

    pub fn binding(&self, resource: ShadowResource) -> Option<&ShadowBinding> {
        self.bindings.iter().find(|b| b.resource == resource)
    }

    pub fn workgroup_size(&self) -> [u32; 3] {
        self.workgroup_size
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Bindings for `vkCreateDescriptorSetLayout`, visible to the compute stage
    pub fn layout_bindings(&self) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
        self.bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(b.descriptor_type)
                    .descriptor_count(b.count)
                    .stage_flags(vk::ShaderStageFlags::COMPUTE)
            })
            .collect()
    }

    /// Pool sizes a descriptor pool needs to hold `set_count` shadow sets
    pub fn pool_sizes(&self, set_count: u32) -> Vec<vk::DescriptorPoolSize> {
        let mut sizes: Vec<vk::DescriptorPoolSize> = Vec::new();
        for b in &self.bindings {
            match sizes.iter_mut().find(|s| s.ty == b.descriptor_type) {
                Some(size) => size.descriptor_count += b.count * set_count,
                None => sizes.push(vk::DescriptorPoolSize {
                    ty: b.descriptor_type,
                    descriptor_count: b.count * set_count,
                }),
            }
        }
        sizes
    }

    pub fn dispatch_group_count(&self, width: u32, height: u32) -> [u32; 3] {
        dispatch_group_count(width, height, self.workgroup_size)
    }
}

fn invalid(message: String) -> Error {
    engine_error!(LOG_SOURCE, "{}", message);
    Error::InvalidResource(message)
}

#[cfg(test)]
#[path = "shadow_binding_layout_tests.rs"]
mod tests;
