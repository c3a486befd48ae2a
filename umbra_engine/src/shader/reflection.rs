/// Shader reflection model
///
/// An owned description of a compiled shader's external interface, built
/// once from the validated IR. Nothing here borrows compiler state, so a
/// reflection tree stays valid for as long as the caller keeps it.

use naga::{AddressSpace, ArraySize, Handle, ImageClass, ImageDimension, Module, ScalarKind, StorageAccess, Type, TypeInner};
use naga::valid::ModuleInfo;
use crate::shader::ShaderStage;

// ===== LAYOUT TREE =====

/// Kind of storage a parameter occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterCategory {
    /// Byte range inside an enclosing buffer (offset, size)
    Uniform,
    /// Descriptor binding (binding index, descriptor set)
    DescriptorTableSlot,
    /// Push constant range
    PushConstantBuffer,
}

/// One category a variable occupies, with its location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryBinding {
    pub category: ParameterCategory,
    /// Byte offset for `Uniform`, binding index otherwise
    pub index: u32,
    /// Descriptor set (0 for `Uniform`)
    pub space: u32,
    /// Bytes for `Uniform` and `PushConstantBuffer`, descriptor count otherwise
    pub size: u32,
}

/// Shader-visible resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    UniformBuffer,
    StorageBuffer { read_only: bool },
    SampledImage,
    StorageImage { read: bool, write: bool },
    Sampler { comparison: bool },
    AccelerationStructure,
}

/// Named variable: a top-level shader parameter or a struct field
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLayout {
    pub name: String,
    /// Categories in report order (may be empty)
    pub bindings: Vec<CategoryBinding>,
    pub layout: TypeLayout,
}

impl VariableLayout {
    /// Location for one category, if the variable occupies it
    pub fn binding(&self, category: ParameterCategory) -> Option<&CategoryBinding> {
        self.bindings.iter().find(|b| b.category == category)
    }
}

/// Reflection node, one variant per structural kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypeLayout {
    /// Ordered fields with byte offsets
    Struct {
        name: String,
        size: u32,
        fields: Vec<VariableLayout>,
    },
    /// Single bound resource
    Resource {
        name: String,
        kind: ResourceKind,
    },
    /// Buffer binding wrapping its contents
    ParameterBlock {
        name: String,
        uniform_size: u32,
        element: Option<Box<TypeLayout>>,
    },
    /// Homogeneous sequence; `element_count` is `None` for runtime-sized arrays
    Array {
        element_name: String,
        element_count: Option<u32>,
        stride: u32,
        element: Box<TypeLayout>,
    },
    /// Scalars, vectors, matrices and atomics
    Value {
        name: String,
        size: u32,
    },
}

impl TypeLayout {
    /// Display name of the node
    pub fn name(&self) -> &str {
        match self {
            TypeLayout::Struct { name, .. }
            | TypeLayout::Resource { name, .. }
            | TypeLayout::ParameterBlock { name, .. }
            | TypeLayout::Value { name, .. } => name,
            TypeLayout::Array { element_name, .. } => element_name,
        }
    }

    /// Byte size in the uniform category (0 for opaque resources)
    pub fn uniform_size(&self) -> u32 {
        match self {
            TypeLayout::Struct { size, .. } | TypeLayout::Value { size, .. } => *size,
            TypeLayout::ParameterBlock { uniform_size, .. } => *uniform_size,
            TypeLayout::Array { element_count, stride, .. } => element_count.unwrap_or(0) * stride,
            TypeLayout::Resource { .. } => 0,
        }
    }
}

// ===== FLAT VIEWS =====

/// One descriptor a pipeline layout must provide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorBinding {
    /// Parameter name as declared in the shader
    pub name: String,
    pub set: u32,
    pub binding: u32,
    /// Descriptor count (> 1 for binding arrays)
    pub count: u32,
    pub kind: ResourceKind,
}

/// Entry point the bytecode was emitted for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointReflection {
    pub name: String,
    pub stage: ShaderStage,
    /// Workgroup size (`[0, 0, 0]` for graphics stages)
    pub workgroup_size: [u32; 3],
}

/// Reflection of one compiled shader
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderReflection {
    pub entry_point: EntryPointReflection,
    /// Top-level parameters in declaration order
    pub parameters: Vec<VariableLayout>,
    pub(crate) descriptors: Vec<DescriptorBinding>,
}

impl ShaderReflection {
    /// Build the reflection of `module` for the entry point at `entry_index`
    ///
    /// Only globals that entry point actually uses are reported; `info` is
    /// the validation result of `module`. Returns `None` if `entry_index` is
    /// out of range.
    pub fn from_module(module: &Module, info: &ModuleInfo, entry_index: usize) -> Option<Self> {
        let entry = module.entry_points.get(entry_index)?;
        let usage = info.get_entry_point(entry_index);
        let builder = LayoutBuilder { module };

        let mut parameters = Vec::new();
        let mut descriptors = Vec::new();
        for (handle, global) in module.global_variables.iter() {
            if usage[handle].is_empty() {
                continue;
            }
            if let Some((parameter, descriptor)) = builder.global(global) {
                parameters.push(parameter);
                descriptors.extend(descriptor);
            }
        }
        descriptors.sort_by_key(|d| (d.set, d.binding));

        Some(Self {
            entry_point: EntryPointReflection {
                name: entry.name.clone(),
                stage: ShaderStage::from_naga(entry.stage),
                workgroup_size: entry.workgroup_size,
            },
            parameters,
            descriptors,
        })
    }

    /// Top-level parameter by name
    pub fn parameter(&self, name: &str) -> Option<&VariableLayout> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Every descriptor, sorted by (set, binding)
    pub fn descriptor_bindings(&self) -> &[DescriptorBinding] {
        &self.descriptors
    }

    /// Descriptors of one set, sorted by binding
    pub fn bindings_for_set(&self, set: u32) -> Vec<&DescriptorBinding> {
        self.descriptors.iter().filter(|d| d.set == set).collect()
    }

    /// Descriptor bound to parameter `name`
    pub fn descriptor(&self, name: &str) -> Option<&DescriptorBinding> {
        self.descriptors.iter().find(|d| d.name == name)
    }
}

// ===== BUILDER =====

struct LayoutBuilder<'m> {
    module: &'m Module,
}

impl<'m> LayoutBuilder<'m> {
    fn ty(&self, handle: Handle<Type>) -> &'m Type {
        &self.module.types[handle]
    }

    fn size_of(&self, handle: Handle<Type>) -> u32 {
        self.ty(handle).inner.size(self.module.to_ctx())
    }

    /// Size of the part of a buffer that does not depend on a runtime-sized array
    fn fixed_size(&self, handle: Handle<Type>) -> u32 {
        match self.ty(handle).inner {
            TypeInner::Array { size: ArraySize::Dynamic, .. } => 0,
            TypeInner::Struct { ref members, span } => match members.last() {
                Some(last) if matches!(
                    self.ty(last.ty).inner,
                    TypeInner::Array { size: ArraySize::Dynamic, .. }
                ) => last.offset,
                _ => span,
            },
            _ => self.size_of(handle),
        }
    }

    fn global(&self, global: &naga::GlobalVariable) -> Option<(VariableLayout, Option<DescriptorBinding>)> {
        let name = global.name.clone().unwrap_or_default();

        if global.space == AddressSpace::PushConstant {
            let size = self.size_of(global.ty);
            let parameter = VariableLayout {
                name,
                bindings: vec![CategoryBinding {
                    category: ParameterCategory::PushConstantBuffer,
                    index: 0,
                    space: 0,
                    size,
                }],
                layout: TypeLayout::ParameterBlock {
                    name: format!("push_constant<{}>", self.type_name(global.ty)),
                    uniform_size: size,
                    element: Some(Box::new(self.layout(global.ty))),
                },
            };
            return Some((parameter, None));
        }

        let binding = global.binding.as_ref()?;
        let (layout, kind, count) = match global.space {
            AddressSpace::Uniform => (
                TypeLayout::ParameterBlock {
                    name: format!("uniform<{}>", self.type_name(global.ty)),
                    uniform_size: self.size_of(global.ty),
                    element: Some(Box::new(self.layout(global.ty))),
                },
                ResourceKind::UniformBuffer,
                1,
            ),
            AddressSpace::Storage { access } => {
                let read_only = !access.contains(StorageAccess::STORE);
                let mode = if read_only { "read" } else { "read_write" };
                (
                    TypeLayout::ParameterBlock {
                        name: format!("storage<{}, {}>", self.type_name(global.ty), mode),
                        uniform_size: self.fixed_size(global.ty),
                        element: Some(Box::new(self.layout(global.ty))),
                    },
                    ResourceKind::StorageBuffer { read_only },
                    1,
                )
            }
            AddressSpace::Handle => {
                let (kind, count) = self.handle_kind(global.ty)?;
                (self.layout(global.ty), kind, count)
            }
            _ => return None,
        };

        let parameter = VariableLayout {
            name: name.clone(),
            bindings: vec![CategoryBinding {
                category: ParameterCategory::DescriptorTableSlot,
                index: binding.binding,
                space: binding.group,
                size: count,
            }],
            layout,
        };
        let descriptor = DescriptorBinding {
            name,
            set: binding.group,
            binding: binding.binding,
            count,
            kind,
        };
        Some((parameter, Some(descriptor)))
    }

    /// Resource kind and descriptor count of an opaque handle type
    fn handle_kind(&self, handle: Handle<Type>) -> Option<(ResourceKind, u32)> {
        match self.ty(handle).inner {
            TypeInner::Image { class, .. } => Some((image_kind(class), 1)),
            TypeInner::Sampler { comparison } => Some((ResourceKind::Sampler { comparison }, 1)),
            TypeInner::AccelerationStructure => Some((ResourceKind::AccelerationStructure, 1)),
            TypeInner::BindingArray { base, size } => {
                let (kind, _) = self.handle_kind(base)?;
                let count = match size {
                    ArraySize::Constant(n) => n.get(),
                    ArraySize::Dynamic => 0,
                };
                Some((kind, count))
            }
            _ => None,
        }
    }

    fn layout(&self, handle: Handle<Type>) -> TypeLayout {
        let ty = self.ty(handle);
        match ty.inner {
            TypeInner::Struct { ref members, span } => TypeLayout::Struct {
                name: self.type_name(handle),
                size: span,
                fields: members
                    .iter()
                    .map(|member| VariableLayout {
                        name: member.name.clone().unwrap_or_default(),
                        bindings: vec![CategoryBinding {
                            category: ParameterCategory::Uniform,
                            index: member.offset,
                            space: 0,
                            size: self.size_of(member.ty),
                        }],
                        layout: self.layout(member.ty),
                    })
                    .collect(),
            },
            TypeInner::Array { base, size, stride } => TypeLayout::Array {
                element_name: self.type_name(base),
                element_count: match size {
                    ArraySize::Constant(n) => Some(n.get()),
                    ArraySize::Dynamic => None,
                },
                stride,
                element: Box::new(self.layout(base)),
            },
            TypeInner::BindingArray { base, size } => TypeLayout::Array {
                element_name: self.type_name(base),
                element_count: match size {
                    ArraySize::Constant(n) => Some(n.get()),
                    ArraySize::Dynamic => None,
                },
                stride: 0,
                element: Box::new(self.layout(base)),
            },
            TypeInner::Image { class, .. } => TypeLayout::Resource {
                name: self.type_name(handle),
                kind: image_kind(class),
            },
            TypeInner::Sampler { comparison } => TypeLayout::Resource {
                name: self.type_name(handle),
                kind: ResourceKind::Sampler { comparison },
            },
            TypeInner::AccelerationStructure => TypeLayout::Resource {
                name: self.type_name(handle),
                kind: ResourceKind::AccelerationStructure,
            },
            _ => TypeLayout::Value {
                name: self.type_name(handle),
                size: self.size_of(handle),
            },
        }
    }

    /// Declared name, or the type spelled the way WGSL writes it
    fn type_name(&self, handle: Handle<Type>) -> String {
        let ty = self.ty(handle);
        if let Some(name) = &ty.name {
            return name.clone();
        }
        match ty.inner {
            TypeInner::Scalar(scalar) => scalar_name(scalar),
            TypeInner::Vector { size, scalar } => format!("vec{}<{}>", size as u32, scalar_name(scalar)),
            TypeInner::Matrix { columns, rows, scalar } => {
                format!("mat{}x{}<{}>", columns as u32, rows as u32, scalar_name(scalar))
            }
            TypeInner::Atomic(scalar) => format!("atomic<{}>", scalar_name(scalar)),
            TypeInner::Array { base, size: ArraySize::Constant(n), .. } => {
                format!("array<{}, {}>", self.type_name(base), n)
            }
            TypeInner::Array { base, .. } => format!("array<{}>", self.type_name(base)),
            TypeInner::BindingArray { base, size: ArraySize::Constant(n) } => {
                format!("binding_array<{}, {}>", self.type_name(base), n)
            }
            TypeInner::BindingArray { base, .. } => format!("binding_array<{}>", self.type_name(base)),
            TypeInner::Image { dim, arrayed, class } => image_name(dim, arrayed, class),
            TypeInner::Sampler { comparison: false } => "sampler".to_string(),
            TypeInner::Sampler { comparison: true } => "sampler_comparison".to_string(),
            TypeInner::AccelerationStructure => "acceleration_structure".to_string(),
            TypeInner::RayQuery => "ray_query".to_string(),
            TypeInner::Struct { .. } => "struct".to_string(),
            TypeInner::Pointer { .. } | TypeInner::ValuePointer { .. } => "ptr".to_string(),
        }
    }
}

fn image_kind(class: ImageClass) -> ResourceKind {
    match class {
        ImageClass::Sampled { .. } | ImageClass::Depth { .. } => ResourceKind::SampledImage,
        ImageClass::Storage { access, .. } => ResourceKind::StorageImage {
            read: access.contains(StorageAccess::LOAD),
            write: access.contains(StorageAccess::STORE),
        },
    }
}

fn scalar_name(scalar: naga::Scalar) -> String {
    let prefix = match scalar.kind {
        ScalarKind::Sint => "i",
        ScalarKind::Uint => "u",
        ScalarKind::Float => "f",
        ScalarKind::Bool => return "bool".to_string(),
        ScalarKind::AbstractInt => return "{AbstractInt}".to_string(),
        ScalarKind::AbstractFloat => return "{AbstractFloat}".to_string(),
    };
    format!("{}{}", prefix, scalar.width as u32 * 8)
}

fn image_name(dim: ImageDimension, arrayed: bool, class: ImageClass) -> String {
    let dim = match dim {
        ImageDimension::D1 => "1d",
        ImageDimension::D2 => "2d",
        ImageDimension::D3 => "3d",
        ImageDimension::Cube => "cube",
    };
    let array = if arrayed { "_array" } else { "" };
    match class {
        ImageClass::Sampled { kind, multi } => {
            let sampled = match kind {
                ScalarKind::Sint => "i32",
                ScalarKind::Uint => "u32",
                _ => "f32",
            };
            let multi = if multi { "multisampled_" } else { "" };
            format!("texture_{}{}{}<{}>", multi, dim, array, sampled)
        }
        ImageClass::Depth { multi } => {
            let multi = if multi { "multisampled_" } else { "" };
            format!("texture_depth_{}{}{}", multi, dim, array)
        }
        ImageClass::Storage { format, access } => {
            let access = match (access.contains(StorageAccess::LOAD), access.contains(StorageAccess::STORE)) {
                (true, true) => "read_write",
                (true, false) => "read",
                _ => "write",
            };
            let format = format!("{:?}", format).to_ascii_lowercase();
            format!("texture_storage_{}{}<{}, {}>", dim, array, format, access)
        }
    }
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
