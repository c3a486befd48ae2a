//! Unit tests for reflection_printer.rs

use crate::log::{Logger, LogEntry, LogSeverity};
use crate::shader::{
    describe_reflection, describe_type_layout, describe_variable, print_variable,
    CategoryBinding, EntryPointReflection, ParameterCategory, ReflectionPrinter, ResourceKind,
    ShaderReflection, ShaderStage, TypeLayout, VariableLayout,
};
use crate::umbra::Engine;
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

// ============================================================================
// TEST HELPERS
// ============================================================================

fn uniform(offset: u32, size: u32) -> Vec<CategoryBinding> {
    vec![CategoryBinding { category: ParameterCategory::Uniform, index: offset, space: 0, size }]
}

fn slot(binding: u32, set: u32) -> Vec<CategoryBinding> {
    vec![CategoryBinding { category: ParameterCategory::DescriptorTableSlot, index: binding, space: set, size: 1 }]
}

fn field(name: &str, offset: u32, layout: TypeLayout) -> VariableLayout {
    let size = layout.uniform_size();
    VariableLayout { name: name.to_string(), bindings: uniform(offset, size), layout }
}

fn value(name: &str, size: u32) -> TypeLayout {
    TypeLayout::Value { name: name.to_string(), size }
}

fn light_struct() -> TypeLayout {
    TypeLayout::Struct {
        name: "Light".to_string(),
        size: 32,
        fields: vec![
            field("position", 0, value("vec3<f32>", 12)),
            field("intensity", 12, value("f32", 4)),
            field("color", 16, value("vec4<f32>", 16)),
        ],
    }
}

// ============================================================================
// STRUCT
// ============================================================================

#[test]
fn test_struct_prints_one_line_per_field_in_order() {
    let lines = describe_type_layout(&light_struct());

    assert_eq!(lines[0], "struct name: Light");
    assert_eq!(lines[1], "field count: 3");
    let fields: Vec<&String> = lines.iter().filter(|l| l.starts_with("field offset:")).collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], "field offset: 0\tname: position\toffset=0, size=12");
    assert_eq!(fields[1], "field offset: 12\tname: intensity\toffset=12, size=4");
    assert_eq!(fields[2], "field offset: 16\tname: color\toffset=16, size=16");
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_nested_struct_recurses() {
    let outer = TypeLayout::Struct {
        name: "Scene".to_string(),
        size: 48,
        fields: vec![field("count", 0, value("u32", 4)), field("sun", 16, light_struct())],
    };

    let lines = describe_type_layout(&outer);
    assert_eq!(lines[3], "field offset: 16\tname: sun\toffset=16, size=32");
    assert_eq!(lines[4], "struct name: Light");
    assert_eq!(lines[5], "field count: 3");
}

// ============================================================================
// RESOURCE, PARAMETER BLOCK, ARRAY, VALUE
// ============================================================================

#[test]
fn test_resource_prints_type_name() {
    let layout = TypeLayout::Resource { name: "texture_2d<f32>".to_string(), kind: ResourceKind::SampledImage };
    assert_eq!(describe_type_layout(&layout), vec!["type: texture_2d<f32>"]);
}

#[test]
fn test_parameter_block_prints_size_and_element() {
    let layout = TypeLayout::ParameterBlock {
        name: "uniform<Light>".to_string(),
        uniform_size: 32,
        element: Some(Box::new(light_struct())),
    };
    let lines = describe_type_layout(&layout);
    assert_eq!(lines[0], "uniform<Light>");
    assert_eq!(lines[1], "const buffer size: 32");
    assert_eq!(lines[2], "struct name: Light");
}

#[test]
fn test_parameter_block_without_element() {
    let layout = TypeLayout::ParameterBlock { name: "block".to_string(), uniform_size: 0, element: None };
    assert_eq!(describe_type_layout(&layout), vec!["block", "const buffer size: 0"]);
}

#[test]
fn test_array_prints_element_and_count_without_recursing() {
    let sized = TypeLayout::Array {
        element_name: "Light".to_string(),
        element_count: Some(4),
        stride: 32,
        element: Box::new(light_struct()),
    };
    assert_eq!(describe_type_layout(&sized), vec!["array Light[4]"]);

    let runtime = TypeLayout::Array {
        element_name: "BvhNode".to_string(),
        element_count: None,
        stride: 32,
        element: Box::new(value("BvhNode", 32)),
    };
    assert_eq!(describe_type_layout(&runtime), vec!["array BvhNode[]"]);
}

#[test]
fn test_value_prints_nothing() {
    assert!(describe_type_layout(&value("mat4x4<f32>", 64)).is_empty());
}

// ============================================================================
// VARIABLES AND WHOLE REFLECTION
// ============================================================================

#[test]
fn test_variable_prints_binding_and_set() {
    let variable = VariableLayout {
        name: "gbNormal".to_string(),
        bindings: slot(2, 1),
        layout: TypeLayout::Resource { name: "texture_2d<f32>".to_string(), kind: ResourceKind::SampledImage },
    };
    assert_eq!(describe_variable(&variable), vec!["name: gbNormal\tbinding=2, set=1", "type: texture_2d<f32>"]);
}

#[test]
fn test_variable_with_several_categories_prints_one_line_each() {
    let mut bindings = slot(0, 0);
    bindings.extend(uniform(64, 16));
    let variable = VariableLayout { name: "mixed".to_string(), bindings, layout: value("vec4<f32>", 16) };

    assert_eq!(describe_variable(&variable), vec!["name: mixed\tbinding=0, set=0", "offset=64, size=16"]);
}

#[test]
fn test_variable_without_bindings_ends_its_line() {
    let variable = VariableLayout {
        name: "scene".to_string(),
        bindings: Vec::new(),
        layout: TypeLayout::Resource { name: "acceleration_structure".to_string(), kind: ResourceKind::AccelerationStructure },
    };

    let mut printer = ReflectionPrinter::new();
    printer.variable(&variable);
    assert_eq!(printer.as_str(), "name: scene\ntype: acceleration_structure\n");
    assert_eq!(describe_variable(&variable), vec!["name: scene", "type: acceleration_structure"]);
}

#[test]
fn test_reflection_prints_parameter_count_first() {
    let reflection = ShaderReflection {
        entry_point: EntryPointReflection {
            name: "main".to_string(),
            stage: ShaderStage::Compute,
            workgroup_size: [1, 1, 1],
        },
        parameters: vec![VariableLayout {
            name: "albedo".to_string(),
            bindings: slot(1, 0),
            layout: TypeLayout::Resource { name: "texture_2d<f32>".to_string(), kind: ResourceKind::SampledImage },
        }],
        descriptors: Vec::new(),
    };

    let lines = describe_reflection(&reflection);
    assert_eq!(lines, vec!["parameter count: 1", "name: albedo\tbinding=1, set=0", "type: texture_2d<f32>"]);
}

#[test]
fn test_printer_does_not_mutate_layout() {
    let layout = light_struct();
    let before = layout.clone();
    let mut printer = ReflectionPrinter::new();
    printer.type_layout(&layout).type_layout(&layout);
    assert_eq!(layout, before);
    assert_eq!(printer.lines().len(), 10);
}

// ============================================================================
// LOGGING
// ============================================================================

/// Keeps entries from the test's own thread only
struct Capture(Arc<Mutex<Vec<LogEntry>>>, ThreadId);

impl Logger for Capture {
    fn log(&self, entry: &LogEntry) {
        if thread::current().id() == self.1 {
            self.0.lock().unwrap().push(entry.clone());
        }
    }
}

#[test]
#[serial]
fn test_print_variable_logs_each_line_at_info() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::reset_logger();
    Engine::set_logger(Capture(entries.clone(), thread::current().id()));

    print_variable(&VariableLayout {
        name: "lights".to_string(),
        bindings: slot(5, 0),
        layout: TypeLayout::Resource { name: "sampler".to_string(), kind: ResourceKind::Sampler { comparison: false } },
    });

    let entries = entries.lock().unwrap().clone();
    Engine::reset_logger();

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.severity == LogSeverity::Info && e.source == "umbra::Reflection"));
    assert_eq!(entries[0].message, "name: lights\tbinding=5, set=0");
}
