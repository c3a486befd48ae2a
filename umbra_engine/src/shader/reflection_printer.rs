/// Human-readable dump of shader reflection
///
/// Output is produced as a list of lines so it can be routed through the
/// engine logger or compared in tests. Line formats:
///
/// ```text
/// parameter count: 2
/// name: ubo	binding=0, set=0
/// uniform<UniformBufferObject>
/// const buffer size: 160
/// struct name: UniformBufferObject
/// field count: 7
/// field offset: 0	name: viewToProj	offset=0, size=64
/// ...
/// name: gbWPos	binding=1, set=0
/// type: texture_2d<f32>
/// ```

use std::fmt::Write;
use crate::shader::{ParameterCategory, ShaderReflection, TypeLayout, VariableLayout};

const LOG_SOURCE: &str = "umbra::Reflection";

/// Read-only walker accumulating reflection text
#[derive(Debug, Default)]
pub struct ReflectionPrinter {
    out: String,
}

impl ReflectionPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter count followed by every top-level parameter
    pub fn reflection(&mut self, reflection: &ShaderReflection) -> &mut Self {
        let _ = writeln!(self.out, "parameter count: {}", reflection.parameters.len());
        for parameter in &reflection.parameters {
            self.variable(parameter);
        }
        self
    }

    /// Name, one location line per category, then the type layout
    ///
    /// A variable without bindings gets a bare `name: ...` line.
    pub fn variable(&mut self, variable: &VariableLayout) -> &mut Self {
        if variable.bindings.is_empty() {
            let _ = writeln!(self.out, "name: {}", variable.name);
            return self.type_layout(&variable.layout);
        }
        let _ = write!(self.out, "name: {}\t", variable.name);
        for binding in &variable.bindings {
            match binding.category {
                ParameterCategory::Uniform => {
                    let _ = writeln!(self.out, "offset={}, size={}", binding.index, binding.size);
                }
                ParameterCategory::DescriptorTableSlot | ParameterCategory::PushConstantBuffer => {
                    let _ = writeln!(self.out, "binding={}, set={}", binding.index, binding.space);
                }
            }
        }
        self.type_layout(&variable.layout)
    }

    /// Kind-specific description of a layout node
    pub fn type_layout(&mut self, layout: &TypeLayout) -> &mut Self {
        match layout {
            TypeLayout::Struct { name, fields, .. } => {
                let _ = writeln!(self.out, "struct name: {}", name);
                let _ = writeln!(self.out, "field count: {}", fields.len());
                for field in fields {
                    let offset = field
                        .binding(ParameterCategory::Uniform)
                        .map(|b| b.index)
                        .unwrap_or(0);
                    let _ = write!(self.out, "field offset: {}\t", offset);
                    self.variable(field);
                }
            }
            TypeLayout::Resource { name, .. } => {
                let _ = writeln!(self.out, "type: {}", name);
            }
            TypeLayout::ParameterBlock { name, uniform_size, element } => {
                let _ = writeln!(self.out, "{}", name);
                let _ = writeln!(self.out, "const buffer size: {}", uniform_size);
                if let Some(element) = element {
                    self.type_layout(element);
                }
            }
            TypeLayout::Array { element_name, element_count, .. } => {
                match element_count {
                    Some(count) => {
                        let _ = writeln!(self.out, "array {}[{}]", element_name, count);
                    }
                    None => {
                        let _ = writeln!(self.out, "array {}[]", element_name);
                    }
                }
            }
            TypeLayout::Value { .. } => {}
        }
        self
    }

    /// Accumulated text split into lines (trailing separators removed)
    pub fn lines(&self) -> Vec<String> {
        self.out
            .split('\n')
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Raw accumulated text
    pub fn as_str(&self) -> &str {
        &self.out
    }
}

// ===== CONVENIENCE =====

/// Lines describing a whole shader
pub fn describe_reflection(reflection: &ShaderReflection) -> Vec<String> {
    ReflectionPrinter::new().reflection(reflection).lines()
}

/// Lines describing one variable
pub fn describe_variable(variable: &VariableLayout) -> Vec<String> {
    ReflectionPrinter::new().variable(variable).lines()
}

/// Lines describing one layout node
pub fn describe_type_layout(layout: &TypeLayout) -> Vec<String> {
    ReflectionPrinter::new().type_layout(layout).lines()
}

/// Log [`describe_reflection`] at INFO, one entry per line
pub fn print_reflection(reflection: &ShaderReflection) {
    log_lines(describe_reflection(reflection));
}

/// Log [`describe_variable`] at INFO, one entry per line
pub fn print_variable(variable: &VariableLayout) {
    log_lines(describe_variable(variable));
}

/// Log [`describe_type_layout`] at INFO, one entry per line
pub fn print_type_layout(layout: &TypeLayout) {
    log_lines(describe_type_layout(layout));
}

fn log_lines(lines: Vec<String>) {
    for line in lines {
        crate::engine_info!(LOG_SOURCE, "{}", line);
    }
}

#[cfg(test)]
#[path = "reflection_printer_tests.rs"]
mod tests;
