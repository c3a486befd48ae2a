//! Unit tests for shader_compiler.rs
//!
//! Sources are written to temporary directories and compiled with naga.

use crate::error::Error;
use crate::shader::{OptimizationLevel, ShaderCompiler, ShaderManagerConfig, ShaderStage, SourceLanguage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SPIRV_MAGIC: u32 = 0x0723_0203;

const TWO_KERNELS: &str = r#"
struct Params {
    scale: f32,
    bias: f32,
}

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var<storage, read_write> values: array<f32>;

@compute @workgroup_size(64)
fn main_a(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x < arrayLength(&values)) {
        values[id.x] = values[id.x] * params.scale + params.bias;
    }
}

@compute @workgroup_size(64)
fn main_b(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x < arrayLength(&values)) {
        values[id.x] = 0.0;
    }
}
"#;

fn write(dir: &Path, name: &str, source: &str) {
    fs::write(dir.join(name), source).unwrap();
}

fn compiler_in(dir: &TempDir) -> ShaderCompiler {
    ShaderCompiler::new(ShaderManagerConfig::with_root(dir.path()))
}

fn diagnostics_of(err: Error) -> String {
    match err {
        Error::ShaderCompilation { diagnostics, .. } => diagnostics,
        other => panic!("unexpected error: {:?}", other),
    }
}

// ============================================================================
// SUCCESSFUL COMPILES
// ============================================================================

#[test]
fn test_compile_wgsl_compute_produces_spirv() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kernels.wgsl", TWO_KERNELS);
    let mut compiler = compiler_in(&dir);

    let desc = compiler.compile("kernels.wgsl", "main_a", ShaderStage::Compute).unwrap();

    assert!(!desc.code.is_empty());
    assert_eq!(desc.code_size(), desc.code.len());
    assert_eq!(desc.code.len() % 4, 0);
    assert_eq!(desc.code_words()[0], SPIRV_MAGIC);
    assert_eq!(desc.file_name, "kernels.wgsl");
    assert_eq!(desc.entry_point_name, "main_a");
    assert_eq!(desc.shader_type, naga::ShaderStage::Compute);
}

#[test]
fn test_spirv_version_follows_profile() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kernels.wgsl", TWO_KERNELS);
    let mut compiler = compiler_in(&dir);

    let desc = compiler.compile("kernels.wgsl", "main_a", ShaderStage::Compute).unwrap();

    // Version word: 0x00MMmm00
    assert_eq!(desc.code_words()[1], 0x0001_0300);
}

#[test]
fn test_compile_attaches_reflection_and_request() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kernels.wgsl", TWO_KERNELS);
    let mut compiler = compiler_in(&dir);

    let desc = compiler.compile("kernels.wgsl", "main_b", ShaderStage::Compute).unwrap();

    assert_eq!(desc.reflection.entry_point.name, "main_b");
    assert_eq!(desc.reflection.entry_point.workgroup_size, [64, 1, 1]);
    // main_b never reads `params`
    assert_eq!(desc.reflection.descriptor_bindings().len(), 1);
    assert!(desc.reflection.parameter("params").is_none());
    assert!(desc.reflection.descriptor("values").is_some());
    assert_eq!(desc.request.path(), dir.path().join("kernels.wgsl"));
    assert_eq!(desc.request.language(), SourceLanguage::Wgsl);
    assert_eq!(desc.request.module().entry_points.len(), 2);
}

#[test]
fn test_compilation_is_deterministic() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kernels.wgsl", TWO_KERNELS);
    let mut compiler = compiler_in(&dir);

    let first = compiler.compile("kernels.wgsl", "main_a", ShaderStage::Compute).unwrap();
    let second = compiler.compile("kernels.wgsl", "main_a", ShaderStage::Compute).unwrap();

    assert_eq!(first.code, second.code);
}

#[test]
fn test_maximal_optimization_strips_debug_names() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kernels.wgsl", TWO_KERNELS);

    let mut stripped = compiler_in(&dir);
    let mut named = ShaderCompiler::new(ShaderManagerConfig {
        optimization: OptimizationLevel::None,
        ..ShaderManagerConfig::with_root(dir.path())
    });

    let stripped = stripped.compile("kernels.wgsl", "main_a", ShaderStage::Compute).unwrap();
    let named = named.compile("kernels.wgsl", "main_a", ShaderStage::Compute).unwrap();

    let contains = |code: &[u8], needle: &[u8]| code.windows(needle.len()).any(|w| w == needle);
    assert!(!contains(&stripped.code, b"params"));
    assert!(contains(&named.code, b"params"));
    assert!(named.code.len() > stripped.code.len());
}

#[test]
fn test_compile_glsl_compute_with_defines() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "scale.comp",
        r#"#version 450
layout(local_size_x = 8, local_size_y = 8, local_size_z = 1) in;
layout(set = 0, binding = 0) buffer Data {
    float values[];
} data;

void main() {
    uint i = gl_GlobalInvocationID.x;
    data.values[i] = data.values[i] * SCALE;
}
"#,
    );
    let mut compiler = ShaderCompiler::new(ShaderManagerConfig {
        defines: vec![("SCALE".to_string(), "2.0".to_string())],
        ..ShaderManagerConfig::with_root(dir.path())
    });

    let desc = compiler.compile("scale.comp", "main", ShaderStage::Compute).unwrap();

    assert_eq!(desc.code_words()[0], SPIRV_MAGIC);
    assert_eq!(desc.request.language(), SourceLanguage::Glsl);
    assert_eq!(desc.reflection.entry_point.workgroup_size, [8, 8, 1]);
    assert_eq!(desc.reflection.bindings_for_set(0).len(), 1);
}

#[test]
fn test_absolute_path_ignores_root() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kernels.wgsl", TWO_KERNELS);
    let absolute = dir.path().join("kernels.wgsl");
    let mut compiler = ShaderCompiler::new(ShaderManagerConfig::with_root("/does/not/exist"));

    let desc = compiler
        .compile(absolute.to_str().unwrap(), "main_a", ShaderStage::Compute)
        .unwrap();
    assert_eq!(desc.request.path(), absolute);
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let mut compiler = compiler_in(&dir);

    let err = compiler.compile("missing.wgsl", "main", ShaderStage::Compute).unwrap_err();
    assert!(diagnostics_of(err).contains("cannot read"));
}

#[test]
fn test_unsupported_extension_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shader.hlsl", "float4 main() : SV_Target { return 0; }");
    let mut compiler = compiler_in(&dir);

    let err = compiler.compile("shader.hlsl", "main", ShaderStage::Pixel).unwrap_err();
    assert!(diagnostics_of(err).contains("unsupported shader source"));
}

#[test]
fn test_syntax_error_fails_with_diagnostics() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "broken.wgsl", "@compute @workgroup_size(1)\nfn main() {\n    let x = ;\n}\n");
    let mut compiler = compiler_in(&dir);

    let err = compiler.compile("broken.wgsl", "main", ShaderStage::Compute).unwrap_err();
    match err {
        Error::ShaderCompilation { file, entry_point, diagnostics } => {
            assert_eq!(file, "broken.wgsl");
            assert_eq!(entry_point, "main");
            assert!(diagnostics.contains("broken.wgsl"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_validation_error_fails() {
    let dir = TempDir::new().unwrap();
    // Writing through a read-only storage binding
    write(
        dir.path(),
        "readonly.wgsl",
        r#"
@group(0) @binding(0) var<storage, read> values: array<f32>;

@compute @workgroup_size(1)
fn main() {
    values[0] = 1.0;
}
"#,
    );
    let mut compiler = compiler_in(&dir);

    assert!(compiler.compile("readonly.wgsl", "main", ShaderStage::Compute).is_err());
}

#[test]
fn test_unknown_entry_point_lists_available() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kernels.wgsl", TWO_KERNELS);
    let mut compiler = compiler_in(&dir);

    let err = compiler.compile("kernels.wgsl", "main_c", ShaderStage::Compute).unwrap_err();
    let diagnostics = diagnostics_of(err);
    assert!(diagnostics.contains("'main_c'"));
    assert!(diagnostics.contains("main_a (compute)"));
    assert!(diagnostics.contains("main_b (compute)"));
}

#[test]
fn test_stage_mismatch_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kernels.wgsl", TWO_KERNELS);
    let mut compiler = compiler_in(&dir);

    let err = compiler.compile("kernels.wgsl", "main_a", ShaderStage::Vertex).unwrap_err();
    assert!(diagnostics_of(err).starts_with("no vertex entry point named 'main_a'"));
}
