use umbra_engine::glam::{Mat4, Vec3};
use super::*;

fn test_camera() -> ShadowCamera {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);
    ShadowCamera::new(view, proj, Vec3::new(0.0, 2.0, 5.0))
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_ubo_size_matches_kernel_block() {
    assert_eq!(UniformBufferObject::SIZE, 160);
    assert_eq!(std::mem::align_of::<UniformBufferObject>() % 4, 0);
}

#[test]
fn test_ubo_field_offsets() {
    assert_eq!(std::mem::offset_of!(UniformBufferObject, view_to_proj), 0);
    assert_eq!(std::mem::offset_of!(UniformBufferObject, world_to_view), 64);
    assert_eq!(std::mem::offset_of!(UniformBufferObject, camera_pos), 128);
    assert_eq!(std::mem::offset_of!(UniformBufferObject, frame_number), 140);
    assert_eq!(std::mem::offset_of!(UniformBufferObject, dimension), 144);
    assert_eq!(std::mem::offset_of!(UniformBufferObject, pad1), 156);
}

// ============================================================================
// Contents
// ============================================================================

#[test]
fn test_ubo_new_copies_camera() {
    let camera = test_camera();
    let ubo = UniformBufferObject::new(42, &camera, 1920, 1080);

    assert_eq!(ubo.view_to_proj, *camera.view_to_proj());
    assert_eq!(ubo.world_to_view, *camera.world_to_view());
    assert_eq!(ubo.camera_pos, [0.0, 2.0, 5.0]);
    assert_eq!(ubo.frame_number, 42);
    assert_eq!(ubo.dimension, [1920, 1080]);
    assert_eq!(ubo.pad0, 0.0);
    assert_eq!(ubo.pad1, 0.0);
}

#[test]
fn test_ubo_bytes_layout() {
    let ubo = UniformBufferObject::new(7, &test_camera(), 640, 480);
    let bytes = ubo.as_bytes();

    assert_eq!(bytes.len(), 160);
    assert_eq!(u32::from_le_bytes(bytes[140..144].try_into().unwrap()), 7);
    assert_eq!(i32::from_le_bytes(bytes[144..148].try_into().unwrap()), 640);
    assert_eq!(i32::from_le_bytes(bytes[148..152].try_into().unwrap()), 480);
}

#[test]
fn test_ubo_dimension_saturates() {
    let ubo = UniformBufferObject::new(0, &test_camera(), u32::MAX, 1);
    assert_eq!(ubo.dimension, [i32::MAX, 1]);
}

#[test]
fn test_camera_setters() {
    let mut camera = test_camera();
    camera.set_position(Vec3::new(1.0, 2.0, 3.0));
    camera.set_world_to_view(Mat4::IDENTITY);
    camera.set_view_to_proj(Mat4::IDENTITY);

    assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(*camera.world_to_view(), Mat4::IDENTITY);
    assert_eq!(*camera.view_to_proj(), Mat4::IDENTITY);
}
