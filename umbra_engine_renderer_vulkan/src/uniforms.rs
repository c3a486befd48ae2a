/// Per-frame uniform data of the shadow pass

use bytemuck::{Pod, Zeroable};
use umbra_engine::glam::{Mat4, Vec3};

/// Camera state consumed once per frame.
///
/// A passive data container: the caller computes the matrices and keeps
/// them up to date, the pass only copies them into its uniform buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCamera {
    world_to_view: Mat4,
    view_to_proj: Mat4,
    position: Vec3,
}

impl ShadowCamera {
    pub fn new(world_to_view: Mat4, view_to_proj: Mat4, position: Vec3) -> Self {
        Self {
            world_to_view,
            view_to_proj,
            position,
        }
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform)
    pub fn world_to_view(&self) -> &Mat4 {
        &self.world_to_view
    }

    /// Projection matrix
    pub fn view_to_proj(&self) -> &Mat4 {
        &self.view_to_proj
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    // ===== SETTERS =====

    pub fn set_world_to_view(&mut self, matrix: Mat4) {
        self.world_to_view = matrix;
    }

    pub fn set_view_to_proj(&mut self, matrix: Mat4) {
        self.view_to_proj = matrix;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

/// Uniform block of `rtshadows.wgsl` (binding `ubo`), std140 compatible
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UniformBufferObject {
    pub view_to_proj: Mat4,
    pub world_to_view: Mat4,
    pub camera_pos: [f32; 3],
    pub frame_number: u32,
    /// Output width and height in pixels
    pub dimension: [i32; 2],
    pub pad0: f32,
    pub pad1: f32,
}

impl UniformBufferObject {
    /// Size of the block as the kernel declares it
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(frame_number: u32, camera: &ShadowCamera, width: u32, height: u32) -> Self {
        Self {
            view_to_proj: *camera.view_to_proj(),
            world_to_view: *camera.world_to_view(),
            camera_pos: camera.position().to_array(),
            frame_number,
            dimension: [clamp_dimension(width), clamp_dimension(height)],
            pad0: 0.0,
            pad1: 0.0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

fn clamp_dimension(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
#[path = "uniforms_tests.rs"]
mod tests;
