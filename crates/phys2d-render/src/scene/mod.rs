//! Scene synchronization and drawing.
//!
//! [`WorldRenderer`] keeps one device geometry per body and joint of a
//! [`crate::world::World`], driven by the world's events, and draws the scene
//! each frame in a fixed order:
//! - reference axes
//! - bodies
//! - joints (filtered per kind by [`RenderMask`])
//! - contacts
//!
//! Geometry is built once in the entity's local frame; placement happens per
//! draw through the `world_mat` uniform.

mod mask;
mod renderer;
mod scratch;
mod shaders;
mod tables;

use glam::{Mat3, Mat4, Vec4};

pub use mask::RenderMask;
pub use renderer::WorldRenderer;
pub use scratch::{place_joint, Scratch};
pub use shaders::{ShaderSet, ShaderSource, ALBEDO, PROJ_MAT, WORLD_MAT};
pub use tables::{ContactIndex, GeometryTable};

/// Embeds a 2-D affine transform into a 4x4 clip-space matrix.
pub fn to_mat4(m: Mat3) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(m.x_axis.x, m.x_axis.y, 0.0, 0.0),
        Vec4::new(m.y_axis.x, m.y_axis.y, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(m.z_axis.x, m.z_axis.y, 0.0, 1.0),
    )
}
