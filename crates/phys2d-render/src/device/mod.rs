//! Graphics device abstraction.
//!
//! [`GraphicsDevice`] is the narrow surface the scene renderer draws through:
//! geometry and program lifetimes, named uniforms, clears and draws. Two
//! implementations are provided:
//! - [`WgpuDevice`] records draws and encodes them into a wgpu render pass
//! - [`HeadlessDevice`] records calls without a GPU (tests, offscreen hosts)
//!
//! The surface context [`Gpu`] owns the wgpu instance, adapter, device, queue
//! and swapchain for a window.

mod gpu;
mod headless;
mod shader;
mod target;
mod wgpu_device;

use glam::{Mat4, Vec4};

use crate::coords::ColorRgba;
use crate::geometry::GeometryData;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
pub use headless::{DrawRecord, HeadlessDevice};
pub use shader::{
    validate_program, ProgramLayout, ShaderError, ShaderStage, UniformKind, UniformSlot,
    MAX_UNIFORM_BLOCK_SIZE,
};
pub use target::RenderTarget;
pub use wgpu_device::WgpuDevice;

slotmap::new_key_type! {
    /// Device-owned vertex/index buffers for one geometry.
    pub struct GeometryHandle;
    /// Compiled and linked shader program.
    pub struct ProgramHandle;
}

/// Value for a named uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    #[inline]
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Writes the value's std140 bytes at the start of `out`.
    pub(crate) fn write_to(&self, out: &mut [u8]) {
        match self {
            UniformValue::Vec4(v) => {
                out[..16].copy_from_slice(bytemuck::cast_slice(&v.to_array()));
            }
            UniformValue::Mat4(m) => {
                out[..64].copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()));
            }
        }
    }
}

impl From<ColorRgba> for UniformValue {
    fn from(c: ColorRgba) -> Self {
        UniformValue::Vec4(c.into())
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m)
    }
}

/// Live resource counts.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub geometries: usize,
    pub programs: usize,
}

/// Draw surface used by the scene renderer.
pub trait GraphicsDevice {
    fn create_geometry(&mut self, data: &GeometryData) -> GeometryHandle;

    /// Releases the geometry; unknown handles are ignored.
    fn destroy_geometry(&mut self, geometry: GeometryHandle);

    /// Compiles and links a WGSL program exporting `vs_main` and `fs_main`.
    fn create_program(&mut self, vertex: &str, fragment: &str)
        -> Result<ProgramHandle, ShaderError>;

    fn destroy_program(&mut self, program: ProgramHandle);

    /// Selects the program used by subsequent draws.
    fn use_program(&mut self, program: ProgramHandle);

    /// Sets a member of the program's uniform block.
    ///
    /// Names the program does not declare are ignored.
    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue);

    /// Draws the geometry with the program in use and its current uniforms.
    fn draw(&mut self, geometry: GeometryHandle);

    /// Clears the target to the clear color before the next draws.
    fn clear(&mut self);

    fn set_clear_color(&mut self, color: ColorRgba);

    fn stats(&self) -> DeviceStats;
}

impl<D: GraphicsDevice + ?Sized> GraphicsDevice for &mut D {
    fn create_geometry(&mut self, data: &GeometryData) -> GeometryHandle {
        (**self).create_geometry(data)
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) {
        (**self).destroy_geometry(geometry)
    }

    fn create_program(
        &mut self,
        vertex: &str,
        fragment: &str,
    ) -> Result<ProgramHandle, ShaderError> {
        (**self).create_program(vertex, fragment)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        (**self).destroy_program(program)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        (**self).use_program(program)
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        (**self).set_uniform(program, name, value)
    }

    fn draw(&mut self, geometry: GeometryHandle) {
        (**self).draw(geometry)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn set_clear_color(&mut self, color: ColorRgba) {
        (**self).set_clear_color(color)
    }

    fn stats(&self) -> DeviceStats {
        (**self).stats()
    }
}

impl<D: GraphicsDevice + ?Sized> GraphicsDevice for Box<D> {
    fn create_geometry(&mut self, data: &GeometryData) -> GeometryHandle {
        (**self).create_geometry(data)
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) {
        (**self).destroy_geometry(geometry)
    }

    fn create_program(
        &mut self,
        vertex: &str,
        fragment: &str,
    ) -> Result<ProgramHandle, ShaderError> {
        (**self).create_program(vertex, fragment)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        (**self).destroy_program(program)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        (**self).use_program(program)
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        (**self).set_uniform(program, name, value)
    }

    fn draw(&mut self, geometry: GeometryHandle) {
        (**self).draw(geometry)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn set_clear_color(&mut self, color: ColorRgba) {
        (**self).set_clear_color(color)
    }

    fn stats(&self) -> DeviceStats {
        (**self).stats()
    }
}
