use slotmap::SlotMap;

use crate::coords::ColorRgba;
use crate::geometry::GeometryData;

use super::shader::{validate_program, ProgramLayout, ShaderError};
use super::{DeviceStats, GeometryHandle, GraphicsDevice, ProgramHandle, UniformValue};

/// One recorded draw with the uniforms that were current at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: ProgramHandle,
    pub geometry: GeometryHandle,
    pub uniforms: Vec<(String, UniformValue)>,
}

impl DrawRecord {
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

#[derive(Debug)]
struct HeadlessProgram {
    layout: ProgramLayout,
    values: Vec<(String, UniformValue)>,
}

/// [`GraphicsDevice`] that validates shaders and records calls without a GPU.
///
/// Uniform handling follows the reflected program layout exactly like
/// [`super::WgpuDevice`], so scene-level behavior can be checked in tests.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    geometries: SlotMap<GeometryHandle, GeometryData>,
    programs: SlotMap<ProgramHandle, HeadlessProgram>,
    current: Option<ProgramHandle>,

    clear_color: ColorRgba,
    clears: usize,
    draws: Vec<DrawRecord>,
    uniform_writes: Vec<(ProgramHandle, String)>,
    geometries_created: usize,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Accepted `set_uniform` calls, in order.
    pub fn uniform_writes(&self) -> &[(ProgramHandle, String)] {
        &self.uniform_writes
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn clear_color(&self) -> ColorRgba {
        self.clear_color
    }

    /// Total `create_geometry` calls since construction.
    pub fn geometries_created(&self) -> usize {
        self.geometries_created
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&GeometryData> {
        self.geometries.get(handle)
    }

    pub fn program_layout(&self, handle: ProgramHandle) -> Option<&ProgramLayout> {
        self.programs.get(handle).map(|p| &p.layout)
    }

    /// Forgets recorded draws, clears and uniform writes.
    pub fn begin_frame(&mut self) {
        self.draws.clear();
        self.uniform_writes.clear();
        self.clears = 0;
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_geometry(&mut self, data: &GeometryData) -> GeometryHandle {
        self.geometries_created += 1;
        self.geometries.insert(data.clone())
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) {
        self.geometries.remove(geometry);
    }

    fn create_program(
        &mut self,
        vertex: &str,
        fragment: &str,
    ) -> Result<ProgramHandle, ShaderError> {
        let layout = validate_program(vertex, fragment)?;
        Ok(self.programs.insert(HeadlessProgram {
            layout,
            values: Vec::new(),
        }))
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(program);
        if self.current == Some(program) {
            self.current = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current = self.programs.contains_key(program).then_some(program);
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        let Some(p) = self.programs.get_mut(program) else { return };
        let Some(slot) = p.layout.slot(name) else { return };
        if slot.kind != value.kind() {
            log::debug!("uniform `{name}` expects {:?}, got {:?}", slot.kind, value.kind());
            return;
        }

        match p.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => p.values.push((name.to_owned(), value)),
        }
        self.uniform_writes.push((program, name.to_owned()));
    }

    fn draw(&mut self, geometry: GeometryHandle) {
        let Some(program) = self.current else { return };
        let Some(p) = self.programs.get(program) else { return };
        if !self.geometries.contains_key(geometry) {
            return;
        }

        self.draws.push(DrawRecord {
            program,
            geometry,
            uniforms: p.values.clone(),
        });
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn set_clear_color(&mut self, color: ColorRgba) {
        self.clear_color = color;
    }

    fn stats(&self) -> DeviceStats {
        DeviceStats {
            geometries: self.geometries.len(),
            programs: self.programs.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec4};

    use super::*;
    use crate::geometry::create_cross;

    const VS: &str = r#"
struct U { world_mat: mat4x4<f32>, albedo: vec4<f32> };
@group(0) @binding(0) var<uniform> u: U;
@vertex
fn vs_main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> {
    return u.world_mat * vec4<f32>(p, 0.0, 1.0);
}
"#;

    const FS: &str = r#"
struct U { world_mat: mat4x4<f32>, albedo: vec4<f32> };
@group(0) @binding(0) var<uniform> u: U;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.albedo;
}
"#;

    #[test]
    fn unknown_uniform_names_are_ignored() {
        let mut device = HeadlessDevice::new();
        let program = device.create_program(VS, FS).unwrap();
        let geometry = device.create_geometry(&create_cross());

        device.use_program(program);
        device.set_uniform(program, "not_declared", UniformValue::Vec4(Vec4::ONE));
        device.set_uniform(program, "albedo", UniformValue::Mat4(Mat4::IDENTITY));
        device.set_uniform(program, "albedo", UniformValue::Vec4(Vec4::X));
        device.draw(geometry);

        let draw = &device.draws()[0];
        assert_eq!(draw.uniforms.len(), 1);
        assert_eq!(draw.uniform("albedo"), Some(UniformValue::Vec4(Vec4::X)));
        assert_eq!(device.uniform_writes().len(), 1);
    }

    #[test]
    fn draws_snapshot_current_uniforms() {
        let mut device = HeadlessDevice::new();
        let program = device.create_program(VS, FS).unwrap();
        let geometry = device.create_geometry(&create_cross());
        device.use_program(program);

        device.set_uniform(program, "albedo", UniformValue::Vec4(Vec4::X));
        device.draw(geometry);
        device.set_uniform(program, "albedo", UniformValue::Vec4(Vec4::Y));
        device.draw(geometry);

        let albedos: Vec<_> = device.draws().iter().map(|d| d.uniform("albedo")).collect();
        assert_eq!(
            albedos,
            vec![Some(UniformValue::Vec4(Vec4::X)), Some(UniformValue::Vec4(Vec4::Y))]
        );
    }

    #[test]
    fn destroyed_resources_leave_stats_and_draws() {
        let mut device = HeadlessDevice::new();
        let program = device.create_program(VS, FS).unwrap();
        let geometry = device.create_geometry(&create_cross());
        assert_eq!(device.stats(), DeviceStats { geometries: 1, programs: 1 });

        device.destroy_geometry(geometry);
        device.destroy_geometry(geometry);
        device.use_program(program);
        device.draw(geometry);
        assert!(device.draws().is_empty());

        device.destroy_program(program);
        assert_eq!(device.stats(), DeviceStats::default());
    }

    #[test]
    fn invalid_program_creates_nothing() {
        let mut device = HeadlessDevice::new();
        assert!(device.create_program("not wgsl", FS).is_err());
        assert_eq!(device.stats().programs, 0);
    }
}
