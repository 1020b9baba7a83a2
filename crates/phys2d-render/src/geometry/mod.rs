//! CPU-side geometry factory.
//!
//! Every builder is a pure function producing [`GeometryData`]: interleaved
//! `f32` vertices, `u16` indices, a vertex layout and a topology. Geometry is
//! built once per entity in the entity's local frame and uploaded through
//! [`crate::device::GraphicsDevice::create_geometry`]; per-frame placement is
//! done with a world matrix uniform.
//!
//! Outlines are drawn as line lists. Every body outline ends with a small cross
//! marking the body origin.

mod joints;
mod markers;
mod shapes;

use glam::Vec2;

use crate::coords::ColorRgba;

pub use joints::{
    create_distance_joint, create_joint, create_motor_joint, create_mouse_joint,
    create_revolute_joint, create_spring, create_travel_joint, create_weld_joint,
};
pub use markers::{create_contact_point, create_grid, create_pivot};
pub use shapes::{create_circle, create_cross, create_ellipse, create_mesh, create_polygon, create_shape};

// ── constants ─────────────────────────────────────────────────────────────

pub const CIRCLE_SEGMENTS: usize = 64;
pub const CROSS_SIZE: f32 = 0.2;
pub const PIVOT_RADIUS: f32 = 0.1;
pub const SPRING_HOOPS: usize = 12;
pub const SPRING_WEIGHT: f32 = 0.5;
pub const JOINT_RADIUS: f32 = 0.2;
pub const JOINT_TICK: f32 = 0.5;
pub const JOINT_LENGTH: f32 = 3.0;
pub const CONTACT_NORMAL: f32 = 1.0;
pub const GRID_EXPANSION: f32 = 256.0;
pub const GRID_UNIT: f32 = 1.0;

// ── data ──────────────────────────────────────────────────────────────────

/// Interleaved vertex layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// `position: vec2<f32>` at location 0.
    Plain,
    /// `position: vec2<f32>` at location 0, `color: vec4<f32>` at location 1.
    Colored,
}

impl VertexLayout {
    /// Number of `f32` components per vertex.
    #[inline]
    pub const fn components(self) -> usize {
        match self {
            VertexLayout::Plain => 2,
            VertexLayout::Colored => 6,
        }
    }

    /// Vertex stride in bytes.
    #[inline]
    pub const fn stride(self) -> u64 {
        (self.components() * std::mem::size_of::<f32>()) as u64
    }
}

/// Primitive assembly for a geometry's index list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topology {
    Lines,
    Triangles,
}

/// Vertex and index data ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryData {
    pub layout: VertexLayout,
    pub topology: Topology,
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl GeometryData {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.components()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn position(&self, vertex: usize) -> Option<Vec2> {
        let base = vertex * self.layout.components();
        let xy = self.vertices.get(base..base + 2)?;
        Some(Vec2::new(xy[0], xy[1]))
    }

    pub fn color(&self, vertex: usize) -> Option<ColorRgba> {
        if self.layout != VertexLayout::Colored {
            return None;
        }
        let base = vertex * self.layout.components() + 2;
        let c = self.vertices.get(base..base + 4)?;
        Some(ColorRgba::new(c[0], c[1], c[2], c[3]))
    }

    /// Whole vertices, complete primitives, every index in range.
    pub fn is_well_formed(&self) -> bool {
        let per_primitive = match self.topology {
            Topology::Lines => 2,
            Topology::Triangles => 3,
        };
        let vertex_count = self.vertex_count();

        self.vertices.len() % self.layout.components() == 0
            && self.indices.len() % per_primitive == 0
            && self.indices.iter().all(|&i| usize::from(i) < vertex_count)
    }
}

/// Errors raised while building geometry for a single entity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("joint axis {0} has no direction")]
    DegenerateAxis(Vec2),
    #[error("geometry needs {0} vertices, more than 16-bit indices can address")]
    TooManyVertices(usize),
}

// ── builder ───────────────────────────────────────────────────────────────

/// Accumulates line-list geometry, tracking index overflow.
pub(crate) struct LineBuilder {
    layout: VertexLayout,
    vertices: Vec<f32>,
    indices: Vec<u16>,
    overflow: bool,
}

impl LineBuilder {
    pub(crate) fn new(layout: VertexLayout) -> Self {
        Self {
            layout,
            vertices: Vec::new(),
            indices: Vec::new(),
            overflow: false,
        }
    }

    #[inline]
    pub(crate) fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.components()
    }

    /// Appends a position; only valid for [`VertexLayout::Plain`].
    pub(crate) fn plain(&mut self, p: Vec2) -> usize {
        debug_assert_eq!(self.layout, VertexLayout::Plain);
        let index = self.vertex_count();
        self.vertices.extend_from_slice(&[p.x, p.y]);
        index
    }

    /// Appends a colored vertex; only valid for [`VertexLayout::Colored`].
    pub(crate) fn colored(&mut self, p: Vec2, color: ColorRgba) -> usize {
        debug_assert_eq!(self.layout, VertexLayout::Colored);
        let index = self.vertex_count();
        self.vertices
            .extend_from_slice(&[p.x, p.y, color.r, color.g, color.b, color.a]);
        index
    }

    pub(crate) fn segment(&mut self, a: usize, b: usize) {
        match (u16::try_from(a), u16::try_from(b)) {
            (Ok(a), Ok(b)) => self.indices.extend_from_slice(&[a, b]),
            _ => self.overflow = true,
        }
    }

    /// Appends two new vertices joined by a segment.
    pub(crate) fn plain_segment(&mut self, p0: Vec2, p1: Vec2) {
        let a = self.plain(p0);
        let b = self.plain(p1);
        self.segment(a, b);
    }

    pub(crate) fn colored_segment(&mut self, p0: Vec2, p1: Vec2, color: ColorRgba) {
        let a = self.colored(p0, color);
        let b = self.colored(p1, color);
        self.segment(a, b);
    }

    pub(crate) fn finish(self) -> Result<GeometryData, GeometryError> {
        if self.overflow {
            return Err(GeometryError::TooManyVertices(self.vertex_count()));
        }
        Ok(GeometryData {
            layout: self.layout,
            topology: Topology::Lines,
            vertices: self.vertices,
            indices: self.indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_strides_match_components() {
        assert_eq!(VertexLayout::Plain.stride(), 8);
        assert_eq!(VertexLayout::Colored.stride(), 24);
    }

    #[test]
    fn builder_reports_index_overflow() {
        let mut b = LineBuilder::new(VertexLayout::Plain);
        for _ in 0..=usize::from(u16::MAX) {
            b.plain(Vec2::ZERO);
        }
        b.segment(0, usize::from(u16::MAX) + 1);
        assert_eq!(
            b.finish(),
            Err(GeometryError::TooManyVertices(usize::from(u16::MAX) + 1))
        );
    }

    #[test]
    fn out_of_range_index_is_not_well_formed() {
        let data = GeometryData {
            layout: VertexLayout::Plain,
            topology: Topology::Lines,
            vertices: vec![0.0, 0.0, 1.0, 1.0],
            indices: vec![0, 2],
        };
        assert!(!data.is_well_formed());
    }

    #[test]
    fn colored_accessors_read_interleaved_data() {
        let mut b = LineBuilder::new(VertexLayout::Colored);
        b.colored_segment(Vec2::ZERO, Vec2::new(1.0, 2.0), ColorRgba::white());
        let data = b.finish().unwrap();
        assert_eq!(data.position(1), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(data.color(1), Some(ColorRgba::white()));
        assert_eq!(data.position(2), None);
    }
}
