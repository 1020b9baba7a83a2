use glam::{Mat3, Vec2, Vec3};

use crate::coords::SurfaceSize;

/// Smallest world extent a projection accepts.
pub const MIN_EXTENT: f32 = 1.0e-3;
/// Largest world extent a projection accepts.
pub const MAX_EXTENT: f32 = 1.0e6;

/// Orthographic world-to-clip transform.
///
/// The visible region is `width` world units across, centred on `origin`,
/// with the height following the surface aspect ratio. The matrix and its
/// inverse are recomputed whenever one of the inputs changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    surface: SurfaceSize,
    width: f32,
    origin: Vec2,

    matrix: Mat3,
    inverse: Mat3,
}

impl Projection {
    pub fn new(surface: SurfaceSize, width: f32, origin: Vec2) -> Self {
        let mut projection = Self {
            surface,
            width: clamp_extent(width),
            origin,
            matrix: Mat3::IDENTITY,
            inverse: Mat3::IDENTITY,
        };
        projection.update();
        projection
    }

    #[inline]
    pub fn matrix(&self) -> Mat3 {
        self.matrix
    }

    #[inline]
    pub fn inverse(&self) -> Mat3 {
        self.inverse
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        clamp_extent(self.width / self.surface.aspect())
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = clamp_extent(width);
        self.update();
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        if origin.is_finite() {
            self.origin = origin;
        }
        self.update();
    }

    pub fn resize(&mut self, surface: SurfaceSize) {
        self.surface = surface;
        self.update();
    }

    /// Recomputes the matrix and its inverse from width, origin and surface.
    pub fn update(&mut self) {
        let sx = 2.0 / self.width;
        let sy = 2.0 / self.height();
        self.matrix = Mat3::from_cols(
            Vec3::new(sx, 0.0, 0.0),
            Vec3::new(0.0, sy, 0.0),
            Vec3::new(-self.origin.x * sx, -self.origin.y * sy, 1.0),
        );
        self.inverse = self.matrix.inverse();
    }

    /// World point to surface position (logical pixels, Y down).
    pub fn project(&self, world: Vec2) -> Vec2 {
        let ndc = self.matrix.transform_point2(world);
        let (w, h) = self.surface_extent();
        Vec2::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h)
    }

    /// Surface position (logical pixels, Y down) to world point.
    pub fn unproject(&self, screen: Vec2) -> Vec2 {
        self.inverse.transform_point2(self.to_ndc(screen))
    }

    /// Moves the origin so `world` appears at surface position `screen`.
    pub fn anchor(&mut self, world: Vec2, screen: Vec2) {
        let ndc = self.to_ndc(screen);
        let half = Vec2::new(self.width, self.height()) * 0.5;
        self.set_origin(world - ndc * half);
    }

    fn to_ndc(&self, screen: Vec2) -> Vec2 {
        let (w, h) = self.surface_extent();
        Vec2::new(2.0 * screen.x / w - 1.0, 1.0 - 2.0 * screen.y / h)
    }

    fn surface_extent(&self) -> (f32, f32) {
        let fix = |v: f32| if v.is_finite() && v >= 1.0 { v } else { 1.0 };
        (fix(self.surface.width), fix(self.surface.height))
    }
}

fn clamp_extent(v: f32) -> f32 {
    if v.is_nan() {
        return MIN_EXTENT;
    }
    v.clamp(MIN_EXTENT, MAX_EXTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Projection {
        Projection::new(SurfaceSize::new(800.0, 400.0), 30.0, Vec2::new(1.0, -2.0))
    }

    #[test]
    fn matrix_maps_the_visible_region_to_clip_space() {
        let p = projection();
        assert_eq!(p.height(), 15.0);

        let right_top = Vec2::new(1.0 + 15.0, -2.0 + 7.5);
        assert!((p.matrix().transform_point2(right_top) - Vec2::ONE).length() < 1e-5);
        assert!(p.matrix().transform_point2(p.origin()).length() < 1e-6);
    }

    #[test]
    fn surface_centre_is_the_origin() {
        let p = projection();
        let centre = p.unproject(Vec2::new(400.0, 200.0));
        assert!((centre - p.origin()).length() < 1e-5);
        // Y grows downwards on the surface.
        assert!(p.unproject(Vec2::new(400.0, 0.0)).y > p.origin().y);
    }

    #[test]
    fn anchor_places_a_world_point_under_the_pointer() {
        let mut p = projection();
        let world = Vec2::new(5.0, 5.0);
        let screen = Vec2::new(120.0, 310.0);

        p.anchor(world, screen);
        assert!((p.unproject(screen) - world).length() < 1e-4);
    }

    #[test]
    fn extents_stay_invertible() {
        let mut p = projection();
        p.set_width(0.0);
        assert_eq!(p.width(), MIN_EXTENT);
        p.set_width(f32::NAN);
        assert_eq!(p.width(), MIN_EXTENT);
        p.resize(SurfaceSize::new(0.0, 0.0));
        assert!(p.inverse().is_finite());
    }
}
