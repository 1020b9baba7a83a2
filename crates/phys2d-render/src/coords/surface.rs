/// Drawable surface size in logical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Width over height, with both sides clamped to at least one pixel.
    #[inline]
    pub fn aspect(self) -> f32 {
        let w = if self.width.is_finite() { self.width.max(1.0) } else { 1.0 };
        let h = if self.height.is_finite() { self.height.max(1.0) } else { 1.0 };
        w / h
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_wide_surface() {
        assert_eq!(SurfaceSize::new(800.0, 400.0).aspect(), 2.0);
    }

    #[test]
    fn degenerate_sizes_clamp_to_one_pixel() {
        assert_eq!(SurfaceSize::new(0.0, 0.0).aspect(), 1.0);
        assert_eq!(SurfaceSize::new(10.0, f32::NAN).aspect(), 10.0);
        assert!(!SurfaceSize::new(0.0, 10.0).is_valid());
    }
}
