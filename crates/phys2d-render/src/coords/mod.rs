//! Small value types shared by the device, scene and view layers.
//!
//! World space is y-up with arbitrary units. Surface space is logical pixels
//! with the origin at the top-left and +Y down, matching pointer input.

mod color;
mod surface;

pub use color::ColorRgba;
pub use surface::SurfaceSize;
