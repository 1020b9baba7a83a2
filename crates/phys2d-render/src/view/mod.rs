//! View state and interactive controls.
//!
//! A [`Viewport`] owns the [`Projection`] used by the renderer and routes
//! platform-agnostic input to its controls:
//! - [`CameraControl`] pans and zooms
//! - [`PickingControl`] drags bodies through the world's pointer constraint

mod camera;
pub mod picking;
mod projection;
mod viewport;

pub use camera::{CameraControl, CameraOptions, CameraState};
pub use picking::{PickingControl, PickingOptions};
pub use projection::{Projection, MAX_EXTENT, MIN_EXTENT};
pub use viewport::{Viewport, DEFAULT_WIDTH};
