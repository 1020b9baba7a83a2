//! Translation from platform window events.

pub mod winit;
