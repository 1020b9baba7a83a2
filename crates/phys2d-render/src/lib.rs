//! Debug renderer for 2-D rigid-body simulations.
//!
//! This crate keeps GPU geometry in step with an event-emitting simulation
//! (see [`world::World`]), draws bodies, joints, contacts and a reference grid,
//! and provides pan/zoom and pointer-drag controls over the view.

pub mod coords;
pub mod device;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod scene;
pub mod style;
pub mod view;
pub mod world;
