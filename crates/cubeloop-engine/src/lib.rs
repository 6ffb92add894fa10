//! Cubeloop engine crate.
//!
//! A capability-gated, self-rescheduling render loop (`render_loop`) and the
//! platform + GPU runtime pieces that host it: a winit window whose redraw
//! requests schedule frames, a wgpu device layer and a lit-mesh renderer.

pub mod render_loop;

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub mod coords;
pub mod logging;
pub mod render;
pub mod scene;
