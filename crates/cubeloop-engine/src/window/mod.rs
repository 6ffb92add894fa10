//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer, and
//! drives a [`RenderLoop`](crate::render_loop::RenderLoop) off window redraws.

mod redraw;
mod runtime;

pub use redraw::RedrawScheduler;
pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
