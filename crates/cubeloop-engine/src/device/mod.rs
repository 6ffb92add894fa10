//! GPU device + surface management.
//!
//! This module is responsible for:
//! - probing whether a wgpu backend can drive the window at all
//! - creating the wgpu Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering

mod adapter;
mod context;
mod error;
mod frame;
mod init;
mod probe;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
pub use probe::probe_backend;
