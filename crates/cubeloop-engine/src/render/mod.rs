//! GPU rendering subsystem.
//!
//! Renderers consume a `scene::Scene` and issue GPU commands via wgpu.
//! Each renderer owns its GPU resources (pipelines, buffers, attachments)
//! and creates them lazily on first use.
//!
//! Convention:
//! - world space is right-handed, +Y up, camera looking down -Z
//! - colors are linear; the sRGB surface performs the final encode

mod ctx;
mod mesh;

pub use ctx::{RenderCtx, RenderTarget};
pub use mesh::{MAX_LIGHTS, MeshRenderer};
