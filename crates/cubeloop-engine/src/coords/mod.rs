//! Surface-size types shared by the runtime, renderers and cameras.

mod viewport;

pub use viewport::Viewport;
