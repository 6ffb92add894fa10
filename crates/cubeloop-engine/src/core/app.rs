use crate::render_loop::NextFrame;

use super::ctx::FrameCtx;

/// Application contract implemented by higher layers.
///
/// The runtime owns the app for as long as its render loop runs. Returning
/// an error faults the loop; not calling `next.request()` finishes it.
pub trait App {
    /// Called once per scheduled frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>, next: &mut NextFrame) -> anyhow::Result<()>;
}
