use anyhow::bail;
use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// The window the frame is presented to.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Current drawable size in physical pixels, zero while minimized.
    pub fn surface_size(&self) -> Viewport {
        Viewport::from(self.gpu.size())
    }

    /// Acquires the next surface image, calls `draw`, then presents.
    ///
    /// `draw` is responsible for covering the whole target (renderers clear
    /// on their first pass). Returns `Ok(false)` when the frame was skipped:
    /// zero-sized surface or a recoverable surface error. An unrecoverable
    /// surface error is returned as `Err`.
    pub fn render<F>(&mut self, draw: F) -> anyhow::Result<bool>
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let viewport = self.surface_size();
        if !viewport.is_drawable() {
            log::trace!("surface is {}x{}; frame skipped", viewport.width, viewport.height);
            return Ok(false);
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => bail!("surface cannot be recovered"),
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(false),
                };
            }
        };

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            viewport,
            self.gpu.sample_count(),
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        Ok(true)
    }
}
