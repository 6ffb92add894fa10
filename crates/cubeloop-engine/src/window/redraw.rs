use crate::coords::Viewport;
use crate::render_loop::{LoopHandle, Scheduler};

/// Scheduler backed by window redraw requests.
///
/// Requests are only recorded here. The runtime turns a pending request into
/// `Window::request_redraw` once the event queue drains, and `take`s it back
/// when the redraw arrives. Repeated requests before that coalesce into one.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    pending: Option<LoopHandle>,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the host should ask the window for a redraw now.
    ///
    /// A pending request is held back while the surface cannot be drawn
    /// (minimized window) and released once it has a size again.
    pub fn wants_redraw(&self, viewport: Viewport) -> bool {
        self.is_pending() && viewport.is_drawable()
    }

    /// Claims the pending request for the redraw being handled.
    pub fn take(&mut self) -> Option<LoopHandle> {
        self.pending.take()
    }
}

impl Scheduler for RedrawScheduler {
    fn request_frame(&mut self, handle: LoopHandle) {
        if let Some(prev) = self.pending.replace(handle) {
            if prev != handle {
                log::trace!("redraw request for {prev} superseded by {handle}");
            }
        }
    }
}
