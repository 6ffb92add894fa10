use std::collections::VecDeque;

use super::controller::{FrameCallback, FrameOutcome, LoopHandle, RenderLoop};
use super::error::FrameFault;

/// Host rescheduling primitive ("call me back before the next repaint").
///
/// Implementations only record the request. The host later hands the handle
/// back to [`RenderLoop::dispatch`] when the presentation opportunity arrives.
pub trait Scheduler {
    fn request_frame(&mut self, handle: LoopHandle);
}

/// Synchronous queue-backed scheduler.
///
/// Nothing happens until the owner pops a request and dispatches it, which
/// makes frame sequencing fully deterministic in tests and headless runs.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queue: VecDeque<LoopHandle>,
    total_requests: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests waiting to be dispatched.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Total requests received since creation.
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn pop(&mut self) -> Option<LoopHandle> {
        self.queue.pop_front()
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self, handle: LoopHandle) {
        self.total_requests += 1;
        self.queue.push_back(handle);
    }
}

impl<F> RenderLoop<F, ManualScheduler> {
    /// Dispatches queued requests until the queue is empty or `max_frames`
    /// frames have run.
    ///
    /// Stale requests are drained without counting. Returns the number of
    /// frames that actually ran; the first fault stops the run.
    pub fn run_until_idle<C>(&mut self, ctx: &mut C, max_frames: usize) -> Result<usize, FrameFault>
    where
        C: ?Sized,
        F: FrameCallback<C>,
    {
        let mut ran = 0;
        while ran < max_frames {
            let Some(handle) = self.scheduler_mut().pop() else {
                break;
            };
            match self.dispatch(handle, ctx)? {
                FrameOutcome::Stale => {}
                FrameOutcome::Rescheduled | FrameOutcome::Finished => ran += 1,
            }
        }
        Ok(ran)
    }
}
