use std::fmt;

use super::error::{FrameFault, Unavailable};
use super::scheduler::Scheduler;

/// Outcome of a one-time backend capability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Available,
    Unavailable { reason: String },
}

impl Capability {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Capability::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Opaque identifier of a running loop.
///
/// Handles are never reused within one [`RenderLoop`], so a handle from a
/// finished or cancelled loop can never address a newer one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LoopHandle(u64);

impl fmt::Display for LoopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render loop #{}", self.0)
    }
}

/// Reschedule request slot handed to every frame invocation.
///
/// A frame that does not call [`request`](Self::request) ends its loop.
#[derive(Debug, Default)]
pub struct NextFrame {
    requested: bool,
}

impl NextFrame {
    /// Asks for one more invocation once the current one has returned.
    ///
    /// May be called before or after the frame's rendering work; calling it
    /// more than once still yields a single invocation.
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }
}

/// Per-frame work: advance state by one tick and draw it.
///
/// `C` is the caller-owned context passed by reference to every invocation.
/// Closures of the shape `FnMut(&mut C, &mut NextFrame) -> anyhow::Result<()>`
/// implement this trait.
pub trait FrameCallback<C: ?Sized> {
    fn frame(&mut self, ctx: &mut C, next: &mut NextFrame) -> anyhow::Result<()>;
}

impl<C, F> FrameCallback<C> for F
where
    C: ?Sized,
    F: FnMut(&mut C, &mut NextFrame) -> anyhow::Result<()>,
{
    fn frame(&mut self, ctx: &mut C, next: &mut NextFrame) -> anyhow::Result<()> {
        self(ctx, next)
    }
}

/// What happened to a dispatched handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// The frame ran and asked for another one; the scheduler has been notified.
    Rescheduled,
    /// The frame ran and did not ask for another one; the loop is over.
    Finished,
    /// The handle was cancelled, finished, or not currently scheduled. Nothing ran.
    Stale,
}

struct ActiveLoop<F> {
    handle: LoopHandle,
    frame: F,
    frames_run: u64,

    /// Set while a request sits with the scheduler and has not been dispatched.
    scheduled: bool,
}

/// Render loop controller.
///
/// Owns at most one running loop. All operations take `&mut self`, so a frame
/// can never start while another one is executing.
pub struct RenderLoop<F, S> {
    scheduler: S,
    active: Option<ActiveLoop<F>>,
    next_id: u64,
}

impl<F, S> RenderLoop<F, S>
where
    S: Scheduler,
{
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            active: None,
            next_id: 0,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Returns the handle of the running loop, if any.
    pub fn active_handle(&self) -> Option<LoopHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Probes the backend once and starts a loop running `frame`.
    ///
    /// - `probe` is called exactly once, synchronously. A panic inside it is
    ///   not caught.
    /// - On `Capability::Unavailable`, `on_unavailable` runs exactly once and
    ///   no frame is ever scheduled.
    /// - On `Capability::Available`, the first frame is requested from the
    ///   scheduler and the new handle is returned.
    ///
    /// A loop that is already running is cancelled first.
    pub fn start<P, U>(
        &mut self,
        probe: P,
        on_unavailable: U,
        frame: F,
    ) -> Result<LoopHandle, Unavailable>
    where
        P: FnOnce() -> Capability,
        U: FnOnce(&Unavailable),
    {
        if let Some(previous) = self.active.take() {
            log::warn!("{} cancelled by a new start", previous.handle);
        }

        match probe() {
            Capability::Unavailable { reason } => {
                let err = Unavailable { reason };
                log::warn!("{err}");
                on_unavailable(&err);
                Err(err)
            }
            Capability::Available => {
                let handle = LoopHandle(self.next_id);
                self.next_id += 1;

                self.active = Some(ActiveLoop {
                    handle,
                    frame,
                    frames_run: 0,
                    scheduled: true,
                });
                self.scheduler.request_frame(handle);

                log::info!("{handle} started");
                Ok(handle)
            }
        }
    }

    /// Stops the loop identified by `handle`.
    ///
    /// Unknown, finished and already-cancelled handles are ignored. A request
    /// still sitting with the scheduler becomes stale and will not run.
    pub fn cancel(&mut self, handle: LoopHandle) {
        if self.active.as_ref().is_some_and(|a| a.handle == handle) {
            self.active = None;
            log::info!("{handle} cancelled");
        } else {
            log::trace!("cancel ignored for inactive {handle}");
        }
    }

    /// Runs one scheduled frame, handing the callback to `invoke`.
    ///
    /// Hosts whose per-frame context borrows short-lived resources use this
    /// form; everyone else can use [`dispatch`](Self::dispatch).
    ///
    /// The next frame is requested from the scheduler only after `invoke`
    /// returns, and only if the frame asked for it. An error from `invoke`
    /// tears the loop down and is returned as a [`FrameFault`].
    pub fn dispatch_with<I>(&mut self, handle: LoopHandle, invoke: I) -> Result<FrameOutcome, FrameFault>
    where
        I: FnOnce(&mut F, &mut NextFrame) -> anyhow::Result<()>,
    {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|a| a.handle == handle && a.scheduled)
        else {
            log::trace!("stale dispatch for {handle}");
            return Ok(FrameOutcome::Stale);
        };

        active.scheduled = false;
        let frame_index = active.frames_run;
        active.frames_run += 1;

        let mut next = NextFrame::default();
        if let Err(error) = invoke(&mut active.frame, &mut next) {
            self.active = None;
            let fault = FrameFault {
                handle,
                frame_index,
                error,
            };
            log::error!("{fault}: {:#}", fault.error);
            return Err(fault);
        }

        if next.requested {
            active.scheduled = true;
            self.scheduler.request_frame(handle);
            log::trace!("{handle} rescheduled after frame {frame_index}");
            Ok(FrameOutcome::Rescheduled)
        } else {
            self.active = None;
            log::info!("{handle} finished after {} frames", frame_index + 1);
            Ok(FrameOutcome::Finished)
        }
    }

    /// Runs one scheduled frame with `ctx` as its context.
    pub fn dispatch<C>(&mut self, handle: LoopHandle, ctx: &mut C) -> Result<FrameOutcome, FrameFault>
    where
        C: ?Sized,
        F: FrameCallback<C>,
    {
        self.dispatch_with(handle, |frame, next| frame.frame(ctx, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_loop::ManualScheduler;

    type Frame = Box<dyn FnMut(&mut Counter, &mut NextFrame) -> anyhow::Result<()>>;

    #[derive(Default)]
    struct Counter {
        frames: u32,
    }

    fn controller() -> RenderLoop<Frame, ManualScheduler> {
        RenderLoop::new(ManualScheduler::new())
    }

    fn forever() -> Frame {
        Box::new(|c: &mut Counter, next: &mut NextFrame| -> anyhow::Result<()> {
            next.request();
            c.frames += 1;
            Ok(())
        })
    }

    // ── start ─────────────────────────────────────────────────────────────

    #[test]
    fn unavailable_backend_never_runs_a_frame() {
        let mut rl = controller();
        let mut fallbacks = 0;
        let mut probes = 0;

        let res = rl.start(
            || {
                probes += 1;
                Capability::unavailable("no adapter")
            },
            |err| {
                assert_eq!(err.reason, "no adapter");
                fallbacks += 1;
            },
            forever(),
        );

        assert_eq!(res.unwrap_err().reason, "no adapter");
        assert_eq!(probes, 1);
        assert_eq!(fallbacks, 1);
        assert!(!rl.is_running());
        assert_eq!(rl.scheduler().total_requests(), 0);

        let mut counter = Counter::default();
        assert_eq!(rl.run_until_idle(&mut counter, 10).unwrap(), 0);
        assert_eq!(counter.frames, 0);
    }

    #[test]
    fn available_backend_runs_frames_and_skips_fallback() {
        let mut rl = controller();
        let mut fallbacks = 0;

        let handle = rl
            .start(|| Capability::Available, |_| fallbacks += 1, forever())
            .unwrap();

        assert_eq!(rl.active_handle(), Some(handle));
        assert_eq!(rl.scheduler().pending(), 1);

        let mut counter = Counter::default();
        rl.run_until_idle(&mut counter, 1).unwrap();

        assert!(counter.frames >= 1);
        assert_eq!(fallbacks, 0);
    }

    #[test]
    fn counter_scenario_stops_at_three() {
        let mut rl = controller();
        let frame: Frame = Box::new(|c: &mut Counter, next: &mut NextFrame| -> anyhow::Result<()> {
            c.frames += 1;
            if c.frames < 3 {
                next.request();
            }
            Ok(())
        });

        rl.start(|| Capability::Available, |_| panic!("fallback"), frame)
            .unwrap();

        let mut counter = Counter::default();
        let ran = rl.run_until_idle(&mut counter, 100).unwrap();

        assert_eq!(ran, 3);
        assert_eq!(counter.frames, 3);
        assert!(!rl.is_running());
    }

    #[test]
    fn starting_again_cancels_the_previous_loop() {
        let mut rl = controller();
        let first = rl.start(|| Capability::Available, |_| {}, forever()).unwrap();
        let second = rl.start(|| Capability::Available, |_| {}, forever()).unwrap();

        assert_ne!(first, second);
        assert_eq!(rl.active_handle(), Some(second));

        let mut counter = Counter::default();
        assert_eq!(rl.dispatch(first, &mut counter).unwrap(), FrameOutcome::Stale);
        assert_eq!(counter.frames, 0);
        assert_eq!(rl.dispatch(second, &mut counter).unwrap(), FrameOutcome::Rescheduled);
        assert_eq!(counter.frames, 1);
    }

    // ── sequencing ────────────────────────────────────────────────────────

    #[derive(Default)]
    struct Trace {
        clock: u64,
        inside: bool,
        spans: Vec<(u64, u64)>,
    }

    #[test]
    fn frames_never_overlap() {
        let mut rl: RenderLoop<_, ManualScheduler> = RenderLoop::new(ManualScheduler::new());
        let frame = |t: &mut Trace, next: &mut NextFrame| -> anyhow::Result<()> {
            assert!(!t.inside, "frame entered while another was running");
            t.inside = true;
            t.clock += 1;
            let enter = t.clock;

            if t.spans.len() < 149 {
                next.request();
            }

            t.clock += 1;
            t.spans.push((enter, t.clock));
            t.inside = false;
            Ok(())
        };

        rl.start(|| Capability::Available, |_| {}, frame).unwrap();

        let mut trace = Trace::default();
        let ran = rl.run_until_idle(&mut trace, 1_000).unwrap();

        assert_eq!(ran, 150);
        for pair in trace.spans.windows(2) {
            assert!(pair[0].1 < pair[1].0, "overlap between {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn next_frame_is_requested_only_after_return() {
        let mut rl = controller();
        let handle = rl.start(|| Capability::Available, |_| {}, forever()).unwrap();

        // Drain the bootstrap request by hand.
        assert_eq!(rl.scheduler_mut().pop(), Some(handle));
        assert_eq!(rl.scheduler().pending(), 0);

        let mut counter = Counter::default();
        let outcome = rl
            .dispatch_with(handle, |frame, next| {
                let res = frame(&mut counter, next);
                assert!(next.is_requested());
                res
            })
            .unwrap();

        assert_eq!(outcome, FrameOutcome::Rescheduled);
        assert_eq!(rl.scheduler().pending(), 1);
    }

    #[test]
    fn duplicate_dispatch_of_one_request_is_stale() {
        let mut rl = controller();
        let single: Frame = Box::new(|c: &mut Counter, _next: &mut NextFrame| -> anyhow::Result<()> {
            c.frames += 1;
            Ok(())
        });
        let handle = rl.start(|| Capability::Available, |_| {}, single).unwrap();
        let mut counter = Counter::default();

        // A host that fires twice for one request must not run two frames.
        assert_eq!(rl.dispatch(handle, &mut counter).unwrap(), FrameOutcome::Finished);
        assert_eq!(rl.dispatch(handle, &mut counter).unwrap(), FrameOutcome::Stale);
        assert_eq!(counter.frames, 1);
        assert!(!rl.is_running());
    }

    // ── cancel ────────────────────────────────────────────────────────────

    #[test]
    fn cancel_is_idempotent() {
        let mut rl = controller();
        let handle = rl.start(|| Capability::Available, |_| {}, forever()).unwrap();

        rl.cancel(handle);
        rl.cancel(handle);
        assert!(!rl.is_running());

        // Handle that was never issued by this controller.
        rl.cancel(LoopHandle(42));
    }

    #[test]
    fn cancel_after_unavailable_start_is_a_no_op() {
        let mut rl = controller();
        let _ = rl.start(|| Capability::unavailable("headless"), |_| {}, forever());

        rl.cancel(LoopHandle(0));
        rl.cancel(LoopHandle(0));
        assert!(!rl.is_running());
    }

    #[test]
    fn cancel_mid_sequence_stops_further_frames() {
        let mut rl = controller();
        let handle = rl.start(|| Capability::Available, |_| {}, forever()).unwrap();

        let mut counter = Counter::default();
        assert_eq!(rl.run_until_idle(&mut counter, 5).unwrap(), 5);
        assert_eq!(rl.scheduler().pending(), 1);

        rl.cancel(handle);

        // The request already queued for frame six drains without running.
        assert_eq!(rl.run_until_idle(&mut counter, 5).unwrap(), 0);
        assert_eq!(counter.frames, 5);
        assert_eq!(rl.scheduler().pending(), 0);
    }

    // ── faults ────────────────────────────────────────────────────────────

    #[test]
    fn fault_halts_the_loop_and_reaches_the_owner() {
        let mut rl = controller();
        let frame: Frame = Box::new(|c: &mut Counter, next: &mut NextFrame| -> anyhow::Result<()> {
            next.request();
            c.frames += 1;
            if c.frames == 4 {
                anyhow::bail!("device lost");
            }
            Ok(())
        });
        let handle = rl.start(|| Capability::Available, |_| {}, frame).unwrap();

        let mut counter = Counter::default();
        let fault = rl.run_until_idle(&mut counter, 100).unwrap_err();

        assert_eq!(fault.handle, handle);
        assert_eq!(fault.frame_index, 3);
        assert_eq!(fault.error.to_string(), "device lost");
        assert_eq!(counter.frames, 4);
        assert!(!rl.is_running());

        // Requested before the fault, but never forwarded to the scheduler.
        assert_eq!(rl.scheduler().pending(), 0);
        assert_eq!(rl.run_until_idle(&mut counter, 100).unwrap(), 0);
        assert_eq!(counter.frames, 4);
    }

    #[test]
    fn restart_after_fault_checks_capability_again() {
        let mut rl = controller();
        let failing: Frame = Box::new(|_c: &mut Counter, _next: &mut NextFrame| -> anyhow::Result<()> {
            anyhow::bail!("boom")
        });
        rl.start(|| Capability::Available, |_| {}, failing).unwrap();

        let mut counter = Counter::default();
        assert!(rl.run_until_idle(&mut counter, 10).is_err());

        let mut probes = 0;
        rl.start(
            || {
                probes += 1;
                Capability::Available
            },
            |_| {},
            forever(),
        )
        .unwrap();

        assert_eq!(probes, 1);
        assert_eq!(rl.run_until_idle(&mut counter, 2).unwrap(), 2);
    }

    #[test]
    fn handle_display_names_the_loop() {
        assert_eq!(LoopHandle(7).to_string(), "render loop #7");
    }
}
