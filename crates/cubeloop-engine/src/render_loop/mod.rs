//! Capability-gated, self-rescheduling render loop.
//!
//! A loop is started once the host's rendering backend has been probed. Each
//! frame decides whether it wants to run again; the controller forwards that
//! wish to an injected [`Scheduler`] only after the frame has returned, so
//! frames never overlap and never re-enter.
//!
//! The controller is host-agnostic:
//! - the winit runtime drives it through window redraw requests
//! - tests drive it through [`ManualScheduler`]

mod controller;
mod error;
mod scheduler;

pub use controller::{Capability, FrameCallback, FrameOutcome, LoopHandle, NextFrame, RenderLoop};
pub use error::{FrameFault, Unavailable};
pub use scheduler::{ManualScheduler, Scheduler};
