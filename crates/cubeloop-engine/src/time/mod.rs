//! Frame timing.
//!
//! One `FrameClock` per render loop; `tick()` once per dispatched frame.
//! `FrameRateMeter` turns those ticks into a periodic frames-per-second figure.

mod frame_clock;
mod frame_rate;

pub use frame_clock::{FrameClock, FrameTime};
pub use frame_rate::FrameRateMeter;
