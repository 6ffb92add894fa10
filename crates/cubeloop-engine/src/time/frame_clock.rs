use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped time since the previous tick, in seconds.
    pub dt: f32,

    /// Unclamped time since the first tick, in seconds.
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Zero for the first frame of the clock.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// hand a huge step to the frame callback.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Option<Instant>,
    last: Option<Instant>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    nominal_dt: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            start: None,
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
            // Reported for the very first frame, which has no predecessor.
            nominal_dt: Duration::from_micros(16_667).clamp(dt_min, dt_max),
        }
    }

    /// Forgets the previous tick so the next `dt` is nominal again.
    ///
    /// Frame index and elapsed time keep counting.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock as if the tick happened at `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let start = *self.start.get_or_insert(now);

        let dt = match self.last {
            Some(last) => now
                .saturating_duration_since(last)
                .clamp(self.dt_min, self.dt_max),
            None => self.nominal_dt,
        };
        self.last = Some(now);

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
