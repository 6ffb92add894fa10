use std::time::{Duration, Instant};

/// Counts frames over fixed windows and reports the average rate.
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
}

impl FrameRateMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            window_start: None,
            frames: 0,
        }
    }

    /// Records one presented frame.
    ///
    /// Returns the frames-per-second of the window that just closed, if any.
    pub fn record(&mut self, now: Instant) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let span = now.saturating_duration_since(start);
        if span < self.window {
            return None;
        }

        // The frame closing the window belongs to the next one.
        let rate = (self.frames - 1) as f32 / span.as_secs_f32();
        self.window_start = Some(now);
        self.frames = 1;
        Some(rate)
    }
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_window() {
        let t0 = Instant::now();
        let mut meter = FrameRateMeter::default();

        let mut reports = Vec::new();
        for i in 0..=120u64 {
            if let Some(rate) = meter.record(t0 + Duration::from_micros(i * 16_667)) {
                reports.push(rate);
            }
        }

        assert_eq!(reports.len(), 2);
        assert!((reports[0] - 60.0).abs() < 0.1, "got {}", reports[0]);
    }

    #[test]
    fn nothing_before_the_first_window_closes() {
        let t0 = Instant::now();
        let mut meter = FrameRateMeter::new(Duration::from_millis(500));
        assert_eq!(meter.record(t0), None);
        assert_eq!(meter.record(t0 + Duration::from_millis(499)), None);
    }
}
