//! Monotonic timestamps to clamped simulation steps.

use web_time::Instant;

/// Converts host frame timestamps into a clamped `dt` and tracks a smoothed
/// FPS for diagnostics.
///
/// The cap keeps a single long stall (backgrounded tab, breakpoint) from
/// producing one huge simulation step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Largest step handed out, in milliseconds.
    max_frame_ms: f64,
    /// Timestamp of the previous tick in milliseconds (`None` until primed).
    last_ms: Option<f64>,
    /// Origin for [`Self::tick_instant`].
    origin: Instant,
    /// Smoothed FPS using exponential moving average.
    smoothed_fps: f32,
    /// Smoothing factor (lower = smoother, 0.0-1.0).
    smoothing: f32,
}

impl FrameClock {
    /// Create a clock that never reports more than `max_frame_ms`.
    #[must_use]
    pub fn new(max_frame_ms: f64) -> Self {
        Self {
            max_frame_ms: max_frame_ms.max(0.0),
            last_ms: None,
            origin: Instant::now(),
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    /// Advance to `now_ms` (monotonic host milliseconds) and return the
    /// elapsed time in seconds, clamped to the cap.
    ///
    /// The first call only primes the clock and returns `0.0`. A timestamp
    /// older than the previous one also yields `0.0`.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let Some(last) = self.last_ms.replace(now_ms) else {
            return 0.0;
        };

        let elapsed = now_ms - last;
        if elapsed <= 0.0 {
            return 0.0;
        }

        let instant_fps = (1000.0 / elapsed) as f32;
        self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
            + instant_fps * self.smoothing;

        if elapsed > self.max_frame_ms {
            log::debug!(
                "frame stall of {elapsed:.1} ms clamped to {:.1} ms",
                self.max_frame_ms
            );
        }
        (elapsed.min(self.max_frame_ms) / 1000.0) as f32
    }

    /// Tick using the local monotonic clock (native hosts).
    pub fn tick_instant(&mut self) -> f32 {
        let now_ms = self.origin.elapsed().as_secs_f64() * 1000.0;
        self.tick(now_ms)
    }

    /// Milliseconds since this clock was created, on the same timeline as
    /// [`Self::tick_instant`].
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    /// The configured cap in seconds.
    #[must_use]
    pub fn max_dt(&self) -> f32 {
        (self.max_frame_ms / 1000.0) as f32
    }

    /// Get the current FPS (smoothed).
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_primes_without_a_step() {
        let mut clock = FrameClock::new(50.0);
        assert_eq!(clock.tick(1234.0), 0.0);
        let dt = clock.tick(1250.0);
        assert!((dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn long_stall_is_clamped_to_cap() {
        let mut clock = FrameClock::new(50.0);
        let _ = clock.tick(0.0);
        let dt = clock.tick(5000.0);
        assert!((dt - 0.05).abs() < 1e-6);
        assert!((clock.max_dt() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn backwards_timestamp_yields_zero() {
        let mut clock = FrameClock::new(50.0);
        let _ = clock.tick(100.0);
        assert_eq!(clock.tick(90.0), 0.0);
        // Steps are measured from the most recent reading.
        let dt = clock.tick(100.0);
        assert!((dt - 0.01).abs() < 1e-6);
    }

    #[test]
    fn fps_tracks_steady_frame_rate() {
        let mut clock = FrameClock::new(50.0);
        let mut t = 0.0;
        for _ in 0..400 {
            let _ = clock.tick(t);
            t += 1000.0 / 30.0;
        }
        assert!((clock.fps() - 30.0).abs() < 0.5);
    }
}
