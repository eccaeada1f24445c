//! Frame accumulator

/// Decides when the next fixed-rate tick is due.
///
/// A tick fires once the time since the last tick reaches the interval; the
/// overshoot carries into the next interval. At most one tick fires per
/// [`advance`](Self::advance) call, so a stalled host never triggers a burst
/// of catch-up ticks.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Target FPS
    pub target_fps: u32,
    /// Tick interval in milliseconds
    interval_ms: f64,
    /// Anchor of the current interval
    last_tick_ms: Option<f64>,
}

impl FrameClock {
    pub fn new(target_fps: u32) -> Self {
        let target_fps = target_fps.max(1);
        Self {
            target_fps,
            interval_ms: 1000.0 / target_fps as f64,
            last_tick_ms: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Forget the anchor (e.g., after pause); the next `advance` re-anchors.
    pub fn reset(&mut self) {
        self.last_tick_ms = None;
    }

    /// Returns true when a tick is due at `now_ms`.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        let Some(last) = self.last_tick_ms else {
            self.last_tick_ms = Some(now_ms);
            return false;
        };

        let delta = now_ms - last;
        if delta < 0.0 {
            self.last_tick_ms = Some(now_ms);
            return false;
        }

        if delta >= self.interval_ms {
            self.last_tick_ms = Some(now_ms - delta % self.interval_ms);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_advance_anchors() {
        let mut clock = FrameClock::new(60);
        assert!(!clock.advance(1000.0));
        assert!(!clock.advance(1010.0));
        assert!(clock.advance(1017.0));
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut clock = FrameClock::new(50); // 20ms
        clock.advance(0.0);
        assert!(clock.advance(25.0)); // 5ms carried
        assert!(!clock.advance(39.0));
        assert!(clock.advance(40.0));
    }

    #[test]
    fn test_no_catch_up_burst() {
        let mut clock = FrameClock::new(60);
        clock.advance(0.0);
        assert!(clock.advance(500.0));
        // A long stall yields one tick, not thirty.
        assert!(!clock.advance(500.5));
    }

    #[test]
    fn test_reset() {
        let mut clock = FrameClock::new(60);
        clock.advance(0.0);
        clock.reset();
        assert!(!clock.advance(10_000.0));
        assert!(clock.advance(10_020.0));
    }
}
