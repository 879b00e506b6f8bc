use std::time::Instant;

/// Source of per-frame elapsed time.
pub trait Clock {
    /// Seconds since the previous call.
    fn delta(&mut self) -> f32;
}

/// Monotonic wall clock.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

/// Fixed step per call, for tests and replays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManualClock {
    pub step: f32,
    pub elapsed: f32,
}

impl ManualClock {
    pub fn new(step: f32) -> Self {
        Self { step, elapsed: 0.0 }
    }
}

impl Clock for ManualClock {
    fn delta(&mut self) -> f32 {
        self.elapsed += self.step;
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_repeats_its_step() {
        let mut clock = ManualClock::new(0.25);
        assert_eq!(clock.delta(), 0.25);
        assert_eq!(clock.delta(), 0.25);
        assert_eq!(clock.elapsed, 0.5);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let mut clock = SystemClock::new();
        assert!(clock.delta() >= 0.0);
    }
}
