use std::time::Duration;

/// Fixed-interval clock fed by variable host frame deltas.
///
/// At most one step fires per [`FixedStep::advance`] call. The leftover time is carried into the
/// next call, so a long frame delays steps instead of dropping them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedStep {
    interval: Duration,
    accumulated: Duration,
}

impl FixedStep {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn dt(&self) -> f32 {
        self.interval.as_secs_f32()
    }

    /// Time carried toward the next step.
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Add `delta` and report whether a step is due.
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.accumulated += delta;
        if self.interval.is_zero() || self.accumulated < self.interval {
            return false;
        }
        self.accumulated -= self.interval;
        true
    }
}
