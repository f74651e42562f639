//! Frame-driven animation clock
//!
//! Nothing here blocks or owns a thread. The host calls `tick(now)` from its
//! display-refresh callback and every running [`Animation`] turns that
//! instant into a fraction. Visual state is then a pure function of the
//! fraction.

use std::time::{Duration, Instant};

/// Where an animation is relative to `now`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Still inside the start delay
    Pending,
    /// Linear fraction in `[0, 1)`
    Running(f64),
    Finished,
}

impl Progress {
    /// Fraction with the delay counted as 0 and completion as 1
    pub fn fraction(&self) -> f64 {
        match self {
            Progress::Pending => 0.0,
            Progress::Running(f) => *f,
            Progress::Finished => 1.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Progress::Finished)
    }
}

/// A single timed animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    start: Instant,
    delay: Duration,
    duration: Duration,
}

impl Animation {
    pub fn new(start: Instant, duration: Duration) -> Self {
        Self {
            start,
            delay: Duration::ZERO,
            duration,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// Instant at which the animation reaches its terminal value
    pub fn end(&self) -> Instant {
        self.start + self.delay + self.duration
    }

    pub fn progress(&self, now: Instant) -> Progress {
        let begin = self.start + self.delay;
        if now < begin {
            return Progress::Pending;
        }
        if now >= self.end() || self.duration.is_zero() {
            return Progress::Finished;
        }
        let elapsed = now.duration_since(begin).as_secs_f64();
        Progress::Running(elapsed / self.duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_then_running_then_finished() {
        let t0 = Instant::now();
        let anim = Animation::new(t0, Duration::from_millis(500)).with_delay(Duration::from_millis(150));

        assert_eq!(anim.progress(t0), Progress::Pending);
        assert_eq!(anim.progress(t0 + Duration::from_millis(149)).fraction(), 0.0);

        let mid = anim.progress(t0 + Duration::from_millis(400)).fraction();
        assert!((mid - 0.5).abs() < 1e-6);

        assert!(anim.progress(t0 + Duration::from_millis(650)).is_finished());
        assert_eq!(anim.end(), t0 + Duration::from_millis(650));
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let t0 = Instant::now();
        let anim = Animation::new(t0, Duration::ZERO);
        assert!(anim.progress(t0).is_finished());
    }
}
