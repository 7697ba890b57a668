//! Count-up animation values for dashboard counters
//!
//! Purely cosmetic: produces the intermediate numbers shown while a counter
//! moves from its old value to the new one. Never touches the stored snapshot.

#![forbid(unsafe_code)]
#![allow(clippy::cast_precision_loss)] // Frame math on small counts
#![allow(clippy::arithmetic_side_effects)] // Float interpolation only

use std::time::Duration;

/// Default animation length
pub const DEFAULT_COUNT_UP_DURATION: Duration = Duration::from_millis(1000);

/// Ease-out cubic: fast start, gentle stop
#[must_use]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let inverse = 1.0 - t;
    1.0 - inverse * inverse * inverse
}

/// Interpolates a displayed value toward a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountUp {
    from: f64,
    to: f64,
    duration: Duration,
}

impl CountUp {
    #[must_use]
    pub const fn new(from: f64, to: f64, duration: Duration) -> Self {
        Self { from, to, duration }
    }

    #[must_use]
    pub const fn target(&self) -> f64 {
        self.to
    }

    /// Value to display `elapsed` after the animation started
    ///
    /// Returns exactly the target once `elapsed >= duration`.
    #[must_use]
    pub fn value_at(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }
        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * ease_out_cubic(progress)
    }

    /// Sampled values at `fps` frames per second, ending exactly at the target
    ///
    /// The sequence never moves away from the target, so it is non-decreasing
    /// when counting up and non-increasing when counting down.
    #[must_use]
    pub fn frames(&self, fps: u32) -> Vec<f64> {
        let fps = fps.max(1);
        let total = (self.duration.as_secs_f64() * f64::from(fps)).ceil();
        // Bounded by duration * fps, a handful of frames for real animations
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = (total as usize).max(1);

        let mut frames: Vec<f64> = (1..count)
            .map(|frame| {
                let elapsed = self.duration.mul_f64(frame as f64 / count as f64);
                self.value_at(elapsed)
            })
            .collect();
        frames.push(self.to);
        frames
    }
}
