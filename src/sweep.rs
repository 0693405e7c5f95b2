//! Numeric parameter sweeps.
//!
//! A sweep is a half-open range `[start, stop)` walked in fixed steps, the
//! same points `numpy.arange` yields.
use anyhow::{ensure, Result};

/// Upper bound on the number of points in one sweep.
pub const MAX_SWEEP_POINTS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRange {
    start: f64,
    stop: f64,
    step: f64,
}

impl SweepRange {
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self> {
        ensure!(
            start.is_finite() && stop.is_finite() && step.is_finite(),
            "sweep bounds must be finite (got {start}, {stop}, {step})"
        );
        ensure!(step > 0.0, "sweep step must be positive (got {step})");
        let count = point_count(start, stop, step);
        ensure!(
            count <= MAX_SWEEP_POINTS as f64,
            "sweep from {start} to {stop} by {step} exceeds {MAX_SWEEP_POINTS} points"
        );
        Ok(Self { start, stop, step })
    }

    pub fn len(&self) -> usize {
        point_count(self.start, self.stop, self.step) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> SweepPoints {
        SweepPoints {
            range: *self,
            index: 0,
            len: self.len(),
        }
    }

    /// Sweep points paired with their work-item identifiers.
    pub fn labelled<'a>(&self, prefix: &'a str) -> impl Iterator<Item = (f64, String)> + 'a {
        self.points().map(move |value| (value, point_id(prefix, value)))
    }
}

/// Lazy iterator over a [`SweepRange`]. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct SweepPoints {
    range: SweepRange,
    index: usize,
    len: usize,
}

impl Iterator for SweepPoints {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.index >= self.len {
            return None;
        }
        let value = self.range.start + self.index as f64 * self.range.step;
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SweepPoints {}

// Non-negative and possibly infinite; callers cap it before casting.
fn point_count(start: f64, stop: f64, step: f64) -> f64 {
    ((stop - start) / step).ceil().max(0.0)
}

pub fn point_id(prefix: &str, value: f64) -> String {
    format!("{prefix}-{value:.2}")
}
