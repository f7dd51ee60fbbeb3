//! Adaptive call-duration estimation for progress feedback.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// Number of samples retained.
const WINDOW: usize = 5;

/// Samples needed before the aggregate rate is trusted over the last sample.
const AGGREGATE_THRESHOLD: usize = 3;

/// One observed `(size, duration)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    /// Requested output size
    pub size: u32,
    /// Observed duration in seconds
    pub elapsed_secs: f64,
}

/// Predicts call duration from recent `(size, duration)` samples.
///
/// With three or more samples the estimate is `size × Σduration / Σsize`, a
/// through-origin rate fit over all retained samples. With one or two samples
/// only the most recent one is used. Samples are recorded only inside the
/// calibration window, except for the very first one.
///
/// # Examples
///
/// ```
/// use saga_models::DurationEstimator;
///
/// let mut estimator = DurationEstimator::new(3000..=4000);
/// assert_eq!(estimator.estimate(3500), None);
///
/// assert!(estimator.record(3072, 96.0));
/// assert_eq!(estimator.estimate(1024), Some(32.0));
///
/// // Outside the window once bootstrapped: ignored.
/// assert!(!estimator.record(500, 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct DurationEstimator {
    window: RangeInclusive<u32>,
    samples: VecDeque<TimingSample>,
}

impl DurationEstimator {
    /// Create an estimator with the given calibration window.
    pub fn new(window: RangeInclusive<u32>) -> Self {
        Self {
            window,
            samples: VecDeque::with_capacity(WINDOW),
        }
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &TimingSample> {
        self.samples.iter()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Predicted duration in seconds, or `None` without samples.
    pub fn estimate(&self, size: u32) -> Option<f64> {
        let size = f64::from(size);
        if self.samples.len() >= AGGREGATE_THRESHOLD {
            let total_size: f64 = self.samples.iter().map(|s| f64::from(s.size)).sum();
            let total_secs: f64 = self.samples.iter().map(|s| s.elapsed_secs).sum();
            if total_size <= 0.0 {
                return None;
            }
            return Some(size * (total_secs / total_size));
        }

        let last = self.samples.back()?;
        if last.size == 0 {
            return None;
        }
        Some(size * (last.elapsed_secs / f64::from(last.size)))
    }

    /// Record an observation.
    ///
    /// Returns whether the sample was kept. Sizes outside the calibration window
    /// are ignored unless no sample exists yet; zero sizes are always ignored.
    pub fn record(&mut self, size: u32, elapsed_secs: f64) -> bool {
        if size == 0 || !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
            return false;
        }
        if !self.samples.is_empty() && !self.window.contains(&size) {
            return false;
        }
        if self.samples.len() == WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(TimingSample { size, elapsed_secs });
        true
    }

    /// Relative error `|estimate − actual| / actual`, for diagnostics only.
    pub fn accuracy(estimate: f64, actual: f64) -> Option<f64> {
        (actual > 0.0).then(|| (estimate - actual).abs() / actual)
    }
}
