//! Streaming summary statistics
//!
//! Parameter values span many orders of magnitude (leakage currents around
//! 1e-9 A next to breakdown voltages around 650 V), so mean and variance are
//! accumulated with Welford's online algorithm rather than raw sums of squares.

use serde::Serialize;

/// Online accumulator for count, mean, variance, min and max
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulator {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add one sample in O(1)
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Combine two accumulators (Chan et al. parallel update)
    pub fn merge(&self, other: &Accumulator) -> Accumulator {
        if self.count == 0 {
            return *other;
        }
        if other.count == 0 {
            return *self;
        }
        let count = self.count + other.count;
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let delta = other.mean - self.mean;
        let mean = self.mean + delta * n_b / count as f64;
        let m2 = self.m2 + other.m2 + delta * delta * n_a * n_b / count as f64;
        Accumulator {
            count,
            mean,
            m2,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Finalize into reportable statistics
    pub fn finish(&self) -> ParameterStats {
        if self.count == 0 {
            return ParameterStats::empty();
        }
        // Sample variance; undefined for a single value
        let stddev = if self.count > 1 {
            Some((self.m2.max(0.0) / (self.count - 1) as f64).sqrt())
        } else {
            None
        };
        ParameterStats {
            count: self.count as usize,
            mean: Some(self.mean),
            stddev,
            min: Some(self.min),
            max: Some(self.max),
        }
    }
}

impl Extend<f64> for Accumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.push(x);
        }
    }
}

impl FromIterator<f64> for Accumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Accumulator::new();
        acc.extend(iter);
        acc
    }
}

/// Summary of one parameter within one group
///
/// Fields other than `count` are `None` when undefined: everything is undefined
/// for an empty group and `stddev` is undefined for a single value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterStats {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1 divisor)
    pub stddev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ParameterStats {
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: None,
            stddev: None,
            min: None,
            max: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Quantile by linear interpolation between closest ranks
///
/// `sorted` must be ascending and non-empty; `q` is clamped to `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
