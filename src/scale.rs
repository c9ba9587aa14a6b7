//! Quantize scale over a log-transformed domain.
//!
//! `[ln(min), ln(max)]` is split into N equal-width intervals, one per bucket
//! label. A value sitting exactly on a boundary belongs to the upper bucket and
//! values outside the sampled range clamp to the first or last bucket.

use crate::error::ClassifyError;
use serde::Serialize;

/// Value range of one bucket, in original (not log) units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketRange {
    pub lower: f64,
    pub upper: f64,
}

impl BucketRange {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantizeScale<B> {
    buckets: Vec<B>,
    log_domain: (f64, f64),
    extent: (f64, f64),
    /// Interior boundaries in log space, `N - 1` of them.
    log_thresholds: Vec<f64>,
    /// Same boundaries exponentiated and clamped to `extent`.
    thresholds: Vec<f64>,
}

impl<B: Clone + PartialEq> QuantizeScale<B> {
    /// Builds the scale from joined samples. Non-positive samples have no
    /// logarithm and are left out of the domain.
    pub fn from_samples(samples: &[f64], buckets: Vec<B>) -> Result<Self, ClassifyError> {
        if buckets.is_empty() {
            return Err(ClassifyError::NoBuckets);
        }
        if samples.is_empty() {
            return Err(ClassifyError::EmptyDomain);
        }

        let (min, max) = samples
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v > 0.0)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .ok_or(ClassifyError::NonPositiveDomain { count: samples.len() })?;

        let (lo, hi) = (min.ln(), max.ln());
        let n = buckets.len();
        let log_thresholds: Vec<f64> = (1..n)
            .map(|k| (k as f64 * hi + (n - k) as f64 * lo) / n as f64)
            .collect();
        let thresholds = log_thresholds.iter().map(|t| t.exp().clamp(min, max)).collect();

        Ok(QuantizeScale { buckets, log_domain: (lo, hi), extent: (min, max), log_thresholds, thresholds })
    }

    pub fn buckets(&self) -> &[B] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn log_domain(&self) -> (f64, f64) {
        self.log_domain
    }

    /// Smallest and largest positive sample.
    pub fn extent(&self) -> (f64, f64) {
        self.extent
    }

    pub fn log_thresholds(&self) -> &[f64] {
        &self.log_thresholds
    }

    pub fn classify_index(&self, value: f64) -> Result<usize, ClassifyError> {
        if !(value.is_finite() && value > 0.0) {
            return Err(ClassifyError::OutOfDomain { value });
        }
        // Compared in original units against the same boundaries `invert` reports.
        Ok(self.thresholds.partition_point(|&t| t <= value))
    }

    pub fn classify(&self, value: f64) -> Result<&B, ClassifyError> {
        self.classify_index(value).map(|i| &self.buckets[i])
    }

    pub fn invert_index(&self, index: usize) -> Option<BucketRange> {
        if index >= self.buckets.len() {
            return None;
        }
        let last = self.buckets.len() - 1;
        let lower = if index == 0 { self.extent.0 } else { self.thresholds[index - 1] };
        let upper = if index == last { self.extent.1 } else { self.thresholds[index] };
        Some(BucketRange { lower, upper })
    }

    /// Value range of `bucket`. Labels are matched by first occurrence.
    pub fn invert(&self, bucket: &B) -> Result<BucketRange, ClassifyError> {
        self.buckets
            .iter()
            .position(|b| b == bucket)
            .and_then(|i| self.invert_index(i))
            .ok_or(ClassifyError::UnknownBucket)
    }

    /// Every bucket with its range, lowest first.
    pub fn ranges(&self) -> impl Iterator<Item = (&B, BucketRange)> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .filter_map(move |(i, b)| self.invert_index(i).map(|range| (b, range)))
    }
}
