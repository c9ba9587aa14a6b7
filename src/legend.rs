//! Legend ticks and swatch layout derived from a [`QuantizeScale`].

use crate::scale::QuantizeScale;
use crate::types::MetricSamples;
use serde::Serialize;

/// `N + 1` tick values: the first bucket's lower bound, then every bucket's upper bound.
pub fn tick_values<B: Clone + PartialEq>(scale: &QuantizeScale<B>) -> Vec<f64> {
    let mut ranges = scale.ranges().map(|(_, range)| range).peekable();
    let mut ticks = Vec::with_capacity(scale.len() + 1);
    if let Some(first) = ranges.peek() {
        ticks.push(first.lower);
    }
    ticks.extend(ranges.map(|range| range.upper));
    ticks
}

/// Square-root position scale with rounded output, so swatch area tracks magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SqrtScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        SqrtScale { domain, range }
    }

    /// Domain spans the smallest to largest sample. `None` without samples.
    pub fn from_samples(samples: &MetricSamples, range: (f64, f64)) -> Option<Self> {
        samples.extent().map(|domain| SqrtScale::new(domain, range))
    }

    fn transform(v: f64) -> f64 {
        v.signum() * v.abs().sqrt()
    }

    /// Unrounded position. Not clamped: values outside the domain extrapolate.
    pub fn position(&self, value: f64) -> f64 {
        let a = Self::transform(self.domain.0);
        let b = Self::transform(self.domain.1);
        let t = if b - a != 0.0 { (Self::transform(value) - a) / (b - a) } else { 0.5 };
        self.range.0 * (1.0 - t) + self.range.1 * t
    }

    pub fn map(&self, value: f64) -> f64 {
        self.position(value).round()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Swatch<B> {
    pub bucket: B,
    pub lower: f64,
    pub upper: f64,
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendModel<B> {
    pub caption: String,
    pub ticks: Vec<f64>,
    pub tick_positions: Vec<f64>,
    pub position: SqrtScale,
    pub swatches: Vec<Swatch<B>>,
}

impl<B: Clone + PartialEq> LegendModel<B> {
    pub fn build(caption: impl Into<String>, scale: &QuantizeScale<B>, position: SqrtScale) -> Self {
        let ticks = tick_values(scale);
        let tick_positions = ticks.iter().map(|&t| position.map(t)).collect();
        let swatches = scale
            .ranges()
            .map(|(bucket, range)| {
                let x = position.map(range.lower);
                Swatch {
                    bucket: bucket.clone(),
                    lower: range.lower,
                    upper: range.upper,
                    x,
                    width: position.map(range.upper) - x,
                }
            })
            .collect();

        LegendModel { caption: caption.into(), ticks, tick_positions, position, swatches }
    }
}
