use crate::scale::QuantizeScale;
use crate::types::{GeoFeature, MetricKind};
use serde::Serialize;

const NOT_AVAILABLE: &str = "NOT AVAILABLE";

/// What a renderer should paint a feature with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "bucket", rename_all = "snake_case")]
pub enum Fill<B> {
    Bucket(B),
    NoData,
}

/// Resolves the fill for `feature` under `metric`. Missing values, values the
/// scale cannot classify, and metrics without a scale all come back as `NoData`.
pub fn fill_for<B: Clone + PartialEq>(
    feature: &GeoFeature,
    metric: MetricKind,
    scale: Option<&QuantizeScale<B>>,
) -> Fill<B> {
    let (Some(scale), Some(value)) = (scale, feature.metric(metric)) else {
        return Fill::NoData;
    };
    match scale.classify(value) {
        Ok(bucket) => Fill::Bucket(bucket.clone()),
        Err(_) => Fill::NoData,
    }
}

/// Hover text for one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSummary {
    pub name: String,
    pub density: String,
    pub unemployment: String,
}

impl FeatureSummary {
    pub fn for_feature(feature: &GeoFeature) -> Self {
        let name = match &feature.name {
            Some(name) => format!("{} County", name),
            None => NOT_AVAILABLE.to_string(),
        };
        let density = match feature.density {
            Some(d) => format!("{} people per sq. mile", d),
            None => NOT_AVAILABLE.to_string(),
        };
        let unemployment = match feature.unemployment_rate {
            Some(rate) => format!("Unemployment: {}%", percent(rate)),
            None => format!("Unemployment: {}", NOT_AVAILABLE),
        };
        FeatureSummary { name, density, unemployment }
    }
}

// Truncated, not rounded, to two decimals.
fn percent(rate: f64) -> f64 {
    (rate * 10000.0).floor() / 100.0
}
