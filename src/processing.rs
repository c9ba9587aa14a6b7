use crate::config::{AppConfig, LegendConfig, MetricStyle};
use crate::data::RawInputs;
use crate::error::ClassifyError;
use crate::join::{join_density, join_unemployment, JoinOutcome};
use crate::legend::{LegendModel, SqrtScale};
use crate::normalize::{normalize_density, normalize_unemployment, NormalizeReport};
use crate::render::{fill_for, FeatureSummary, Fill};
use crate::scale::QuantizeScale;
use crate::types::{GeoFeature, MetricKind, MetricSamples};
use serde::Serialize;
use tracing::{info, warn};

/// Features after filtering and both joins, with per-metric join results.
#[derive(Debug, Clone)]
pub struct PreparedMap {
    pub features: Vec<GeoFeature>,
    pub filtered_out: usize,
    pub density_rows: NormalizeReport,
    pub unemployment_rows: NormalizeReport,
    pub density: JoinOutcome,
    pub unemployment: JoinOutcome,
}

/// Classifier and legend for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricView {
    pub metric: MetricKind,
    pub scale: QuantizeScale<String>,
    pub legend: LegendModel<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricViewReport {
    pub metric: MetricKind,
    pub matched: usize,
    pub unmatched: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub samples: MetricSamples,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<MetricView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub id: String,
    pub id2: Option<i64>,
    pub density: Option<f64>,
    pub unemployment_rate: Option<f64>,
    pub fill: Fill<String>,
    pub summary: FeatureSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapReport {
    pub selected: MetricKind,
    pub switch_label: String,
    pub metrics: Vec<MetricViewReport>,
    pub features: Vec<FeatureReport>,
}

/// Normalize, filter, then join density and unemployment in that order. The
/// unemployment join keys on `id2`, which only the density join provides.
pub fn prepare(config: &AppConfig, inputs: RawInputs) -> PreparedMap {
    let RawInputs { features, density_rows, unemployment_rows } = inputs;

    let (density_records, density_report) = normalize_density(&density_rows, &config.input.density_columns);
    let (unemployment_records, unemployment_report) =
        normalize_unemployment(&unemployment_rows, &config.input.unemployment_columns);

    let total = features.len();
    let mut features = config.filter.apply(&features);
    info!(
        kept = features.len(),
        total,
        subdivision_type = %config.filter.subdivision_type,
        region_code = config.filter.region_code,
        "filtered boundary features"
    );

    let density = join_density(&mut features, &density_records);
    let unemployment = join_unemployment(&mut features, &unemployment_records);

    PreparedMap {
        filtered_out: total - features.len(),
        features,
        density_rows: density_report,
        unemployment_rows: unemployment_report,
        density,
        unemployment,
    }
}

impl PreparedMap {
    pub fn outcome(&self, metric: MetricKind) -> &JoinOutcome {
        match metric {
            MetricKind::Density => &self.density,
            MetricKind::Unemployment => &self.unemployment,
        }
    }

    pub fn samples(&self, metric: MetricKind) -> &MetricSamples {
        &self.outcome(metric).samples
    }

    /// Builds the classifier and legend for `metric`. Run once per metric switch.
    pub fn view(&self, metric: MetricKind, style: &MetricStyle, legend: &LegendConfig) -> Result<MetricView, ClassifyError> {
        let samples = self.samples(metric);
        let scale = QuantizeScale::from_samples(samples.values(), style.buckets.clone())?;
        let [r0, r1] = legend.range;
        let position = SqrtScale::from_samples(samples, (r0, r1)).ok_or(ClassifyError::EmptyDomain)?;
        let legend = LegendModel::build(style.caption(metric), &scale, position);
        Ok(MetricView { metric, scale, legend })
    }

    pub fn fill(&self, feature: &GeoFeature, metric: MetricKind, view: Option<&MetricView>) -> Fill<String> {
        fill_for(feature, metric, view.map(|v| &v.scale))
    }

    /// Full serializable snapshot with features shaded by `selected`.
    pub fn report(&self, config: &AppConfig, selected: MetricKind) -> MapReport {
        let mut metrics = Vec::with_capacity(MetricKind::ALL.len());
        for metric in MetricKind::ALL {
            let outcome = self.outcome(metric);
            let (view, error) = match self.view(metric, config.metrics.style(metric), &config.legend) {
                Ok(view) => (Some(view), None),
                Err(err) => {
                    warn!(%metric, error = %err, "no classifier for metric");
                    (None, Some(err.to_string()))
                }
            };
            metrics.push(MetricViewReport {
                metric,
                matched: outcome.matched,
                unmatched: outcome.unmatched,
                duplicates: outcome.duplicates,
                invalid: outcome.invalid,
                samples: outcome.samples.clone(),
                view,
                error,
            });
        }

        let selected_view = metrics.iter().find(|m| m.metric == selected).and_then(|m| m.view.as_ref());
        let features = self
            .features
            .iter()
            .map(|feature| FeatureReport {
                id: feature.id.clone(),
                id2: feature.id2,
                density: feature.density,
                unemployment_rate: feature.unemployment_rate,
                fill: self.fill(feature, selected, selected_view),
                summary: FeatureSummary::for_feature(feature),
            })
            .collect();

        MapReport { selected, switch_label: selected.switch_label().to_string(), metrics, features }
    }
}
