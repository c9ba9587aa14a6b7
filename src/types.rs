use geojson::{Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One parsed row of a delimited table: column name -> raw cell text.
pub type RawRow = HashMap<String, String>;

/// The metric currently shaded on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Density,
    Unemployment,
}

impl MetricKind {
    pub const ALL: [MetricKind; 2] = [MetricKind::Density, MetricKind::Unemployment];

    pub fn toggle(self) -> Self {
        match self {
            MetricKind::Density => MetricKind::Unemployment,
            MetricKind::Unemployment => MetricKind::Density,
        }
    }

    pub fn default_caption(self) -> &'static str {
        match self {
            MetricKind::Density => "Population Density by Square Mile",
            MetricKind::Unemployment => "Unemployment Rate",
        }
    }

    /// Label of the control that switches away from this metric.
    pub fn switch_label(self) -> &'static str {
        match self {
            MetricKind::Density => "Show Unemployment",
            MetricKind::Unemployment => "Show Population Density",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Density => write!(f, "density"),
            MetricKind::Unemployment => write!(f, "unemployment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub id: String,
    pub subdivision_type: String,
    pub region_code: Option<i64>,
    pub name: Option<String>,
    // Attached by the joiner; `None` means no data, never zero.
    pub density: Option<f64>,
    pub unemployment_rate: Option<f64>,
    /// Secondary identifier copied from the density table, bridges to unemployment rows.
    pub id2: Option<i64>,
    pub properties: JsonObject,
    pub geometry: Option<Geometry>,
}

impl GeoFeature {
    pub fn new(id: impl Into<String>, subdivision_type: impl Into<String>, region_code: i64) -> Self {
        GeoFeature {
            id: id.into(),
            subdivision_type: subdivision_type.into(),
            region_code: Some(region_code),
            name: None,
            density: None,
            unemployment_rate: None,
            id2: None,
            properties: JsonObject::new(),
            geometry: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn metric(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Density => self.density,
            MetricKind::Unemployment => self.unemployment_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityRecord {
    pub id: String,
    pub id2: Option<i64>,
    /// People per square mile; `NaN` when the cell was not numeric.
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnemploymentRecord {
    /// Matches a feature's `id2`.
    pub id: Option<i64>,
    /// Fraction in [0, 1]; `NaN` when the cell was not numeric.
    pub rate: f64,
}

/// Values attached for one metric, used to derive scale domains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSamples {
    pub metric: MetricKind,
    values: Vec<f64>,
}

impl MetricSamples {
    pub fn new(metric: MetricKind, values: Vec<f64>) -> Self {
        MetricSamples { metric, values: values.into_iter().filter(|v| v.is_finite()).collect() }
    }

    /// Gathers every attached value for `metric`, in feature order.
    pub fn collect(metric: MetricKind, features: &[GeoFeature]) -> Self {
        Self::new(metric, features.iter().filter_map(|f| f.metric(metric)).collect())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(min, max)` over all samples.
    pub fn extent(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
