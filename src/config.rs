use crate::filter::FeatureFilter;
use crate::types::MetricKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub filter: FeatureFilter,
    pub metrics: MetricsConfig,
    pub legend: LegendConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub boundaries: PathBuf,
    pub density_csv: PathBuf,
    pub unemployment_tsv: PathBuf,
    pub boundary_fields: BoundaryFields,
    pub density_columns: DensityColumns,
    pub unemployment_columns: UnemploymentColumns,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            boundaries: PathBuf::from("counties_data.json"),
            density_csv: PathBuf::from("pop-dense.csv"),
            unemployment_tsv: PathBuf::from("unemployment.tsv"),
            boundary_fields: BoundaryFields::default(),
            density_columns: DensityColumns::default(),
            unemployment_columns: UnemploymentColumns::default(),
        }
    }
}

/// GeoJSON property names read from each boundary feature.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoundaryFields {
    pub id: String,
    pub subdivision_type: String,
    pub region_code: String,
    pub name: String,
}

impl Default for BoundaryFields {
    fn default() -> Self {
        BoundaryFields {
            id: "GEO_ID".into(),
            subdivision_type: "LSAD".into(),
            region_code: "STATE".into(),
            name: "NAME".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DensityColumns {
    pub density: String,
    pub id: String,
    pub id2: String,
}

impl Default for DensityColumns {
    fn default() -> Self {
        DensityColumns {
            density: "Density per square mile of land area".into(),
            id: "GCT_STUB.target-geo-id".into(),
            id2: "GCT_STUB.target-geo-id2".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UnemploymentColumns {
    pub id: String,
    pub rate: String,
}

impl Default for UnemploymentColumns {
    fn default() -> Self {
        UnemploymentColumns { id: "id".into(), rate: "rate".into() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    pub density: MetricStyle,
    pub unemployment: MetricStyle,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            density: MetricStyle::new(&["#edf8fb", "#b2e2e2", "#66c2a4", "#2ca25f", "#006d2c"]),
            unemployment: MetricStyle::new(&["#fef0d9", "#fdcc8a", "#fc8d59", "#e34a33", "#b30000"]),
        }
    }
}

impl MetricsConfig {
    pub fn style(&self, metric: MetricKind) -> &MetricStyle {
        match metric {
            MetricKind::Density => &self.density,
            MetricKind::Unemployment => &self.unemployment,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricStyle {
    /// Ordered bucket labels, lowest values first. Colors by convention.
    pub buckets: Vec<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl MetricStyle {
    fn new(buckets: &[&str]) -> Self {
        MetricStyle { buckets: buckets.iter().map(|b| b.to_string()).collect(), caption: None }
    }

    pub fn caption(&self, metric: MetricKind) -> String {
        self.caption.clone().unwrap_or_else(|| metric.default_caption().to_string())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LegendConfig {
    /// Pixel output range of the legend position scale.
    pub range: [f64; 2],
}

impl Default for LegendConfig {
    fn default() -> Self {
        LegendConfig { range: [400.0, 800.0] }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
