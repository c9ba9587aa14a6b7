//! Joins county boundaries with population density and unemployment tables,
//! then classifies each metric into log-quantized buckets with a matching legend.

pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod join;
pub mod legend;
pub mod normalize;
pub mod processing;
pub mod render;
pub mod scale;
pub mod types;

pub use error::{ClassifyError, DatasetKind, LoadError};
pub use processing::{prepare, MetricView, PreparedMap};
pub use scale::{BucketRange, QuantizeScale};
pub use types::{GeoFeature, MetricKind};
