use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("cannot build a scale from an empty sample list")]
    EmptyDomain,
    #[error("none of the {count} samples is positive, log domain is undefined")]
    NonPositiveDomain { count: usize },
    #[error("a scale needs at least one bucket")]
    NoBuckets,
    #[error("value {value} is outside the log domain")]
    OutOfDomain { value: f64 },
    #[error("bucket does not belong to this scale")]
    UnknownBucket,
}

/// The three independently sourced inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Boundaries,
    Density,
    Unemployment,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::Boundaries => "boundaries",
            DatasetKind::Density => "density",
            DatasetKind::Unemployment => "unemployment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("failed to load {dataset} dataset")]
pub struct LoadError {
    pub dataset: DatasetKind,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}
