//! Attaches metric records onto boundary features.
//!
//! Boundary features are the authoritative universe: a record whose key matches
//! no feature is dropped and counted, never an error. Each feature takes at most
//! one value per metric, the first matching record in table order.

use crate::types::{DensityRecord, GeoFeature, MetricKind, MetricSamples, UnemploymentRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, info};

/// A typed row that carries one metric value.
pub trait MetricRecord {
    const METRIC: MetricKind;

    fn value(&self) -> f64;

    /// Writes this record's value onto its matched feature.
    fn attach(&self, feature: &mut GeoFeature);

    /// Copies key fields onto a matched feature, whether or not the value is usable.
    fn bridge(&self, _feature: &mut GeoFeature) {}
}

impl MetricRecord for DensityRecord {
    const METRIC: MetricKind = MetricKind::Density;

    fn value(&self) -> f64 {
        self.density
    }

    fn attach(&self, feature: &mut GeoFeature) {
        feature.density = Some(self.density);
    }

    // The unemployment join keys on id2, so a bad density cell must not lose it.
    fn bridge(&self, feature: &mut GeoFeature) {
        if feature.id2.is_none() {
            feature.id2 = self.id2;
        }
    }
}

impl MetricRecord for UnemploymentRecord {
    const METRIC: MetricKind = MetricKind::Unemployment;

    fn value(&self) -> f64 {
        self.rate
    }

    fn attach(&self, feature: &mut GeoFeature) {
        feature.unemployment_rate = Some(self.rate);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinOutcome {
    pub samples: MetricSamples,
    pub matched: usize,
    pub unmatched: usize,
    /// Records whose feature already had a value for this metric.
    pub duplicates: usize,
    /// Records with a NaN value or no usable key.
    pub invalid: usize,
}

/// Canonical string key: trimmed, and absent when blank.
pub fn string_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn join_metric<R, K, FK, RK>(
    features: &mut [GeoFeature],
    records: &[R],
    feature_key: FK,
    record_key: RK,
) -> JoinOutcome
where
    R: MetricRecord,
    K: Eq + Hash,
    FK: Fn(&GeoFeature) -> Option<K>,
    RK: Fn(&R) -> Option<K>,
{
    // First feature wins when two share a key.
    let mut index: HashMap<K, usize> = HashMap::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        if let Some(key) = feature_key(feature) {
            index.entry(key).or_insert(i);
        }
    }

    let (mut matched, mut unmatched, mut duplicates, mut invalid) = (0, 0, 0, 0);

    for record in records {
        let Some(key) = record_key(record) else {
            invalid += 1;
            continue;
        };
        let Some(&i) = index.get(&key) else {
            unmatched += 1;
            continue;
        };
        let feature = &mut features[i];
        record.bridge(feature);
        if !record.value().is_finite() {
            invalid += 1;
        } else if feature.metric(R::METRIC).is_some() {
            duplicates += 1;
        } else {
            record.attach(feature);
            matched += 1;
        }
    }

    let samples = MetricSamples::collect(R::METRIC, features);
    info!(
        metric = %R::METRIC,
        matched,
        unmatched,
        duplicates,
        invalid,
        samples = samples.len(),
        "joined metric onto features"
    );
    if unmatched > 0 {
        debug!(metric = %R::METRIC, unmatched, "records without a matching feature were dropped");
    }

    JoinOutcome { samples, matched, unmatched, duplicates, invalid }
}

/// Feature identifier == density record `id`, compared as trimmed strings.
pub fn join_density(features: &mut [GeoFeature], records: &[DensityRecord]) -> JoinOutcome {
    join_metric(features, records, |f| string_key(&f.id), |r| string_key(&r.id))
}

/// Feature `id2` (set by the density join) == unemployment record `id`.
pub fn join_unemployment(features: &mut [GeoFeature], records: &[UnemploymentRecord]) -> JoinOutcome {
    join_metric(features, records, |f| f.id2, |r| r.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn density(id: &str, id2: i64, value: f64) -> DensityRecord {
        DensityRecord { id: id.into(), id2: Some(id2), density: value }
    }

    fn counties() -> Vec<GeoFeature> {
        vec![
            GeoFeature::new("0500000US17001", "County", 17),
            GeoFeature::new("0500000US17003", "County", 17),
            GeoFeature::new("0500000US17005", "County", 17),
        ]
    }

    #[test]
    fn filter_then_join_scenario() {
        let features = vec![GeoFeature::new("A", "County", 17), GeoFeature::new("B", "County", 5)];
        let mut kept = crate::filter::FeatureFilter::default().apply(&features);
        let outcome = join_density(&mut kept, &[density("A", 1, 100.0)]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "A");
        assert_eq!(kept[0].density, Some(100.0));
        assert_eq!(kept[0].id2, Some(1));
        assert_eq!(outcome.samples.values(), &[100.0]);
    }

    #[test]
    fn first_record_wins_for_a_feature() {
        let mut features = counties();
        let records = [density("0500000US17001", 17001, 76.2), density("0500000US17001", 17001, 999.0)];
        let outcome = join_density(&mut features, &records);

        assert_eq!(features[0].density, Some(76.2));
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.samples.len(), 1);
    }

    #[test]
    fn unmatched_records_leave_no_trace() {
        let mut features = counties();
        let outcome = join_density(&mut features, &[density("0500000US06001", 6001, 50.0)]);

        assert_eq!(outcome.unmatched, 1);
        assert!(outcome.samples.is_empty());
        assert!(features.iter().all(|f| f.density.is_none() && f.id2.is_none()));
    }

    #[test]
    fn nan_values_and_blank_keys_are_excluded() {
        let mut features = counties();
        let records = [
            density("0500000US17001", 17001, f64::NAN),
            density("   ", 0, 12.0),
            density(" 0500000US17003 ", 17003, 12.0),
        ];
        let outcome = join_density(&mut features, &records);

        assert_eq!(outcome.invalid, 2);
        assert_eq!(features[0].density, None);
        assert_eq!(features[1].density, Some(12.0));
        assert_eq!(outcome.samples.values(), &[12.0]);
    }

    #[test]
    fn nan_density_still_bridges_unemployment() {
        let mut features = counties();
        let outcome = join_density(&mut features, &[density("0500000US17005", 17005, f64::NAN)]);

        assert_eq!(outcome.invalid, 1);
        assert_eq!(features[2].density, None);
        assert_eq!(features[2].id2, Some(17005));
        assert!(outcome.samples.is_empty());

        let rates = join_unemployment(&mut features, &[UnemploymentRecord { id: Some(17005), rate: 0.09 }]);
        assert_eq!(features[2].unemployment_rate, Some(0.09));
        assert_eq!((rates.matched, rates.unmatched), (1, 0));
    }

    #[test]
    fn later_record_does_not_replace_bridged_id2() {
        let mut features = counties();
        let records = [density("0500000US17001", 17001, f64::NAN), density("0500000US17001", 99999, 76.2)];
        join_density(&mut features, &records);

        assert_eq!(features[0].id2, Some(17001));
        assert_eq!(features[0].density, Some(76.2));
    }

    #[test]
    fn zero_is_attached_not_treated_as_missing() {
        let mut features = counties();
        join_density(&mut features, &[density("0500000US17005", 17005, 0.0)]);
        assert_eq!(features[2].density, Some(0.0));
        assert_eq!(features[0].density, None);
    }

    #[test]
    fn rerunning_the_join_is_idempotent() {
        let mut features = counties();
        let records = [density("0500000US17001", 17001, 76.2), density("0500000US17005", 17005, 20.5)];
        let first = join_density(&mut features, &records);
        let snapshot = features.clone();
        let second = join_density(&mut features, &records);

        assert_eq!(features, snapshot);
        assert_eq!(first.samples, second.samples);
        assert_eq!(second.matched, 0);
        assert_eq!(second.duplicates, 2);
    }

    #[test]
    fn unemployment_bridges_through_id2() {
        let mut features = counties();
        join_density(&mut features, &[density("0500000US17003", 17003, 40.0)]);
        let records = [
            UnemploymentRecord { id: Some(17003), rate: 0.081 },
            UnemploymentRecord { id: Some(17001), rate: 0.05 },
            UnemploymentRecord { id: None, rate: 0.07 },
        ];
        let outcome = join_unemployment(&mut features, &records);

        assert_eq!(features[1].unemployment_rate, Some(0.081));
        assert_eq!(features[0].unemployment_rate, None);
        assert_eq!((outcome.matched, outcome.unmatched, outcome.invalid), (1, 1, 1));
        assert_eq!(outcome.samples.values(), &[0.081]);
    }
}
