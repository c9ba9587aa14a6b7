use crate::types::GeoFeature;
use serde::Deserialize;

/// Keeps features of one subdivision type inside one region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeatureFilter {
    pub subdivision_type: String,
    pub region_code: i64,
}

impl Default for FeatureFilter {
    fn default() -> Self {
        FeatureFilter { subdivision_type: "County".into(), region_code: 17 }
    }
}

impl FeatureFilter {
    pub fn new(subdivision_type: impl Into<String>, region_code: i64) -> Self {
        FeatureFilter { subdivision_type: subdivision_type.into(), region_code }
    }

    pub fn matches(&self, feature: &GeoFeature) -> bool {
        feature.subdivision_type == self.subdivision_type && feature.region_code == Some(self.region_code)
    }

    /// Returns the matching features in their original order. The input is left untouched.
    pub fn apply(&self, features: &[GeoFeature]) -> Vec<GeoFeature> {
        features.iter().filter(|f| self.matches(f)).cloned().collect()
    }

    /// In-place variant of [`FeatureFilter::apply`]. Returns how many features were removed.
    pub fn retain_in_place(&self, features: &mut Vec<GeoFeature>) -> usize {
        let before = features.len();
        features.retain(|f| self.matches(f));
        before - features.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Vec<GeoFeature> {
        vec![
            GeoFeature::new("0500000US17001", "County", 17),
            GeoFeature::new("0500000US05001", "County", 5),
            GeoFeature::new("0500000US17003", "County", 17),
            GeoFeature::new("0400000US17", "State", 17),
            GeoFeature::new("0500000US17005", "City", 17),
            GeoFeature::new("0500000US17007", "County", 17),
        ]
    }

    #[test]
    fn keeps_matching_subset_in_order() {
        let features = mixed();
        let kept = FeatureFilter::default().apply(&features);

        let ids: Vec<&str> = kept.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["0500000US17001", "0500000US17003", "0500000US17007"]);
        assert_eq!(features.len(), 6);
    }

    #[test]
    fn in_place_removal_handles_adjacent_misses() {
        let mut features = mixed();
        let removed = FeatureFilter::default().retain_in_place(&mut features);

        assert_eq!(removed, 3);
        assert_eq!(features, FeatureFilter::default().apply(&mixed()));
    }

    #[test]
    fn feature_without_region_never_matches() {
        let mut feature = GeoFeature::new("X", "County", 17);
        feature.region_code = None;
        assert!(!FeatureFilter::default().matches(&feature));
        assert!(FeatureFilter::new("County", 5).apply(&[feature]).is_empty());
    }
}
