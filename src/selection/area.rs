use crate::feature::{Feature, FeatureId};
use geo::{ChamberlainDuquetteArea, MultiPolygon};
use rayon::prelude::*;
use std::collections::HashMap;

/// Area on the sphere in square meters.
///
/// Chamberlain-Duquette over the WGS84 equatorial radius, the same estimate
/// web map tooling uses. A planar shoelace over raw degrees would shrink
/// high-latitude regions by cos(lat) and skew every tie-break.
pub fn geodesic_area(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.chamberlain_duquette_unsigned_area()
}

/// Memoized feature areas keyed by identity.
///
/// Values are write-once: a later feature reusing an identity gets the
/// first geometry's area back.
#[derive(Default)]
pub struct AreaCache {
    areas: HashMap<FeatureId, f64>,
}

impl AreaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached area for `feature`, computing and storing it on first sight
    pub fn area_of(&mut self, feature: &Feature) -> f64 {
        *self
            .areas
            .entry(feature.id.clone())
            .or_insert_with(|| geodesic_area(&feature.geometry))
    }

    pub fn get(&self, id: &FeatureId) -> Option<f64> {
        self.areas.get(id).copied()
    }

    /// Precompute every missing area in parallel
    pub fn warm(&mut self, features: &[Feature]) {
        let computed: Vec<(FeatureId, f64)> = features
            .par_iter()
            .filter(|f| !self.areas.contains_key(&f.id))
            .map(|f| (f.id.clone(), geodesic_area(&f.geometry)))
            .collect();

        for (id, area) in computed {
            self.areas.entry(id).or_insert(area);
        }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl FromIterator<(FeatureId, f64)> for AreaCache {
    fn from_iter<I: IntoIterator<Item = (FeatureId, f64)>>(iter: I) -> Self {
        let mut areas = HashMap::new();
        for (id, area) in iter {
            areas.entry(id).or_insert(area);
        }
        Self { areas }
    }
}
