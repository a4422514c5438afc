pub mod records;
pub mod source;

use crate::feature::{Feature, FeatureId};
use anyhow::{Context, Result};
use geo::MultiPolygon;
use geojson::feature::Id;
use geojson::{GeoJson, JsonValue};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub use source::FsSource;

/// Property holding the promoted identity; the GeoJSON `id` is the fallback
const ID_PROPERTY: &str = "ava_id";

/// Name properties, most specific first
const NAME_PROPERTIES: [&str; 2] = ["name", "title"];

/// Every property name the creation date has been published under, in
/// priority order
const CREATED_PROPERTIES: [&str; 5] = ["created", "established", "established_date", "date", "created_date"];

const DEFAULT_NAME: &str = "AVA";

/// Read a JSON file into any deserializable type
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    simd_json::serde::from_slice(&mut bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Load the region dataset
pub fn load_dataset(path: &Path) -> Result<Vec<Feature>> {
    let geojson: GeoJson = read_json(path)?;
    let features = ingest(geojson);
    info!(path = %path.display(), count = features.len(), "loaded dataset");
    Ok(features)
}

/// Load every polygon in a file, ignoring identities and properties
pub fn load_polygons(path: &Path) -> Result<Vec<MultiPolygon<f64>>> {
    let geojson: GeoJson = read_json(path)?;
    let mut polygons = Vec::new();
    for_each_geometry(geojson, |_, geometry| {
        if let Some(mp) = to_multipolygon(geometry) {
            polygons.push(mp);
        }
    });
    Ok(polygons)
}

/// Normalize raw GeoJSON into features: identity, name and creation date
/// resolved from their synonyms, non-polygons and duplicate ids dropped
pub fn ingest(geojson: GeoJson) -> Vec<Feature> {
    let mut features = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped = 0usize;

    for_each_geometry(geojson, |source, geometry| {
        let Some(source) = source else {
            skipped += 1;
            return;
        };
        let Some(id) = feature_id(source) else {
            skipped += 1;
            return;
        };
        let Some(geometry) = to_multipolygon(geometry) else {
            warn!(%id, "skipping feature without polygon geometry");
            skipped += 1;
            return;
        };
        if !seen.insert(id.clone()) {
            warn!(%id, "skipping duplicate feature id");
            skipped += 1;
            return;
        }

        let name = first_string(source, &NAME_PROPERTIES).unwrap_or_else(|| DEFAULT_NAME.to_string());
        let mut feature = Feature::new(id, name, geometry);
        feature.created = first_string(source, &CREATED_PROPERTIES);
        features.push(feature);
    });

    if skipped > 0 {
        warn!(skipped, "dropped unusable features during ingestion");
    }
    features
}

/// Walk geometries along with the feature that owns them (if any)
fn for_each_geometry<F>(geojson: GeoJson, mut visit: F)
where
    F: FnMut(Option<&geojson::Feature>, geojson::Geometry),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for mut feature in fc.features {
                if let Some(geometry) = feature.geometry.take() {
                    visit(Some(&feature), geometry);
                }
            }
        }
        GeoJson::Feature(mut feature) => {
            if let Some(geometry) = feature.geometry.take() {
                visit(Some(&feature), geometry);
            }
        }
        GeoJson::Geometry(geometry) => visit(None, geometry),
    }
}

fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let mp = match geo::Geometry::<f64>::try_from(geometry.value).ok()? {
        geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        geo::Geometry::MultiPolygon(mp) => mp,
        _ => return None,
    };
    (!mp.0.is_empty()).then_some(mp)
}

fn feature_id(feature: &geojson::Feature) -> Option<FeatureId> {
    let promoted = feature.property(ID_PROPERTY).and_then(scalar_string);
    let fallback = || match &feature.id {
        Some(Id::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Id::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    promoted.or_else(fallback).map(FeatureId::from)
}

fn first_string(feature: &geojson::Feature, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| feature.property(key).and_then(scalar_string))
}

fn scalar_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> GeoJson {
        raw.parse().unwrap()
    }

    const SQUARE: &str = r#"{"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;

    #[test]
    fn test_identity_prefers_promoted_property() {
        let raw = format!(
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "id": 7, "properties": {{"ava_id": "horse_heaven_hills", "name": "Horse Heaven Hills"}}, "geometry": {SQUARE}}},
                {{"type": "Feature", "id": 8, "properties": {{"title": "Numbered"}}, "geometry": {SQUARE}}},
                {{"type": "Feature", "properties": {{"name": "Anonymous"}}, "geometry": {SQUARE}}}
            ]}}"#
        );
        let features = ingest(parse(&raw));
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["horse_heaven_hills", "8"]);
        assert_eq!(features[1].name, "Numbered");
    }

    #[test]
    fn test_created_synonyms_in_order() {
        let raw = format!(
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{"ava_id": "a", "date": "2001-01-01", "established": "1984-06-07"}}, "geometry": {SQUARE}}},
                {{"type": "Feature", "properties": {{"ava_id": "b", "created_date": "2020-05-05"}}, "geometry": {SQUARE}}},
                {{"type": "Feature", "properties": {{"ava_id": "c", "created": ""}}, "geometry": {SQUARE}}}
            ]}}"#
        );
        let features = ingest(parse(&raw));
        assert_eq!(features[0].created.as_deref(), Some("1984-06-07"));
        assert_eq!(features[1].created.as_deref(), Some("2020-05-05"));
        assert_eq!(features[2].created, None);
        assert_eq!(features[2].name, DEFAULT_NAME);
    }

    #[test]
    fn test_drops_points_and_duplicates() {
        let raw = format!(
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{"ava_id": "a"}}, "geometry": {SQUARE}}},
                {{"type": "Feature", "properties": {{"ava_id": "a"}}, "geometry": {SQUARE}}},
                {{"type": "Feature", "properties": {{"ava_id": "p"}}, "geometry": {{"type": "Point", "coordinates": [0, 0]}}}},
                {{"type": "Feature", "properties": {{"ava_id": "m"}}, "geometry": {{"type": "MultiPolygon", "coordinates": [[[[2,2],[3,2],[3,3],[2,2]]]]}}}}
            ]}}"#
        );
        let features = ingest(parse(&raw));
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["a", "m"]);
    }
}
