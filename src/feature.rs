use geo::{BoundingRect, Intersects, MultiPolygon, Point, Rect};
use std::fmt;
use std::sync::Arc;

/// Stable identity of a feature within one loaded dataset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(Arc<str>);

impl FeatureId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One region of interest: identity, display name, canonical creation date
/// and lon/lat geometry.
#[derive(Clone, Debug)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    /// Raw creation date, already normalized from whichever property held it
    pub created: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl Feature {
    pub fn new(id: impl Into<FeatureId>, name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created: None,
            geometry,
        }
    }

    pub fn with_created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Point-in-polygon test in lon/lat space; a point on an edge counts
    pub fn covers(&self, lon: f64, lat: f64) -> bool {
        self.geometry.intersects(&Point::new(lon, lat))
    }
}

#[cfg(test)]
pub(crate) fn square(id: &str, min_lon: f64, min_lat: f64, size: f64) -> Feature {
    use geo::coord;

    let rect = Rect::new(
        coord! { x: min_lon, y: min_lat },
        coord! { x: min_lon + size, y: min_lat + size },
    );
    Feature::new(id, id, MultiPolygon::new(vec![rect.to_polygon()]))
}
