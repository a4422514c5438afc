use crate::braille::BrailleCanvas;
use crate::feature::{Feature, FeatureId};
use crate::map::geometry::{draw_marker, draw_ring, fill_rings};
use crate::map::projection::Viewport;
use crate::map::spatial::FeatureGrid;
use crate::selection::camera::focus_point;
use geo::{coord, Intersects, MultiPolygon, Polygon, Rect};
use std::collections::HashMap;

/// Grid cell size in degrees; regions are county-scale or smaller
const GRID_CELL_DEGREES: f64 = 0.25;

/// Everything the map pane needs for one frame, one canvas per color
pub struct MapLayers {
    pub outlines: BrailleCanvas,
    /// Fill of the hovered region
    pub highlight: BrailleCanvas,
    /// Outline of the committed region plus its focus marker
    pub selected: BrailleCanvas,
    /// Sub-features of the committed region
    pub nested: BrailleCanvas,
    pub labels: Vec<(u16, u16, String)>,
}

/// Interaction state layered over the base outlines
#[derive(Clone, Copy, Default)]
pub struct Overlay<'a> {
    pub hovered: Option<&'a FeatureId>,
    pub selected: Option<&'a FeatureId>,
    pub nested: &'a [MultiPolygon<f64>],
}

/// Region dataset plus the indexes needed to draw and hit-test it
pub struct MapRenderer {
    features: Vec<Feature>,
    by_id: HashMap<FeatureId, usize>,
    grid: FeatureGrid,
    bounds: Option<Rect<f64>>,
}

fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

fn project_polygon(polygon: &Polygon<f64>, viewport: &Viewport) -> Vec<Vec<(i32, i32)>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| viewport.project(c.x, c.y)).collect())
        .collect()
}

fn outline(canvas: &mut BrailleCanvas, geometry: &MultiPolygon<f64>, viewport: &Viewport) {
    for polygon in geometry {
        for ring in project_polygon(polygon, viewport) {
            draw_ring(canvas, &ring);
        }
    }
}

/// Braille pixel to terminal cell, shifted right of the anchor
fn label_at(px: i32, py: i32, text: &str) -> Option<(u16, u16, String)> {
    if px < 0 || py < 0 {
        return None;
    }
    let char_x = u16::try_from(px / 2).ok()?.checked_add(2)?;
    let char_y = u16::try_from(py / 4).ok()?;
    Some((char_x, char_y, text.to_string()))
}

impl MapRenderer {
    pub fn new(features: Vec<Feature>) -> Self {
        let grid = FeatureGrid::build(features.iter().map(Feature::bounds), GRID_CELL_DEGREES);
        let by_id = features
            .iter()
            .enumerate()
            .map(|(idx, f)| (f.id.clone(), idx))
            .collect();
        let bounds = features.iter().filter_map(Feature::bounds).reduce(union);
        Self {
            features,
            by_id,
            grid,
            bounds,
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn get(&self, id: &FeatureId) -> Option<&Feature> {
        self.by_id.get(id).map(|&idx| &self.features[idx])
    }

    /// Extent of the whole dataset
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    /// Every region covering the point, edges included, in dataset order
    pub fn hit_test(&self, lon: f64, lat: f64) -> Vec<&Feature> {
        self.grid
            .query_point(lon, lat)
            .iter()
            .map(|&idx| &self.features[idx])
            .filter(|f| f.covers(lon, lat))
            .collect()
    }

    /// Indices of regions whose bounds touch `view`, ascending
    fn visible(&self, view: Rect<f64>) -> Vec<usize> {
        let cells = (view.width() / GRID_CELL_DEGREES) * (view.height() / GRID_CELL_DEGREES);
        if cells > self.features.len() as f64 {
            // Zoomed far out: a linear pass is cheaper than walking cells
            return self
                .features
                .iter()
                .enumerate()
                .filter(|(_, f)| f.bounds().is_some_and(|b| b.intersects(&view)))
                .map(|(idx, _)| idx)
                .collect();
        }
        let mut found = Vec::new();
        self.grid.query_into(view, &mut found);
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Render all layers for a `width` x `height` character pane
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport, overlay: Overlay<'_>) -> MapLayers {
        let mut layers = MapLayers {
            outlines: BrailleCanvas::new(width, height),
            highlight: BrailleCanvas::new(width, height),
            selected: BrailleCanvas::new(width, height),
            nested: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        };

        for idx in self.visible(viewport.visible_bounds()) {
            outline(&mut layers.outlines, &self.features[idx].geometry, viewport);
        }

        if let Some(hovered) = overlay.hovered.and_then(|id| self.get(id)) {
            for polygon in &hovered.geometry {
                fill_rings(&mut layers.highlight, &project_polygon(polygon, viewport));
            }
        }

        for geometry in overlay.nested {
            outline(&mut layers.nested, geometry, viewport);
        }

        if let Some(selected) = overlay.selected.and_then(|id| self.get(id)) {
            outline(&mut layers.selected, &selected.geometry, viewport);
            if let Some(center) = focus_point(selected) {
                let (px, py) = viewport.project(center.x, center.y);
                draw_marker(&mut layers.selected, px, py, 2);
                layers.labels.extend(label_at(px, py, &selected.name));
            }
        }

        // Hover label only when it names something other than the selection
        if let Some(hovered) = overlay.hovered.filter(|&id| Some(id) != overlay.selected).and_then(|id| self.get(id)) {
            if let Some(center) = focus_point(hovered) {
                let (px, py) = viewport.project(center.x, center.y);
                if viewport.is_visible(px, py) {
                    layers.labels.extend(label_at(px, py, &hovered.name));
                }
            }
        }

        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::square;
    use crate::selection::{resolve, AreaCache};

    fn renderer() -> MapRenderer {
        MapRenderer::new(vec![
            square("columbia_valley", -121.0, 45.5, 3.0),
            square("yakima_valley", -120.5, 46.0, 1.0),
            square("red_mountain", -119.5, 46.2, 0.1),
        ])
    }

    #[test]
    fn test_hit_test_dataset_order() {
        let map = renderer();
        let ids: Vec<&str> = map.hit_test(-119.45, 46.25).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["columbia_valley", "red_mountain"]);

        let ids: Vec<&str> = map.hit_test(-120.0, 46.5).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["columbia_valley", "yakima_valley"]);

        assert!(map.hit_test(0.0, 0.0).is_empty());
    }

    #[test]
    fn test_hit_test_includes_edges() {
        let map = MapRenderer::new(vec![square("big", 0.0, 0.0, 2.0), square("small", 0.0, 0.0, 1.0)]);
        let ids: Vec<&str> = map.hit_test(0.5, 1.0).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["big", "small"]);

        let mut areas = AreaCache::new();
        let picked = resolve(map.hit_test(0.5, 1.0), &mut areas).map(|f| f.id.as_str());
        assert_eq!(picked, Some("small"));
    }

    #[test]
    fn test_bounds_and_lookup() {
        let map = renderer();
        let bounds = map.bounds().unwrap();
        assert_eq!(bounds.min(), coord! { x: -121.0, y: 45.5 });
        assert_eq!(bounds.max(), coord! { x: -118.0, y: 48.5 });
        assert_eq!(map.get(&FeatureId::from("red_mountain")).unwrap().name, "red_mountain");
        assert!(map.get(&FeatureId::from("walla_walla")).is_none());
        assert!(MapRenderer::new(Vec::new()).bounds().is_none());
    }

    #[test]
    fn test_render_layers() {
        let map = renderer();
        let (w, h) = (60, 20);
        let mut viewport = Viewport::world(w * 2, h * 4);
        viewport.camera = viewport.fit_camera(map.bounds().unwrap(), 0.0);

        let idle = map.render(w, h, &viewport, Overlay::default());
        assert!(!idle.outlines.is_blank());
        assert!(idle.highlight.is_blank());
        assert!(idle.labels.is_empty());

        let hovered = FeatureId::from("yakima_valley");
        let selected = FeatureId::from("columbia_valley");
        let nested = vec![square("block", -119.0, 47.0, 0.2).geometry];
        let layers = map.render(
            w,
            h,
            &viewport,
            Overlay {
                hovered: Some(&hovered),
                selected: Some(&selected),
                nested: &nested,
            },
        );
        assert!(!layers.highlight.is_blank());
        assert!(!layers.selected.is_blank());
        assert!(!layers.nested.is_blank());
        let names: Vec<&str> = layers.labels.iter().map(|(_, _, name)| name.as_str()).collect();
        assert_eq!(names, ["columbia_valley", "yakima_valley"]);
    }
}
