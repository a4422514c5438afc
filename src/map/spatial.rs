use geo::Rect;
use std::collections::HashMap;

/// Spatial index for region features using conservative approximation.
/// Each feature's bounding box is indexed into every cell it overlaps,
/// guaranteeing no false negatives while allowing false positives
/// (eliminated downstream by exact containment tests).
///
/// Indices are inserted in feature order, so every cell lists its
/// candidates in dataset order.
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from feature bounding boxes; `None` (empty geometry) is
    /// skipped but still consumes its index
    pub fn build(bounds: impl Iterator<Item = Option<Rect<f64>>>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, rect) in bounds.enumerate() {
            let Some(rect) = rect else {
                continue;
            };
            let min_cell = grid.to_cell(rect.min().x, rect.min().y);
            let max_cell = grid.to_cell(rect.max().x, rect.max().y);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidates whose bounding box may contain the point, ascending
    pub fn query_point(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append feature indices for the given bounds into results vec.
    /// May contain duplicates; caller should dedup after all queries.
    pub fn query_into(&self, bounds: Rect<f64>, results: &mut Vec<usize>) {
        let min_cell = self.to_cell(bounds.min().x, bounds.min().y);
        let max_cell = self.to_cell(bounds.max().x, bounds.max().y);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn rect(min: (f64, f64), max: (f64, f64)) -> Option<Rect<f64>> {
        Some(Rect::new(coord! { x: min.0, y: min.1 }, coord! { x: max.0, y: max.1 }))
    }

    #[test]
    fn test_point_query_in_order() {
        let grid = FeatureGrid::build(
            [rect((-121.0, 45.0), (-118.0, 48.0)), None, rect((-119.6, 46.2), (-119.4, 46.4))].into_iter(),
            0.25,
        );
        assert_eq!(grid.query_point(-119.5, 46.3), &[0, 2]);
        assert_eq!(grid.query_point(-120.5, 45.5), &[0]);
        assert!(grid.query_point(10.0, 10.0).is_empty());
    }

    #[test]
    fn test_bounds_query() {
        let grid = FeatureGrid::build([rect((0.0, 0.0), (0.1, 0.1)), rect((5.0, 5.0), (5.1, 5.1))].into_iter(), 1.0);
        let mut found = Vec::new();
        grid.query_into(Rect::new(coord! { x: -1.0, y: -1.0 }, coord! { x: 1.0, y: 1.0 }), &mut found);
        assert_eq!(found, vec![0]);
    }
}
