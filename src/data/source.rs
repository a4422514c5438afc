use crate::data::records::{PanelStats, Suitability};
use crate::data::{load_polygons, read_json};
use crate::feature::FeatureId;
use crate::fetch::DataSource;
use anyhow::{anyhow, Result};
use geo::MultiPolygon;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

type Index<T> = Arc<HashMap<String, T>>;

/// Auxiliary records read from local JSON files.
///
/// The stats and suitability collections are each read and indexed once,
/// on first request; a failed read is retried on the next request.
pub struct FsSource {
    stats_path: PathBuf,
    suitability_path: PathBuf,
    nested_dir: PathBuf,
    stats: Mutex<Option<Index<PanelStats>>>,
    suitability: Mutex<Option<Index<Suitability>>>,
}

impl FsSource {
    pub fn new(stats_path: PathBuf, suitability_path: PathBuf, nested_dir: PathBuf) -> Self {
        Self {
            stats_path,
            suitability_path,
            nested_dir,
            stats: Mutex::new(None),
            suitability: Mutex::new(None),
        }
    }

    fn stats_index(&self) -> Result<Index<PanelStats>> {
        cached_index(&self.stats, || {
            let rows: Vec<PanelStats> = read_json(&self.stats_path)?;
            debug!(path = %self.stats_path.display(), count = rows.len(), "stats index ready");
            Ok(rows.into_iter().map(|row| (row.ava_id.clone(), row)).collect())
        })
    }

    fn suitability_index(&self) -> Result<Index<Suitability>> {
        cached_index(&self.suitability, || read_json(&self.suitability_path))
    }

    fn nested_path(&self, id: &FeatureId) -> Option<PathBuf> {
        let name = id.as_str();
        let safe = !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..";
        safe.then(|| self.nested_dir.join(format!("{name}.geojson")))
    }
}

fn cached_index<T>(
    slot: &Mutex<Option<Index<T>>>,
    build: impl FnOnce() -> Result<HashMap<String, T>>,
) -> Result<Index<T>> {
    let mut guard = slot.lock().map_err(|_| anyhow!("index lock poisoned"))?;
    if let Some(index) = guard.as_ref() {
        return Ok(Arc::clone(index));
    }
    let index = Arc::new(build()?);
    *guard = Some(Arc::clone(&index));
    Ok(index)
}

impl DataSource for FsSource {
    fn panel_stats(&self, id: &FeatureId) -> Result<Option<PanelStats>> {
        Ok(self.stats_index()?.get(id.as_str()).cloned())
    }

    fn suitability(&self, id: &FeatureId) -> Result<Option<Suitability>> {
        Ok(self.suitability_index()?.get(id.as_str()).cloned())
    }

    fn nested_features(&self, id: &FeatureId) -> Result<Vec<MultiPolygon<f64>>> {
        let Some(path) = self.nested_path(id) else {
            debug!(%id, "identity not usable as a file name");
            return Ok(Vec::new());
        };
        if !path.exists() {
            debug!(%id, path = %path.display(), "no nested features");
            return Ok(Vec::new());
        }
        let polygons = load_polygons(&path)?;
        info!(%id, count = polygons.len(), "loaded nested features");
        Ok(polygons)
    }
}
