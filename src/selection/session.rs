use crate::data::records::{PanelStats, Suitability};
use crate::feature::{Feature, FeatureId};
use crate::selection::area::AreaCache;
use crate::selection::camera::{self, CameraMove, CameraTarget, RESET_DURATION};
use crate::selection::panel::{self, PanelView, Section, NO_CLIMATE, NO_SUITABILITY};
use crate::selection::units::UnitMode;
use anyhow::Result;
use geo::MultiPolygon;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Auxiliary data the session wants fetched for an identity
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoadRequest {
    Stats(FeatureId),
    Suitability(FeatureId),
    Nested(FeatureId),
}

impl LoadRequest {
    pub fn id(&self) -> &FeatureId {
        match self {
            LoadRequest::Stats(id) | LoadRequest::Suitability(id) | LoadRequest::Nested(id) => id,
        }
    }
}

/// Completed fetch. `Ok(None)` means the source has no record for the id.
#[derive(Debug)]
pub enum LoadResponse {
    Stats { id: FeatureId, result: Result<Option<PanelStats>> },
    Suitability { id: FeatureId, result: Result<Option<Suitability>> },
    Nested { id: FeatureId, result: Result<Vec<MultiPolygon<f64>>> },
}

impl LoadResponse {
    pub fn id(&self) -> &FeatureId {
        match self {
            LoadResponse::Stats { id, .. } | LoadResponse::Suitability { id, .. } | LoadResponse::Nested { id, .. } => id,
        }
    }
}

/// What the host must do after a session call, in order
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    MoveCamera(CameraMove),
    Fetch(LoadRequest),
    /// Panel content changed without new data arriving
    RenderPanel,
}

enum Slot<T> {
    Loading,
    Ready(Arc<T>),
    Missing,
}

impl<T> Slot<T> {
    fn cached(cache: &HashMap<FeatureId, Option<Arc<T>>>, id: &FeatureId) -> Self {
        match cache.get(id) {
            Some(Some(record)) => Slot::Ready(Arc::clone(record)),
            Some(None) => Slot::Missing,
            None => Slot::Loading,
        }
    }

    fn section<V>(&self, missing: &'static str, build: impl FnOnce(&T) -> V) -> Section<V> {
        match self {
            Slot::Loading => Section::Loading,
            Slot::Missing => Section::Missing(missing),
            Slot::Ready(record) => Section::Ready(build(record.as_ref())),
        }
    }
}

impl<T> From<Option<Arc<T>>> for Slot<T> {
    fn from(record: Option<Arc<T>>) -> Self {
        record.map_or(Slot::Missing, Slot::Ready)
    }
}

struct OpenSelection {
    id: FeatureId,
    name: String,
    stats: Slot<PanelStats>,
    suitability: Slot<Suitability>,
    /// `None` while the nested fetch is in flight
    nested: Option<Vec<MultiPolygon<f64>>>,
}

/// The committed selection: frozen camera target, open panel, cached
/// per-identity records and the presentation unit system.
#[derive(Default)]
pub struct SelectionSession {
    unit_mode: UnitMode,
    open: Option<OpenSelection>,
    camera: Option<CameraTarget>,
    stats: HashMap<FeatureId, Option<Arc<PanelStats>>>,
    suitability: HashMap<FeatureId, Option<Arc<Suitability>>>,
}

impl SelectionSession {
    pub fn new(unit_mode: UnitMode) -> Self {
        Self {
            unit_mode,
            ..Self::default()
        }
    }

    /// Open `feature`. The camera move always comes first so framing never
    /// waits on I/O; records already cached are not fetched again.
    pub fn commit(&mut self, feature: &Feature, areas: &mut AreaCache) -> Vec<Effect> {
        let id = feature.id.clone();
        let area = areas.area_of(feature);
        let mut effects = Vec::with_capacity(4);

        self.camera = camera::target_for(feature, area);
        match self.camera {
            Some(target) => effects.push(Effect::MoveCamera(CameraMove::Frame(target))),
            None => warn!(%id, "feature has no focus point, camera left in place"),
        }

        let stats = Slot::cached(&self.stats, &id);
        let suitability = Slot::cached(&self.suitability, &id);
        if matches!(stats, Slot::Loading) {
            effects.push(Effect::Fetch(LoadRequest::Stats(id.clone())));
        }
        if matches!(suitability, Slot::Loading) {
            effects.push(Effect::Fetch(LoadRequest::Suitability(id.clone())));
        }
        effects.push(Effect::Fetch(LoadRequest::Nested(id.clone())));

        info!(%id, area, "committed selection");
        self.open = Some(OpenSelection {
            id,
            name: feature.name.clone(),
            stats,
            suitability,
            nested: None,
        });
        effects
    }

    /// Click on empty space: neutral camera, panel closed, overlay emptied
    pub fn clear(&mut self) -> Vec<Effect> {
        if let Some(open) = self.open.take() {
            info!(id = %open.id, "selection cleared");
        }
        self.camera = None;
        vec![Effect::MoveCamera(CameraMove::Neutral { duration: RESET_DURATION })]
    }

    /// Switch presentation units; an open panel re-renders from cache
    pub fn set_unit_mode(&mut self, mode: UnitMode) -> Vec<Effect> {
        if mode == self.unit_mode {
            return Vec::new();
        }
        self.unit_mode = mode;
        debug!(%mode, "unit mode changed");
        if self.open.is_some() {
            vec![Effect::RenderPanel]
        } else {
            Vec::new()
        }
    }

    /// Fold a finished fetch into the session. Records are cached whatever
    /// their identity, but only a response for the open identity touches the
    /// panel or overlay. Returns whether the visible state changed.
    pub fn apply(&mut self, response: LoadResponse) -> bool {
        match response {
            LoadResponse::Stats { id, result } => {
                let record = settle(&mut self.stats, &id, result, "climate stats");
                match self.open_for(&id) {
                    Some(open) => {
                        open.stats = record.into();
                        true
                    }
                    None => false,
                }
            }
            LoadResponse::Suitability { id, result } => {
                let record = settle(&mut self.suitability, &id, result, "suitability");
                match self.open_for(&id) {
                    Some(open) => {
                        open.suitability = record.into();
                        true
                    }
                    None => false,
                }
            }
            LoadResponse::Nested { id, result } => {
                let polygons = result.unwrap_or_else(|err| {
                    warn!(%id, error = %err, "nested feature load failed");
                    Vec::new()
                });
                match self.open_for(&id) {
                    Some(open) => {
                        debug!(%id, count = polygons.len(), "nested features ready");
                        open.nested = Some(polygons);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    fn open_for(&mut self, id: &FeatureId) -> Option<&mut OpenSelection> {
        match self.open.as_mut() {
            Some(open) if open.id == *id => Some(open),
            _ => {
                debug!(%id, "discarding response for a selection that is no longer open");
                None
            }
        }
    }

    pub fn unit_mode(&self) -> UnitMode {
        self.unit_mode
    }

    pub fn open_id(&self) -> Option<&FeatureId> {
        self.open.as_ref().map(|open| &open.id)
    }

    /// Target of the last commit, until cleared
    pub fn camera_target(&self) -> Option<&CameraTarget> {
        self.camera.as_ref()
    }

    /// Nested polygons of the open selection; empty while loading or closed
    pub fn overlay(&self) -> &[MultiPolygon<f64>] {
        self.open
            .as_ref()
            .and_then(|open| open.nested.as_deref())
            .unwrap_or(&[])
    }

    /// Panel content in the current unit mode
    pub fn panel(&self) -> Option<PanelView> {
        let open = self.open.as_ref()?;
        let mode = self.unit_mode;
        Some(PanelView {
            id: open.id.clone(),
            title: open.name.clone(),
            climate: open.stats.section(NO_CLIMATE, |s| panel::climate_view(s, mode)),
            suitability: open.suitability.section(NO_SUITABILITY, |s| panel::suitability_view(s, mode)),
            nested: open.nested.as_ref().map(Vec::len),
        })
    }
}

/// Cache a successful lookup (including "no record"); a failed fetch is
/// reported as missing without being cached, so a later commit retries it
fn settle<T>(
    cache: &mut HashMap<FeatureId, Option<Arc<T>>>,
    id: &FeatureId,
    result: Result<Option<T>>,
    what: &str,
) -> Option<Arc<T>> {
    match result {
        Ok(record) => {
            let record = record.map(Arc::new);
            if record.is_none() {
                debug!(%id, what, "no record for identity");
            }
            cache.entry(id.clone()).or_insert(record).clone()
        }
        Err(err) => {
            warn!(%id, what, error = %err, "fetch failed");
            None
        }
    }
}
