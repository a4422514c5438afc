//! Background loading of auxiliary records.
//!
//! Requests run on the rayon pool; answers come back over a channel that
//! the UI loop drains once per frame, so the session itself is only ever
//! touched from one thread.

use crate::data::records::{PanelStats, Suitability};
use crate::feature::FeatureId;
use crate::selection::{LoadRequest, LoadResponse};
use anyhow::Result;
use geo::MultiPolygon;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, warn};

/// Where auxiliary records come from
pub trait DataSource: Send + Sync {
    fn panel_stats(&self, id: &FeatureId) -> Result<Option<PanelStats>>;

    fn suitability(&self, id: &FeatureId) -> Result<Option<Suitability>>;

    /// Sub-feature polygons of `id`; an identity without any yields an
    /// empty list, not an error
    fn nested_features(&self, id: &FeatureId) -> Result<Vec<MultiPolygon<f64>>>;
}

/// Run one request to completion against `source`
pub fn load(source: &dyn DataSource, request: LoadRequest) -> LoadResponse {
    let response = match request {
        LoadRequest::Stats(id) => {
            let result = source.panel_stats(&id);
            LoadResponse::Stats { id, result }
        }
        LoadRequest::Suitability(id) => {
            let result = source.suitability(&id);
            LoadResponse::Suitability { id, result }
        }
        LoadRequest::Nested(id) => {
            let result = source.nested_features(&id);
            LoadResponse::Nested { id, result }
        }
    };
    debug!(id = %response.id(), "load finished");
    response
}

pub struct Fetcher {
    source: Arc<dyn DataSource>,
    tx: Sender<LoadResponse>,
    rx: Receiver<LoadResponse>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { source, tx, rx }
    }

    /// Start a load without blocking; the answer arrives via [`Fetcher::drain`]
    pub fn dispatch(&self, request: LoadRequest) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        rayon::spawn(move || {
            let response = load(source.as_ref(), request);
            if tx.send(response).is_err() {
                warn!("fetch finished after the receiver was dropped");
            }
        });
    }

    /// Every response that has arrived so far
    pub fn drain(&self) -> impl Iterator<Item = LoadResponse> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::Duration;

    /// In-memory source: stats for "known", nothing for anything else,
    /// and a failing nested lookup for "broken"
    pub(crate) struct StubSource;

    impl DataSource for StubSource {
        fn panel_stats(&self, id: &FeatureId) -> Result<Option<PanelStats>> {
            Ok((id.as_str() == "known").then(|| PanelStats {
                ava_id: id.to_string(),
                tmean_all_c: Some(11.0),
                ..Default::default()
            }))
        }

        fn suitability(&self, _id: &FeatureId) -> Result<Option<Suitability>> {
            Ok(None)
        }

        fn nested_features(&self, id: &FeatureId) -> Result<Vec<MultiPolygon<f64>>> {
            match id.as_str() {
                "broken" => Err(anyhow!("404 Not Found")),
                _ => Ok(Vec::new()),
            }
        }
    }

    #[test]
    fn test_load_carries_identity() {
        let response = load(&StubSource, LoadRequest::Stats(FeatureId::from("known")));
        match response {
            LoadResponse::Stats { id, result } => {
                assert_eq!(id.as_str(), "known");
                assert!(result.unwrap().is_some());
            }
            other => panic!("unexpected {other:?}"),
        }

        let nested = load(&StubSource, LoadRequest::Nested(FeatureId::from("broken")));
        assert!(matches!(nested, LoadResponse::Nested { result: Err(_), .. }));
    }

    #[test]
    fn test_dispatch_delivers_over_channel() {
        let fetcher = Fetcher::new(Arc::new(StubSource));
        fetcher.dispatch(LoadRequest::Suitability(FeatureId::from("x")));
        fetcher.dispatch(LoadRequest::Nested(FeatureId::from("x")));

        let mut received = Vec::new();
        for _ in 0..2 {
            let response = fetcher.rx.recv_timeout(Duration::from_secs(5)).unwrap();
            received.push(response);
        }
        assert!(received.iter().all(|r| r.id().as_str() == "x"));
        assert!(fetcher.drain().next().is_none());
    }
}
