use crate::feature::Feature;
use geo::{BoundingRect, Centroid, Coord};
use std::time::Duration;

/// Fixed camera bearing for every framed selection, in degrees
pub const FRAME_BEARING: f64 = -25.0;
pub const FRAME_DURATION: Duration = Duration::from_millis(1200);
pub const RESET_DURATION: Duration = Duration::from_millis(700);

/// Padding and duration for fitting the whole dataset on load
pub const FIT_PADDING: f64 = 60.0;
pub const FIT_DURATION: Duration = Duration::from_millis(800);

/// `value = intercept - slope * log10(area)`, clamped
struct LogRamp {
    intercept: f64,
    slope: f64,
    min: f64,
    max: f64,
}

impl LogRamp {
    fn eval(&self, log_area: f64) -> f64 {
        (self.intercept - self.slope * log_area).clamp(self.min, self.max)
    }
}

const ZOOM: LogRamp = LogRamp { intercept: 22.0, slope: 1.2, min: 8.5, max: 14.2 };
const PITCH: LogRamp = LogRamp { intercept: 92.0, slope: 6.0, min: 45.0, max: 75.0 };
const PADDING: LogRamp = LogRamp { intercept: 140.0, slope: 8.0, min: 60.0, max: 140.0 };

/// Area-derived camera parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFraming {
    pub zoom: f64,
    /// Tilt in degrees
    pub pitch: f64,
    /// Screen padding in pixels on every side
    pub padding: f64,
}

/// Where the camera should fly for a committed feature
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTarget {
    pub center: Coord<f64>,
    pub zoom: f64,
    pub pitch: f64,
    pub padding: f64,
    pub bearing: f64,
    pub duration: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraMove {
    Frame(CameraTarget),
    /// Back to zero pitch and north-up bearing, keeping center and zoom
    Neutral { duration: Duration },
}

fn log_area(area_sq_m: f64) -> f64 {
    if area_sq_m.is_finite() {
        area_sq_m.max(1.0).log10()
    } else {
        0.0
    }
}

/// Map an area in m² to zoom, pitch and padding.
///
/// Areas span a hectare to thousands of km², so every parameter runs on a
/// log scale and is clamped. Non-positive or non-finite input counts as 1 m².
pub fn plan(area_sq_m: f64) -> CameraFraming {
    let l = log_area(area_sq_m);
    CameraFraming {
        zoom: ZOOM.eval(l),
        pitch: PITCH.eval(l),
        padding: PADDING.eval(l),
    }
}

/// Center of mass, or the bounding box center when that is unusable.
/// `None` only for empty geometry.
pub fn focus_point(feature: &Feature) -> Option<Coord<f64>> {
    feature
        .geometry
        .centroid()
        .map(|p| p.0)
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .or_else(|| feature.geometry.bounding_rect().map(|r| r.center()))
}

pub fn target_for(feature: &Feature, area_sq_m: f64) -> Option<CameraTarget> {
    let center = focus_point(feature)?;
    let framing = plan(area_sq_m);
    Some(CameraTarget {
        center,
        zoom: framing.zoom,
        pitch: framing.pitch,
        padding: framing.padding,
        bearing: FRAME_BEARING,
        duration: FRAME_DURATION,
    })
}
