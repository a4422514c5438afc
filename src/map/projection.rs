use crate::selection::camera::CameraMove;
use geo::Rect;
use glam::DVec2;
use std::f64::consts::PI;
use std::time::{Duration, Instant};

/// World width in braille pixels at zoom 0. A braille dot is roughly four
/// screen pixels, so this is a 512px web tile scaled down.
const WORLD_PX_AT_ZERO: f64 = 128.0;
/// Screen pixels per braille dot, for converting web-style padding
const PX_PER_DOT: f64 = 4.0;
const MIN_ZOOM: f64 = 0.0;
const MAX_ZOOM: f64 = 18.0;
const MAX_LAT: f64 = 85.051_129;
/// Keyboard / wheel zoom step in zoom levels
const ZOOM_STEP: f64 = 0.5;

/// Camera pose. Zoom is a web-map style level (each step doubles scale).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// (lon, lat)
    pub center: DVec2,
    pub zoom: f64,
    /// Tilt in degrees; a flat terminal map only reports it
    pub pitch: f64,
    /// Degrees clockwise from north
    pub bearing: f64,
    /// Screen padding in pixels requested by the last framing
    pub padding: f64,
}

impl Camera {
    fn lerp(&self, to: &Camera, t: f64) -> Camera {
        Camera {
            center: self.center.lerp(to.center, t),
            zoom: self.zoom + (to.zoom - self.zoom) * t,
            pitch: self.pitch + (to.pitch - self.pitch) * t,
            bearing: self.bearing + (to.bearing - self.bearing) * t,
            padding: self.padding + (to.padding - self.padding) * t,
        }
    }
}

#[derive(Clone)]
struct Flight {
    from: Camera,
    to: Camera,
    start: Instant,
    duration: Duration,
}

/// Visible map area: camera plus canvas size in braille pixels
#[derive(Clone)]
pub struct Viewport {
    pub camera: Camera,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
    flight: Option<Flight>,
}

/// Web Mercator, normalized to [0, 1] on both axes
fn mercator(lon: f64, lat: f64) -> DVec2 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    DVec2::new(
        (lon + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

fn inverse_mercator(p: DVec2) -> (f64, f64) {
    let lon = p.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * p.y)).sinh().atan().to_degrees();
    (lon, lat)
}

fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Ease-in-out cubic on [0, 1]
fn ease(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            camera: Camera {
                center: DVec2::new(center_lon, center_lat),
                zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
                pitch: 0.0,
                bearing: 0.0,
                padding: 0.0,
            },
            width,
            height,
            flight: None,
        }
    }

    /// Whole world across the canvas width
    pub fn world(width: usize, height: usize) -> Self {
        let zoom = (width.max(1) as f64 / WORLD_PX_AT_ZERO).log2();
        Self::new(0.0, 20.0, zoom, width, height)
    }

    /// Braille pixels per unit of normalized Mercator
    fn scale(&self) -> f64 {
        WORLD_PX_AT_ZERO * self.camera.zoom.exp2()
    }

    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Projected offsets rotate against the bearing so that the bearing
    /// direction points up
    fn world_to_screen(&self) -> DVec2 {
        DVec2::from_angle(-self.camera.bearing.to_radians())
    }

    fn screen_to_world(&self) -> DVec2 {
        DVec2::from_angle(self.camera.bearing.to_radians())
    }

    fn center_mercator(&self) -> DVec2 {
        mercator(self.camera.center.x, self.camera.center.y)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let offset = (mercator(lon, lat) - self.center_mercator()) * self.scale();
        let p = self.world_to_screen().rotate(offset) + self.half_size();
        (p.x as i32, p.y as i32)
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let screen = DVec2::new(px as f64, py as f64) - self.half_size();
        let offset = self.screen_to_world().rotate(screen) / self.scale();
        inverse_mercator(self.center_mercator() + offset)
    }

    /// Geographic bounds of everything on screen (all four corners, since
    /// the map may be rotated)
    pub fn visible_bounds(&self) -> Rect<f64> {
        let (w, h) = (self.width as i32, self.height as i32);
        let corners = [(0, 0), (w, 0), (0, h), (w, h)].map(|(x, y)| self.unproject(x, y));
        let (mut min, mut max) = (corners[0], corners[0]);
        for (lon, lat) in &corners[1..] {
            min = (min.0.min(*lon), min.1.min(*lat));
            max = (max.0.max(*lon), max.1.max(*lat));
        }
        Rect::new(min, max)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.flight = None;
        let (w, h) = (self.width as i32, self.height as i32);
        let (lon, lat) = self.unproject(w / 2 + dx, h / 2 + dy);
        self.camera.center = DVec2::new(wrap_lon(lon), lat.clamp(-MAX_LAT, MAX_LAT));
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.camera.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.camera.zoom - ZOOM_STEP);
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.flight = None;
        self.camera.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -ZOOM_STEP);
    }

    /// Change zoom while keeping the point under the pointer fixed
    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.set_zoom(self.camera.zoom + delta);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Camera that shows `bounds` with `padding` screen pixels on each side
    pub fn fit_camera(&self, bounds: Rect<f64>, padding: f64) -> Camera {
        let pad = padding / PX_PER_DOT;
        let avail_w = (self.width as f64 - 2.0 * pad).max(1.0);
        let avail_h = (self.height as f64 - 2.0 * pad).max(1.0);

        let lo = mercator(bounds.min().x, bounds.max().y);
        let hi = mercator(bounds.max().x, bounds.min().y);
        let extent = (hi - lo).abs().max(DVec2::splat(1e-12));
        let scale = (avail_w / extent.x).min(avail_h / extent.y);

        let (lon, lat) = inverse_mercator((lo + hi) / 2.0);
        Camera {
            center: DVec2::new(lon, lat),
            zoom: (scale / WORLD_PX_AT_ZERO).log2().clamp(MIN_ZOOM, MAX_ZOOM),
            pitch: 0.0,
            bearing: 0.0,
            padding,
        }
    }

    /// Start animating toward `camera`; a zero duration jumps
    pub fn fly(&mut self, camera: Camera, duration: Duration, now: Instant) {
        if duration.is_zero() {
            self.flight = None;
            self.camera = camera;
            return;
        }
        self.flight = Some(Flight {
            from: self.camera,
            to: camera,
            start: now,
            duration,
        });
    }

    /// Apply a planned camera move
    pub fn fly_to(&mut self, mv: &CameraMove, now: Instant) {
        let (target, duration) = match mv {
            CameraMove::Frame(t) => (
                Camera {
                    center: DVec2::new(t.center.x, t.center.y),
                    zoom: t.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
                    pitch: t.pitch,
                    bearing: t.bearing,
                    padding: t.padding,
                },
                t.duration,
            ),
            CameraMove::Neutral { duration } => (
                Camera {
                    pitch: 0.0,
                    bearing: 0.0,
                    ..self.destination()
                },
                *duration,
            ),
        };
        self.fly(target, duration, now);
    }

    /// Where the camera is heading (or is, when idle)
    pub fn destination(&self) -> Camera {
        self.flight.as_ref().map_or(self.camera, |f| f.to)
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Advance an in-progress flight
    pub fn tick(&mut self, now: Instant) {
        let Some(flight) = &self.flight else {
            return;
        };
        let elapsed = now.saturating_duration_since(flight.start).as_secs_f64();
        let t = (elapsed / flight.duration.as_secs_f64()).clamp(0.0, 1.0);

        self.camera = flight.from.lerp(&flight.to, ease(t));
        if t >= 1.0 {
            self.camera = flight.to;
            self.flight = None;
        }
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }
}
