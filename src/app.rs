use crate::feature::{Feature, FeatureId};
use crate::fetch::{DataSource, Fetcher};
use crate::map::{MapRenderer, Overlay, Viewport};
use crate::selection::area::geodesic_area;
use crate::selection::camera::{FIT_DURATION, FIT_PADDING};
use crate::selection::panel::{self, PanelView};
use crate::selection::{resolve, AreaCache, Effect, HighlightController, HighlightSignal, SelectionSession, UnitMode};
use crate::ui;
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub areas: AreaCache,
    pub highlight: HighlightController,
    pub session: SelectionSession,
    fetcher: Fetcher,
    /// Region drawn lit, driven only by applied highlight signals
    lit: Option<FeatureId>,
    /// Panel as last rendered from the session
    panel: Option<PanelView>,
    /// Terminal cells the map is drawn into
    pub map_area: Rect,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Set once a press moves; the release is then not a click
    dragged: bool,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    pub fn new(features: Vec<Feature>, source: Arc<dyn DataSource>, units: UnitMode, width: u16, height: u16) -> Self {
        let map_renderer = MapRenderer::new(features);
        let mut areas = AreaCache::new();
        areas.warm(map_renderer.features());

        let map_area = ui::map_area(Rect::new(0, 0, width, height));
        let mut app = Self {
            viewport: Viewport::world(map_area.width as usize * 2, map_area.height as usize * 4),
            map_renderer,
            areas,
            highlight: HighlightController::new(),
            session: SelectionSession::new(units),
            fetcher: Fetcher::new(source),
            lit: None,
            panel: None,
            map_area,
            should_quit: false,
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
        };
        app.refit(Duration::ZERO, Instant::now());
        app
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_area = ui::map_area(Rect::new(0, 0, width, height));
        self.viewport.width = self.map_area.width as usize * 2;
        self.viewport.height = self.map_area.height as usize * 4;
    }

    /// Terminal cell to braille pixel (cell center), if it is on the map
    fn cell_to_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        let inside = col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height;
        inside.then(|| {
            let px = (col - area.x) as i32 * 2 + 1;
            let py = (row - area.y) as i32 * 4 + 2;
            (px, py)
        })
    }

    fn cell_to_lonlat(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        self.cell_to_pixel(col, row).map(|(px, py)| self.viewport.unproject(px, py))
    }

    /// Hover at a geographic point: resolve the overlap, move the highlight.
    /// Returns the signals after applying them.
    pub fn pointer_moved(&mut self, lon: f64, lat: f64) -> Vec<HighlightSignal> {
        let hits = self.map_renderer.hit_test(lon, lat);
        let resolved = resolve(hits, &mut self.areas).map(|f| f.id.clone());
        let signals = self.highlight.update(resolved.as_ref());
        self.apply_highlight(&signals);
        signals
    }

    pub fn pointer_left(&mut self) -> Vec<HighlightSignal> {
        let signals = self.highlight.leave();
        self.apply_highlight(&signals);
        signals
    }

    /// Apply highlight transitions to the drawn state, in order
    fn apply_highlight(&mut self, signals: &[HighlightSignal]) {
        for signal in signals {
            trace!(?signal, "highlight");
            match signal {
                HighlightSignal::Deactivate(id) => {
                    if self.lit.as_ref() == Some(id) {
                        self.lit = None;
                    }
                }
                HighlightSignal::Activate(id) => self.lit = Some(id.clone()),
            }
        }
    }

    fn refresh_panel(&mut self) {
        self.panel = self.session.panel();
    }

    /// Commit the region under a geographic point, or clear on empty space
    pub fn clicked(&mut self, lon: f64, lat: f64, now: Instant) {
        let hits = self.map_renderer.hit_test(lon, lat);
        let effects = match resolve(hits, &mut self.areas) {
            Some(feature) => self.session.commit(feature, &mut self.areas),
            None => self.session.clear(),
        };
        self.apply_effects(effects, now);
        self.refresh_panel();
    }

    pub fn apply_effects(&mut self, effects: Vec<Effect>, now: Instant) {
        for effect in effects {
            match effect {
                Effect::MoveCamera(mv) => self.viewport.fly_to(&mv, now),
                Effect::Fetch(request) => self.fetcher.dispatch(request),
                Effect::RenderPanel => self.refresh_panel(),
            }
        }
    }

    /// Per-frame work: fold in finished fetches and advance the camera.
    /// Returns whether anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for response in self.fetcher.drain() {
            changed |= self.session.apply(response);
        }
        if changed {
            self.refresh_panel();
        }
        let flying = self.viewport.is_flying();
        self.viewport.tick(now);
        changed || flying
    }

    pub fn toggle_units(&mut self) {
        let mode = self.session.unit_mode().toggled();
        let effects = self.session.set_unit_mode(mode);
        self.apply_effects(effects, Instant::now());
    }

    pub fn clear_selection(&mut self, now: Instant) {
        let effects = self.session.clear();
        self.apply_effects(effects, now);
        self.refresh_panel();
    }

    /// Fly back to the whole dataset
    pub fn refit(&mut self, duration: Duration, now: Instant) {
        if let Some(bounds) = self.map_renderer.bounds() {
            let camera = self.viewport.fit_camera(bounds, FIT_PADDING);
            self.viewport.fly(camera, duration, now);
        }
    }

    pub fn refit_animated(&mut self) {
        self.refit(FIT_DURATION, Instant::now());
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.cell_to_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Mouse moved without a button held
    pub fn mouse_moved(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        match self.cell_to_lonlat(col, row) {
            Some((lon, lat)) => self.pointer_moved(lon, lat),
            None => self.pointer_left(),
        };
    }

    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag by panning
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                // One terminal cell is 2x4 braille pixels
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Button released: a press that never moved is a click
    pub fn mouse_up(&mut self, col: u16, row: u16, now: Instant) {
        let pressed = self.last_mouse.take().is_some();
        if pressed && !std::mem::take(&mut self.dragged) {
            if let Some((lon, lat)) = self.cell_to_lonlat(col, row) {
                self.clicked(lon, lat, now);
            }
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Info box lines for whatever is highlighted
    pub fn hover_lines(&self) -> Option<Vec<String>> {
        let feature = self.map_renderer.get(self.lit.as_ref()?)?;
        let area = self
            .areas
            .get(&feature.id)
            .unwrap_or_else(|| geodesic_area(&feature.geometry));
        Some(panel::hover_lines(feature, area))
    }

    pub fn panel(&self) -> Option<&PanelView> {
        self.panel.as_ref()
    }

    pub fn overlay(&self) -> Overlay<'_> {
        Overlay {
            hovered: self.lit.as_ref(),
            selected: self.session.open_id(),
            nested: self.session.overlay(),
        }
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("z{:.1}", self.viewport.camera.zoom)
    }

    /// Pitch and bearing of the live camera
    pub fn camera_pose(&self) -> String {
        let camera = &self.viewport.camera;
        format!("pitch {:.0}° bearing {:.0}°", camera.pitch, camera.bearing)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let (lon, lat) = (self.viewport.camera.center.x, self.viewport.camera.center.y);
        format!(
            "{:.2}°{}, {:.2}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::square;
    use crate::fetch::tests::StubSource;
    use crate::selection::camera::FRAME_BEARING;
    use crate::selection::panel::Section;
    use crate::selection::HighlightState;

    fn app() -> App {
        let features = vec![
            square("columbia_valley", -121.0, 45.5, 3.0),
            square("known", -119.5, 46.2, 0.1),
        ];
        App::new(features, Arc::new(StubSource), UnitMode::Metric, 120, 40)
    }

    /// Tick until the fetcher has nothing left in flight
    fn settle(app: &mut App) {
        for _ in 0..200 {
            app.tick(Instant::now());
            let loaded = app.panel().map_or(true, |p| {
                p.nested.is_some() && p.climate != Section::Loading && p.suitability != Section::Loading
            });
            if loaded {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("fetches never settled");
    }

    #[test]
    fn test_starts_fitted_to_dataset() {
        let app = app();
        assert!(!app.viewport.is_flying());
        let (px, py) = app.viewport.project(-119.5, 47.0);
        assert!(app.viewport.is_visible(px, py));
        assert_eq!(app.areas.len(), 2);
    }

    #[test]
    fn test_hover_prefers_smallest() {
        let mut app = app();
        let signals = app.pointer_moved(-119.45, 46.25);
        assert_eq!(signals, vec![HighlightSignal::Activate("known".into())]);
        assert!(app.hover_lines().unwrap()[0].ends_with("known"));

        let signals = app.pointer_moved(-120.0, 47.0);
        assert_eq!(
            signals,
            vec![
                HighlightSignal::Deactivate("known".into()),
                HighlightSignal::Activate("columbia_valley".into()),
            ]
        );

        assert_eq!(app.pointer_left(), vec![HighlightSignal::Deactivate("columbia_valley".into())]);
        assert_eq!(app.highlight.state(), &HighlightState::Idle);
        assert!(app.hover_lines().is_none());
    }

    #[test]
    fn test_mouse_hover_drives_drawn_highlight() {
        let mut app = app();
        let (px, py) = app.viewport.project(-119.45, 46.25);
        let (col, row) = (app.map_area.x + (px / 2) as u16, app.map_area.y + (py / 4) as u16);
        app.mouse_moved(col, row);
        assert_eq!(app.highlight.active(), app.overlay().hovered);
        assert!(app.overlay().hovered.is_some());

        // Off the map: the drawn highlight goes out with the controller
        app.mouse_moved(0, 0);
        assert_eq!(app.highlight.state(), &HighlightState::Idle);
        assert!(app.overlay().hovered.is_none());
    }

    #[test]
    fn test_click_frames_and_loads() {
        let mut app = app();
        let start = Instant::now();
        app.clicked(-119.45, 46.25, start);

        assert!(app.viewport.is_flying());
        assert_eq!(app.viewport.destination().bearing, FRAME_BEARING);
        assert_eq!(app.session.open_id().map(|id| id.as_str()), Some("known"));

        settle(&mut app);
        let panel = app.panel().unwrap();
        assert!(matches!(panel.climate, Section::Ready(_)));
        assert!(matches!(panel.suitability, Section::Missing(_)));
        assert_eq!(panel.nested, Some(0));

        app.tick(start + Duration::from_secs(5));
        assert!(!app.viewport.is_flying());
        assert_eq!(app.viewport.camera.bearing, FRAME_BEARING);
    }

    #[test]
    fn test_click_on_empty_space_resets() {
        let mut app = app();
        let start = Instant::now();
        app.clicked(-119.45, 46.25, start);
        app.tick(start + Duration::from_secs(5));

        app.clicked(0.0, 0.0, start + Duration::from_secs(5));
        assert!(app.session.open_id().is_none());
        app.tick(start + Duration::from_secs(10));
        assert_eq!(app.viewport.camera.pitch, 0.0);
        assert_eq!(app.viewport.camera.bearing, 0.0);
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut app = app();
        let (col, row) = (app.map_area.x + 10, app.map_area.y + 10);
        app.mouse_down(col, row);
        app.handle_drag(col + 3, row);
        app.mouse_up(col + 3, row, Instant::now());
        assert!(app.session.open_id().is_none());
        assert!(!app.viewport.is_flying());
    }

    #[test]
    fn test_toggle_units() {
        let mut app = app();
        app.toggle_units();
        assert_eq!(app.session.unit_mode(), UnitMode::Imperial);
        app.toggle_units();
        assert_eq!(app.session.unit_mode(), UnitMode::Metric);
    }

    #[test]
    fn test_units_toggle_rerenders_open_panel() {
        let mut app = app();
        app.clicked(-119.45, 46.25, Instant::now());
        settle(&mut app);
        let unit_of = |app: &App| match &app.panel().unwrap().climate {
            Section::Ready(view) => view.fields[0].unit,
            other => panic!("climate not ready: {other:?}"),
        };
        assert_eq!(unit_of(&app), "°C");

        app.toggle_units();
        assert_eq!(unit_of(&app), "°F");
    }
}
