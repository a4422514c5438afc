use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::MapLayers;
use crate::selection::panel::{PanelField, PanelView, Section, HOVER_PROMPT};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline, Widget, Wrap},
    Frame,
};

/// Side panel width in terminal cells
const PANEL_WIDTH: u16 = 44;

struct Areas {
    map: Rect,
    panel: Rect,
    status: Rect,
}

fn split(area: Rect) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map + panel
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(PANEL_WIDTH)])
        .split(rows[0]);
    Areas {
        map: cols[0],
        panel: cols[1],
        status: rows[1],
    }
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " AVA Map ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Cells inside the map border, for mapping mouse positions
pub fn map_area(area: Rect) -> Rect {
    map_block().inner(split(area).map)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let areas = split(frame.area());
    render_map(frame, app, areas.map);
    render_panel(frame, app, areas.panel);
    render_status_bar(frame, app, areas.status);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = map_block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport, app.overlay());

    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let inside = col >= inner.x && col < inner.x + inner.width && row >= inner.y && row < inner.y + inner.height;
        inside.then(|| (col - inner.x, row - inner.y))
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
}

/// Braille layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate().take(area.height as usize) {
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().enumerate().take(area.width as usize) {
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.layers.outlines, Color::Cyan, area, buf);
        Self::render_layer(&self.layers.highlight, Color::Yellow, area, buf);
        Self::render_layer(&self.layers.nested, Color::Green, area, buf);
        Self::render_layer(&self.layers.selected, Color::Magenta, area, buf);

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = area.width.saturating_sub(*lx) as usize;
            let y = area.y + *ly;
            for (i, ch) in text.chars().take(max_len.min(32)).enumerate() {
                buf[(area.x + *lx + i as u16, y)].set_char(ch).set_style(label_style);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

fn render_panel(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    render_info_box(frame, app, chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    match app.panel() {
        Some(panel) => render_detail(frame, panel, block, chunks[1]),
        None => {
            let hint = Paragraph::new(Line::styled("Click an AVA to open it", Style::default().fg(Color::DarkGray)))
                .block(block.title(" Details "));
            frame.render_widget(hint, chunks[1]);
        }
    }
}

fn render_info_box(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = match app.hover_lines() {
        Some(lines) => lines.into_iter().map(Line::from).collect(),
        None => vec![Line::styled(HOVER_PROMPT, Style::default().fg(Color::DarkGray))],
    };
    let info = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Hover "),
    );
    frame.render_widget(info, area);
}

fn field_line(field: &PanelField) -> Line<'static> {
    let (label_style, value_style) = if field.enabled {
        (Style::default().fg(Color::Gray), Style::default().fg(Color::Yellow))
    } else {
        (Style::default().fg(Color::DarkGray), Style::default().fg(Color::DarkGray))
    };
    let mut spans = vec![
        Span::styled(format!("{}: ", field.label), label_style),
        Span::styled(format!("{} {}", field.value, field.unit).trim_end().to_string(), value_style),
    ];
    if let Some(note) = &field.note {
        spans.push(Span::styled(format!("  {note}"), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

fn section_lines<T>(section: &Section<T>, what: &str, ready: impl FnOnce(&T) -> Vec<Line<'static>>) -> Vec<Line<'static>> {
    match section {
        Section::Loading => vec![Line::styled(format!("Loading {what}…"), Style::default().fg(Color::DarkGray))],
        Section::Missing(message) => vec![Line::styled(*message, Style::default().fg(Color::DarkGray))],
        Section::Ready(view) => ready(view),
    }
}

fn heading(text: &str) -> Line<'static> {
    Line::styled(text.to_string(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
}

fn render_detail(frame: &mut Frame, panel: &PanelView, block: Block<'_>, area: Rect) {
    let block = block.title(Span::styled(
        format!(" {} ", panel.title),
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let series = match &panel.climate {
        Section::Ready(view) if view.series.len() > 1 => Some(view.series.as_slice()),
        _ => None,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(if series.is_some() { 3 } else { 0 })])
        .split(inner);

    let mut lines = vec![heading("Climate")];
    lines.extend(section_lines(&panel.climate, "climate stats", |view| {
        let mut lines = vec![Line::styled(format!("Period {}", view.period), Style::default().fg(Color::DarkGray))];
        lines.extend(view.fields.iter().map(field_line));
        lines
    }));
    lines.push(Line::default());
    lines.push(heading("Suitability"));
    lines.extend(section_lines(&panel.suitability, "suitability", |view| {
        let mut lines: Vec<Line> = view.fields.iter().map(field_line).collect();
        lines.push(Line::styled(view.note.clone(), Style::default().fg(Color::DarkGray)));
        lines
    }));
    lines.push(Line::default());
    lines.push(match panel.nested {
        Some(count) => Line::from(vec![
            Span::styled("Vineyards: ", Style::default().fg(Color::Gray)),
            Span::styled(count.to_string(), Style::default().fg(Color::Green)),
        ]),
        None => Line::styled("Loading vineyards…", Style::default().fg(Color::DarkGray)),
    });

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[0]);

    if let Some(series) = series {
        render_sparkline(frame, series, chunks[1]);
    }
}

/// Annual mean temperatures, rescaled so the coldest year sits at the floor
fn sparkline_data(series: &[f64]) -> Vec<u64> {
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = (max - min).max(f64::EPSILON);
    series.iter().map(|v| 1 + ((v - min) / range * 99.0) as u64).collect()
}

fn render_sparkline(frame: &mut Frame, series: &[f64], area: Rect) {
    let data = sparkline_data(series);
    let sparkline = Sparkline::default()
        .block(Block::default().title(Span::styled("Annual mean temp", Style::default().fg(Color::DarkGray))))
        .data(&data)
        .max(100)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(sparkline, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.camera_pose(), Style::default().fg(Color::Magenta)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.session.unit_mode().to_string(), Style::default().fg(Color::Green)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | click:open esc:clear u:units r:fit hjkl:pan +/-:zoom q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::square;
    use crate::fetch::tests::StubSource;
    use crate::selection::UnitMode;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_map_area_leaves_room_for_panel() {
        let inner = map_area(Rect::new(0, 0, 120, 40));
        assert_eq!(inner, Rect::new(1, 1, 120 - PANEL_WIDTH - 2, 40 - 1 - 2));
    }

    #[test]
    fn test_render_idle_and_hovered() {
        let features = vec![square("red_mountain", -119.5, 46.2, 0.1)];
        let mut app = App::new(features, Arc::new(StubSource), UnitMode::Metric, 120, 40);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        terminal.draw(|frame| render(frame, &app)).unwrap();
        let idle = screen_text(&terminal);
        assert!(idle.contains(HOVER_PROMPT));
        assert!(idle.contains("metric"));

        app.pointer_moved(-119.45, 46.25);
        terminal.draw(|frame| render(frame, &app)).unwrap();
        assert!(screen_text(&terminal).contains("AVA: red_mountain"));
    }

    #[test]
    fn test_sparkline_scaling() {
        assert_eq!(sparkline_data(&[10.0, 12.5, 11.0]), vec![1, 100, 40]);
        assert_eq!(sparkline_data(&[11.0, 11.0]), vec![1, 1]);
    }
}
