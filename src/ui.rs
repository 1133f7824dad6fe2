use crate::app::{App, RangeField};
use crate::braille::BrailleCanvas;
use crate::chart::DetailChart;
use crate::view::{Marker, MarkerStyle, Scene};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

/// Screen regions, shared with `App` for mouse hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub map: Rect,
    /// Drawable map surface inside the border
    pub map_inner: Rect,
    pub chart: Rect,
    pub highlight: Rect,
    pub range: Rect,
    pub status: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),    // Map and detail chart
                Constraint::Length(1), // Highlight
                Constraint::Length(3), // Range inputs
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(rows[0]);

        Self {
            map: columns[0],
            map_inner: map_block().inner(columns[0]),
            chart: columns[1],
            highlight: rows[1],
            range: rows[2],
            status: rows[3],
        }
    }
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " US CS Faculty ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
}

/// Terminal rendition of each marker style
fn marker_style(style: MarkerStyle) -> Style {
    match style {
        MarkerStyle::Max => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        MarkerStyle::Min => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        MarkerStyle::Both => Style::default()
            .fg(Color::Red)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD),
        MarkerStyle::Ordinary => Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let layout = AppLayout::new(frame.area());

    render_map(frame, app, &layout);
    render_chart(frame, app, layout.chart);
    render_highlight(frame, app, layout.highlight);
    render_range(frame, app, layout.range);
    render_status_bar(frame, app, layout.status);
}

fn render_map(frame: &mut Frame, app: &App, layout: &AppLayout) {
    frame.render_widget(map_block(), layout.map);

    match app.scene.as_ref() {
        Some(scene) => {
            let widget = MapWidget {
                scene,
                hovered: app.hover.as_ref().map(|h| h.marker),
            };
            frame.render_widget(widget, layout.map_inner);
        }
        None if app.loading() => {
            let text = Paragraph::new(Span::styled(
                "Loading map data...",
                Style::default().fg(Color::DarkGray),
            ));
            frame.render_widget(text, layout.map_inner);
        }
        None => {}
    }
}

/// Draws regions, then markers, from a scene
struct MapWidget<'a> {
    scene: &'a Scene,
    hovered: Option<usize>,
}

impl MapWidget<'_> {
    /// Render a braille canvas layer with a specific color
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let rows = canvas.height().min(area.height as usize);
        let cols = canvas.width().min(area.width as usize);
        for row in 0..rows {
            for col in 0..cols {
                // Empty cells keep whatever an earlier layer drew
                if let Some(ch) = canvas.glyph(col, row) {
                    let (x, y) = (area.x + col as u16, area.y + row as u16);
                    buf[(x, y)].set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn render_marker(&self, marker: &Marker, hovered: bool, area: Rect, buf: &mut Buffer) {
        if marker.col >= area.width || marker.row >= area.height {
            return;
        }
        let mut style = marker_style(marker.style);
        if hovered {
            style = style.add_modifier(Modifier::REVERSED);
        }
        buf[(area.x + marker.col, area.y + marker.row)]
            .set_char('●')
            .set_style(style);
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_layer(&self.scene.layers.fill, Color::DarkGray, area, buf);
        self.render_layer(&self.scene.layers.outline, Color::Gray, area, buf);

        for (index, marker) in self.scene.markers.iter().enumerate() {
            self.render_marker(marker, self.hovered == Some(index), area, buf);
        }
    }
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" Faculty by Position ", Style::default().fg(Color::Cyan)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(hover) = app.hover.as_ref() else {
        let hint = Paragraph::new(Span::styled(
            "Hover over a university to see its faculty by position.",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: true });
        frame.render_widget(hint, inner);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(1), // Y caption
            Constraint::Min(3),    // Bars
            Constraint::Length(1), // X caption
        ])
        .split(inner);

    let title = Paragraph::new(Span::styled(
        hover.chart.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(title, chunks[0]);

    let y_caption = match hover.chart.y_max {
        Some(max) => format!("{} (0-{max})", DetailChart::Y_CAPTION),
        None => format!("{} (no data)", DetailChart::Y_CAPTION),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(y_caption, Style::default().fg(Color::DarkGray))),
        chunks[1],
    );

    frame.render_widget(DetailBars { chart: &hover.chart }, chunks[2]);

    frame.render_widget(
        Paragraph::new(Span::styled(
            DetailChart::X_CAPTION,
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
        chunks[3],
    );
}

const BAR_GAP: u16 = 1;

/// Widest bar that still fits `count` bars and their gaps
fn bar_width(width: u16, count: usize) -> u16 {
    let count = count.max(1) as u16;
    (width.saturating_sub(BAR_GAP * (count - 1)) / count).max(1)
}

fn bar_chart(chart: &DetailChart, width: u16) -> BarChart<'static> {
    let bars: Vec<Bar> = chart
        .bars
        .iter()
        .map(|bar| {
            Bar::default()
                .value(bar.value.unwrap_or(0).max(0) as u64)
                .label(Line::from(bar.label))
                .style(Style::default().fg(Color::Cyan))
                .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        })
        .collect();

    // Y axis runs from 0 to the tallest bar
    let max = chart.y_max.unwrap_or(0).max(1) as u64;

    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .max(max)
        .bar_width(bar_width(width, chart.bars.len()))
        .bar_gap(BAR_GAP)
}

/// Bar chart plus a `NaN` marker on every bar without a numeric value
struct DetailBars<'a> {
    chart: &'a DetailChart,
}

impl Widget for DetailBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // One row of bars above the label row
        if area.height < 2 || area.width == 0 {
            return;
        }
        bar_chart(self.chart, area.width).render(area, buf);

        // ratatui prints no value on an empty bar, so missing ones are
        // written onto the bottom bar row
        let width = bar_width(area.width, self.chart.bars.len());
        let y = area.bottom() - 2;
        for (index, bar) in self.chart.bars.iter().enumerate() {
            let x = area.x + index as u16 * (width + BAR_GAP);
            if x >= area.right() {
                break;
            }
            if bar.value.is_some() {
                continue;
            }
            let span = width.min(area.right() - x);
            let offset = span.saturating_sub(NAN.len() as u16) / 2;
            buf.set_stringn(x + offset, y, NAN, span as usize, Style::default().fg(Color::Red));
        }
    }
}

const NAN: &str = "NaN";

fn render_highlight(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(highlight) = app.hover.as_ref().and_then(|h| h.highlight.as_ref()) {
        let line = Paragraph::new(Span::styled(
            format!(" {}", highlight.message),
            marker_style(highlight.style),
        ));
        frame.render_widget(line, area);
    }
}

fn render_range(frame: &mut Frame, app: &App, area: Rect) {
    let input = &app.range_input;
    let field = |label: &'static str, which: RangeField| {
        let focused = input.focus == which;
        let style = if focused {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::Yellow)
        };
        vec![
            Span::styled(label, Style::default().fg(Color::DarkGray)),
            Span::styled(format!(" {:>5} ", input.text(which)), style),
            Span::raw("  "),
        ]
    };

    let mut spans = vec![Span::raw(" ")];
    spans.extend(field("Min ", RangeField::Min));
    spans.extend(field("Max ", RangeField::Max));
    spans.push(Span::styled(
        "Tab:switch  0-9:edit  Enter:apply  Up/Down:step",
        Style::default().fg(Color::DarkGray),
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" Faculty Size Range ", Style::default().fg(Color::Cyan)));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shown = app
        .scene
        .as_ref()
        .map(|s| format!("{} universities", s.records.len()))
        .unwrap_or_else(|| "no map".to_string());
    let range = match app.scene.as_ref().and_then(|s| s.range()) {
        Some(r) => format!("{}-{}", r.min(), r.max()),
        None => "all".to_string(),
    };

    let mut spans = vec![
        Span::styled(" Shown: ", Style::default().fg(Color::DarkGray)),
        Span::styled(shown, Style::default().fg(Color::Yellow)),
        Span::styled(" | Range: ", Style::default().fg(Color::DarkGray)),
        Span::styled(range, Style::default().fg(Color::Magenta)),
    ];
    if let Some(extremes) = app.scene.as_ref().and_then(|s| s.extremes) {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            format!("max {}", extremes.max),
            marker_style(MarkerStyle::Max),
        ));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("min {}", extremes.min),
            marker_style(MarkerStyle::Min),
        ));
    }
    if app.loading() {
        spans.push(Span::styled(" | loading", Style::default().fg(Color::Green)));
    }
    spans.push(Span::styled(
        " | r:reload q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
