use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::{debug, error, info, warn};
use ratatui::layout::Rect;

use crate::chart::DetailChart;
use crate::config::Config;
use crate::data::{self, Datasets};
use crate::error::LoadError;
use crate::filter::FilterRange;
use crate::ui::AppLayout;
use crate::view::{Highlight, Scene};

/// Which range input has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Min,
    Max,
}

impl RangeField {
    pub fn name(self) -> &'static str {
        match self {
            RangeField::Min => "min",
            RangeField::Max => "max",
        }
    }
}

/// The two size inputs: editable text plus the last committed values
#[derive(Debug, Clone)]
pub struct RangeInput {
    min_text: String,
    max_text: String,
    min: i64,
    max: i64,
    pub focus: RangeField,
}

impl RangeInput {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min_text: min.to_string(),
            max_text: max.to_string(),
            min,
            max,
            focus: RangeField::Min,
        }
    }

    pub fn text(&self, field: RangeField) -> &str {
        match field {
            RangeField::Min => &self.min_text,
            RangeField::Max => &self.max_text,
        }
    }

    fn text_mut(&mut self) -> &mut String {
        match self.focus {
            RangeField::Min => &mut self.min_text,
            RangeField::Max => &mut self.max_text,
        }
    }

    fn value_mut(&mut self) -> &mut i64 {
        match self.focus {
            RangeField::Min => &mut self.min,
            RangeField::Max => &mut self.max,
        }
    }

    /// Committed bounds, normalised
    pub fn range(&self) -> FilterRange {
        FilterRange::new(self.min, self.max)
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            RangeField::Min => RangeField::Max,
            RangeField::Max => RangeField::Min,
        };
    }

    /// Edit the focused field; only digits and a sign are accepted
    pub fn push_char(&mut self, c: char) {
        if c.is_ascii_digit() || c == '-' {
            self.text_mut().push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.text_mut().pop();
    }

    /// Commit the focused field. On a non-numeric entry the committed value
    /// is left alone and the offending text is returned.
    pub fn commit(&mut self) -> Result<FilterRange, String> {
        let text = self.text(self.focus).trim().to_string();
        let value = text.parse::<i64>().map_err(|_| text)?;
        *self.value_mut() = value;
        Ok(self.range())
    }

    /// Step the focused value by `delta` and commit it
    pub fn step(&mut self, delta: i64) -> FilterRange {
        let value = self.value_mut();
        *value = value.saturating_add(delta);
        let text = value.to_string();
        *self.text_mut() = text;
        self.range()
    }
}

/// Hovered marker with its transient chart and message
#[derive(Debug, Clone)]
pub struct Hover {
    /// Index into the scene's markers
    pub marker: usize,
    pub chart: DetailChart,
    pub highlight: Option<Highlight>,
}

/// Result of one background load
struct RenderOutcome {
    /// Sequence number of the request that produced it
    request: u64,
    range: Option<FilterRange>,
    result: Result<Datasets, LoadError>,
}

/// Application state
pub struct App {
    config: Config,
    pub range_input: RangeInput,
    /// Current map surface; `None` while torn down for a pending render
    pub scene: Option<Scene>,
    pub hover: Option<Hover>,
    pub layout: AppLayout,
    pub should_quit: bool,
    /// Range of the latest request (`None` = unfiltered)
    last_range: Option<FilterRange>,
    /// Sequence number of the latest request; only its outcome is drawn
    latest_request: u64,
    in_flight: usize,
    outcome_tx: Sender<RenderOutcome>,
    outcome_rx: Receiver<RenderOutcome>,
}

impl App {
    pub fn new(config: Config, width: u16, height: u16) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel();
        Self {
            range_input: RangeInput::new(config.min, config.max),
            config,
            scene: None,
            hover: None,
            layout: AppLayout::new(Rect::new(0, 0, width, height)),
            should_quit: false,
            last_range: None,
            latest_request: 0,
            in_flight: 0,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Tear down the map and start a fresh load on a background thread.
    /// Overlapping requests are not cancelled, but only the most recent
    /// one is drawn; older outcomes are dropped when they arrive.
    pub fn request_render(&mut self, range: Option<FilterRange>) {
        self.scene = None;
        self.hover = None;
        self.last_range = range;
        self.latest_request += 1;
        let request = self.latest_request;

        let boundaries = self.config.boundaries.clone();
        let object = self.config.object.clone();
        let faculty = self.config.faculty.clone();
        let tx = self.outcome_tx.clone();

        let spawned = thread::Builder::new()
            .name("map-load".into())
            .spawn(move || {
                let result = data::load(&boundaries, &object, &faculty);
                // Receiver only goes away when the app does
                let _ = tx.send(RenderOutcome {
                    request,
                    range,
                    result,
                });
            });

        match spawned {
            Ok(_) => {
                self.in_flight += 1;
                info!("render {request} requested, range {:?}", range);
            }
            Err(e) => error!("could not start map load: {e}"),
        }
    }

    /// Apply every finished load, in arrival order
    pub fn poll_renders(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: RenderOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if outcome.request != self.latest_request {
            debug!(
                "dropping render {} (range {:?}), superseded by {}",
                outcome.request, outcome.range, self.latest_request
            );
            return;
        }
        self.hover = None;
        self.scene = None;

        match outcome.result {
            Ok(datasets) => {
                let area = self.layout.map_inner;
                let scene = Scene::build(datasets, outcome.range, area.width, area.height);
                info!(
                    "map rendered: {} universities, {} markers",
                    scene.records.len(),
                    scene.markers.len()
                );
                self.scene = Some(scene);
            }
            Err(e) => error!("render aborted: {:#}", anyhow::Error::new(e)),
        }
    }

    /// Whether any load is still running
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Recompute the layout and re-rasterise for a new terminal size
    pub fn resize(&mut self, width: u16, height: u16) {
        self.layout = AppLayout::new(Rect::new(0, 0, width, height));
        self.hover = None;
        let area = self.layout.map_inner;
        if let Some(scene) = self.scene.as_mut() {
            scene.resize(area.width, area.height);
        }
    }

    /// Track the mouse: entering a marker builds its chart, leaving it
    /// drops the chart and the highlight.
    pub fn hover_at(&mut self, col: u16, row: u16) {
        let target = self.marker_under(col, row);
        if target == self.hover.as_ref().map(|h| h.marker) {
            return;
        }

        self.hover = None;
        if let (Some(index), Some(scene)) = (target, self.scene.as_ref()) {
            let marker = scene.markers[index];
            let record = scene.record(&marker);
            self.hover = Some(Hover {
                marker: index,
                chart: DetailChart::new(record),
                highlight: Highlight::for_marker(record, marker.style),
            });
        }
    }

    fn marker_under(&self, col: u16, row: u16) -> Option<usize> {
        let area = self.layout.map_inner;
        let scene = self.scene.as_ref()?;
        if col < area.x || row < area.y || col >= area.right() || row >= area.bottom() {
            return None;
        }
        scene.marker_at(col - area.x, row - area.y)
    }

    pub fn focus_next(&mut self) {
        self.range_input.toggle_focus();
    }

    pub fn type_char(&mut self, c: char) {
        self.range_input.push_char(c);
    }

    pub fn backspace(&mut self) {
        self.range_input.backspace();
    }

    /// Commit the focused input and re-render on success
    pub fn commit_input(&mut self) {
        let field = self.range_input.focus;
        match self.range_input.commit() {
            Ok(range) => self.request_render(Some(range)),
            Err(text) => warn!("ignoring non-numeric {} value {:?}", field.name(), text),
        }
    }

    /// Step the focused input and re-render
    pub fn step_input(&mut self, delta: i64) {
        let range = self.range_input.step(delta);
        self.request_render(Some(range));
    }

    /// Re-run the pipeline with the latest requested range
    pub fn reload(&mut self) {
        self.request_render(self.last_range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Source;
    use crate::view::MarkerStyle;
    use clap::Parser;
    use std::time::Duration;

    const GEOJSON: &str = r#"{"type": "FeatureCollection", "features": [{
        "type": "Feature", "properties": {"name": "Illinois"},
        "geometry": {"type": "Polygon", "coordinates":
            [[[-91.5, 37.0], [-87.5, 37.0], [-87.5, 42.5], [-91.5, 42.5], [-91.5, 37.0]]]}
    }]}"#;

    const CSV: &str = "University,Lon,Lat,Total,Director,Distinguished Professor,Professor,\
Associate Professor,Assistant Professor,Lecturer,Other\n\
A,-122.17,37.43,10,1,1,4,1,1,1,1\n\
B,-88.23,40.11,5,0,0,2,1,1,1,0\n\
C,-71.09,42.36,10,1,0,5,2,1,1,0\n";

    fn app(dir: &tempfile::TempDir) -> App {
        let boundaries = dir.path().join("states.json");
        let faculty = dir.path().join("faculty.csv");
        std::fs::write(&boundaries, GEOJSON).unwrap();
        std::fs::write(&faculty, CSV).unwrap();

        let mut config = Config::parse_from(["faculty-map"]);
        config.boundaries = Source::Path(boundaries);
        config.faculty = Source::Path(faculty);
        App::new(config, 120, 40)
    }

    fn wait_for_render(app: &mut App) {
        let outcome = app
            .outcome_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("render finished");
        app.apply_outcome(outcome);
    }

    fn screen_cell(app: &App, marker: usize) -> (u16, u16) {
        let m = app.scene.as_ref().unwrap().markers[marker];
        (app.layout.map_inner.x + m.col, app.layout.map_inner.y + m.row)
    }

    #[test]
    fn test_range_input_commit_and_swap() {
        let mut input = RangeInput::new(0, 188);
        input.toggle_focus();
        for _ in 0..3 {
            input.backspace();
        }
        input.push_char('6');
        input.push_char('x');
        assert_eq!(input.text(RangeField::Max), "6");
        assert_eq!(input.commit(), Ok(FilterRange::new(0, 6)));
        input.toggle_focus();
        input.backspace();
        input.push_char('2');
        input.push_char('0');
        assert_eq!(input.commit(), Ok(FilterRange::new(6, 20)));
    }

    #[test]
    fn test_range_input_rejects_garbage() {
        let mut input = RangeInput::new(0, 188);
        input.backspace();
        input.push_char('-');
        assert_eq!(input.commit(), Err("-".to_string()));
        assert_eq!(input.range(), FilterRange::new(0, 188));
    }

    #[test]
    fn test_range_input_step_commits() {
        let mut input = RangeInput::new(0, 188);
        input.toggle_focus();
        assert_eq!(input.step(-8), FilterRange::new(0, 180));
        assert_eq!(input.text(RangeField::Max), "180");
    }

    #[test]
    fn test_initial_render_is_unfiltered() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.request_render(None);
        assert!(app.loading());
        wait_for_render(&mut app);
        assert!(!app.loading());

        let scene = app.scene.as_ref().unwrap();
        assert_eq!(scene.records.len(), 3);
        assert_eq!(scene.range(), None);
    }

    #[test]
    fn test_rerender_replaces_map() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.request_render(None);
        wait_for_render(&mut app);
        app.reload();
        assert!(app.scene.is_none());
        wait_for_render(&mut app);

        let scene = app.scene.as_ref().unwrap();
        assert_eq!(scene.markers.len(), 3);
        assert_eq!(scene.records.len(), 3);
    }

    #[test]
    fn test_input_change_filters() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.range_input = RangeInput::new(20, 6);
        app.commit_input();
        wait_for_render(&mut app);

        let scene = app.scene.as_ref().unwrap();
        assert_eq!(scene.range(), Some(FilterRange::new(6, 20)));
        let names: Vec<_> = scene.records.iter().map(|r| r.university.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
        assert!(scene.markers.iter().all(|m| m.style == MarkerStyle::Both));
    }

    #[test]
    fn test_hover_in_and_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.request_render(Some(FilterRange::new(0, 188)));
        wait_for_render(&mut app);

        let b = app
            .scene
            .as_ref()
            .unwrap()
            .markers
            .iter()
            .position(|m| m.style == MarkerStyle::Min)
            .unwrap();
        let (col, row) = screen_cell(&app, b);
        app.hover_at(col, row);

        let hover = app.hover.as_ref().unwrap();
        assert_eq!(hover.chart.bars.len(), 7);
        assert_eq!(hover.chart.y_max, Some(2));
        let highlight = hover.highlight.as_ref().unwrap();
        assert_eq!(highlight.style, MarkerStyle::Min);
        assert!(highlight.message.starts_with("B has the smallest"));

        app.hover_at(0, 0);
        assert!(app.hover.is_none());
    }

    #[test]
    fn test_failed_load_leaves_map_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.config.faculty = Source::Path(dir.path().join("missing.csv"));
        app.request_render(None);
        wait_for_render(&mut app);
        assert!(app.scene.is_none());
        assert!(!app.loading());
    }

    #[test]
    fn test_superseded_render_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.request_render(Some(FilterRange::new(0, 50)));
        app.request_render(Some(FilterRange::new(0, 10)));
        assert!(app.scene.is_none());

        let mut outcomes: Vec<RenderOutcome> = (0..2)
            .map(|_| {
                app.outcome_rx
                    .recv_timeout(Duration::from_secs(10))
                    .expect("render finished")
            })
            .collect();
        // Newest first, then the older one arrives late
        outcomes.sort_by_key(|o| std::cmp::Reverse(o.request));
        for outcome in outcomes {
            app.apply_outcome(outcome);
        }

        assert!(!app.loading());
        let scene = app.scene.as_ref().unwrap();
        assert_eq!(scene.range(), Some(FilterRange::new(0, 10)));
        let names: Vec<_> = scene.records.iter().map(|r| r.university.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn test_older_render_arriving_first_is_not_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.request_render(Some(FilterRange::new(0, 7)));
        app.request_render(Some(FilterRange::new(6, 20)));

        let mut outcomes: Vec<RenderOutcome> = (0..2)
            .map(|_| {
                app.outcome_rx
                    .recv_timeout(Duration::from_secs(10))
                    .expect("render finished")
            })
            .collect();
        outcomes.sort_by_key(|o| o.request);
        let newest = outcomes.pop().unwrap();

        app.apply_outcome(outcomes.pop().unwrap());
        assert!(app.scene.is_none());
        assert!(app.loading());

        app.apply_outcome(newest);
        assert_eq!(
            app.scene.as_ref().unwrap().range(),
            Some(FilterRange::new(6, 20))
        );
    }
}
