//! Visual model of one render: which records are on the map, where their
//! markers sit and how each is styled. Nothing here touches the terminal;
//! `ui` draws whatever a [`Scene`] describes.

use log::debug;

use crate::data::{Datasets, FacultyRecord};
use crate::filter::{filter_records, FilterRange};
use crate::map::{AlbersUsa, MapLayers, MapRenderer};

/// Largest and smallest numeric totals in a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extremes {
    pub max: i64,
    pub min: i64,
}

impl Extremes {
    /// `None` when no record has a numeric total
    pub fn of(records: &[FacultyRecord]) -> Option<Self> {
        let mut totals = records.iter().filter_map(FacultyRecord::total);
        let first = totals.next()?;
        Some(totals.fold(Self { max: first, min: first }, |acc, t| Self {
            max: acc.max.max(t),
            min: acc.min.min(t),
        }))
    }

    /// Every record sharing an extreme value is styled as that extreme
    pub fn classify(extremes: Option<Self>, total: Option<i64>) -> MarkerStyle {
        match (extremes, total) {
            (Some(e), Some(t)) => match (t == e.max, t == e.min) {
                (true, true) => MarkerStyle::Both,
                (true, false) => MarkerStyle::Max,
                (false, true) => MarkerStyle::Min,
                (false, false) => MarkerStyle::Ordinary,
            },
            _ => MarkerStyle::Ordinary,
        }
    }
}

/// How a university marker is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Holds the largest total (red)
    Max,
    /// Holds the smallest total (blue)
    Min,
    /// Largest and smallest at once: every remaining total is equal
    Both,
    /// Dimmed
    Ordinary,
}

impl MarkerStyle {
    pub fn is_max(self) -> bool {
        matches!(self, MarkerStyle::Max | MarkerStyle::Both)
    }

    pub fn is_min(self) -> bool {
        matches!(self, MarkerStyle::Min | MarkerStyle::Both)
    }
}

/// A plotted university
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Index into [`Scene::records`]
    pub record: usize,
    /// Character cell inside the map surface
    pub col: u16,
    pub row: u16,
    pub style: MarkerStyle,
}

/// Status line shown while an extremal marker is hovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub message: String,
    pub style: MarkerStyle,
}

impl Highlight {
    /// Ordinary markers get no message
    pub fn for_marker(record: &FacultyRecord, style: MarkerStyle) -> Option<Self> {
        let claim = match style {
            MarkerStyle::Max => "the largest",
            MarkerStyle::Min => "the smallest",
            MarkerStyle::Both => "both the largest and the smallest",
            MarkerStyle::Ordinary => return None,
        };
        Some(Self {
            message: format!(
                "{} has {claim} CS faculty in the selected range! {} in total.",
                record.university, record.total
            ),
            style,
        })
    }
}

/// Place one marker per record whose coordinates project onto a surface of
/// `width` x `height` cells. Plot order follows record order.
pub fn place_markers(
    records: &[FacultyRecord],
    extremes: Option<Extremes>,
    projection: &AlbersUsa,
    width: u16,
    height: u16,
) -> Vec<Marker> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let point = projection.project(record.lon()?, record.lat()?)?;
            // Braille gives 2x4 pixels per character cell
            let (col, row) = ((point.x / 2.0).floor(), (point.y / 4.0).floor());
            if col < 0.0 || row < 0.0 || col >= width as f64 || row >= height as f64 {
                return None;
            }
            Some(Marker {
                record: index,
                col: col as u16,
                row: row as u16,
                style: Extremes::classify(extremes, record.total()),
            })
        })
        .collect()
}

/// Everything one render put on screen
pub struct Scene {
    renderer: MapRenderer,
    range: Option<FilterRange>,
    pub records: Vec<FacultyRecord>,
    pub extremes: Option<Extremes>,
    pub markers: Vec<Marker>,
    pub layers: MapLayers,
    pub width: u16,
    pub height: u16,
}

impl Scene {
    /// Filter, compute extremes, rasterise the regions and plot markers
    /// for a surface of `width` x `height` character cells.
    pub fn build(datasets: Datasets, range: Option<FilterRange>, width: u16, height: u16) -> Self {
        let records = filter_records(&datasets.records, range);
        let extremes = Extremes::of(&records);
        let renderer = MapRenderer::new(datasets.regions);
        let projection = AlbersUsa::fit(width as usize * 2, height as usize * 4);

        let layers = renderer.render(&projection, width as usize, height as usize);
        let markers = place_markers(&records, extremes, &projection, width, height);
        debug!(
            "scene: {} of {} records kept, {} markers, extremes {:?}",
            records.len(),
            datasets.records.len(),
            markers.len(),
            extremes
        );

        Self {
            renderer,
            range,
            records,
            extremes,
            markers,
            layers,
            width,
            height,
        }
    }

    /// Range this scene was filtered with, `None` for the unfiltered render
    pub fn range(&self) -> Option<FilterRange> {
        self.range
    }

    /// Re-rasterise for a new surface size; the record set is unchanged
    pub fn resize(&mut self, width: u16, height: u16) {
        let projection = AlbersUsa::fit(width as usize * 2, height as usize * 4);
        self.layers = self.renderer.render(&projection, width as usize, height as usize);
        self.markers = place_markers(&self.records, self.extremes, &projection, width, height);
        self.width = width;
        self.height = height;
    }

    /// Topmost marker at a surface cell: the one plotted last
    pub fn marker_at(&self, col: u16, row: u16) -> Option<usize> {
        self.markers
            .iter()
            .rposition(|m| m.col == col && m.row == row)
    }

    pub fn record(&self, marker: &Marker) -> &FacultyRecord {
        &self.records[marker.record]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Region;

    fn record(name: &str, lon: f64, lat: f64, total: &str) -> FacultyRecord {
        FacultyRecord {
            university: name.to_string(),
            lon: lon.to_string(),
            lat: lat.to_string(),
            total: total.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<FacultyRecord> {
        vec![
            record("A", -122.17, 37.43, "10"),
            record("B", -88.23, 40.11, "5"),
            record("C", -71.09, 42.36, "10"),
        ]
    }

    fn datasets(records: Vec<FacultyRecord>) -> Datasets {
        Datasets {
            regions: vec![Region {
                name: Some("Kansas".into()),
                polygons: vec![vec![vec![
                    (-102.0, 37.0),
                    (-94.6, 37.0),
                    (-94.6, 40.0),
                    (-102.0, 40.0),
                    (-102.0, 37.0),
                ]]],
            }],
            records,
        }
    }

    fn styles(scene: &Scene) -> Vec<(&str, MarkerStyle)> {
        scene
            .markers
            .iter()
            .map(|m| (scene.record(m).university.as_str(), m.style))
            .collect()
    }

    #[test]
    fn test_ties_at_max_are_all_red() {
        let scene = Scene::build(datasets(sample()), Some(FilterRange::new(0, 188)), 80, 30);
        assert_eq!(scene.extremes, Some(Extremes { max: 10, min: 5 }));
        assert_eq!(
            styles(&scene),
            [
                ("A", MarkerStyle::Max),
                ("B", MarkerStyle::Min),
                ("C", MarkerStyle::Max)
            ]
        );
    }

    #[test]
    fn test_single_remaining_value_is_both() {
        let scene = Scene::build(datasets(sample()), Some(FilterRange::new(6, 20)), 80, 30);
        assert_eq!(
            styles(&scene),
            [("A", MarkerStyle::Both), ("C", MarkerStyle::Both)]
        );
        assert!(scene.markers.iter().all(|m| m.style.is_max() && m.style.is_min()));
    }

    #[test]
    fn test_every_nonempty_set_has_max_and_min() {
        let scene = Scene::build(datasets(sample()), None, 80, 30);
        assert!(scene.markers.iter().any(|m| m.style.is_max()));
        assert!(scene.markers.iter().any(|m| m.style.is_min()));
    }

    #[test]
    fn test_unprojectable_records_get_no_marker() {
        let mut records = sample();
        records.push(record("Oxford", -1.25, 51.75, "50"));
        records.push(FacultyRecord {
            university: "Nowhere".into(),
            total: "3".into(),
            ..Default::default()
        });
        let scene = Scene::build(datasets(records), None, 80, 30);
        assert_eq!(scene.records.len(), 5);
        assert_eq!(scene.markers.len(), 3);
        // Off-map records still count towards the extremes
        assert_eq!(scene.extremes, Some(Extremes { max: 50, min: 3 }));
    }

    #[test]
    fn test_empty_selection_has_no_extremes() {
        let scene = Scene::build(datasets(sample()), Some(FilterRange::new(100, 188)), 80, 30);
        assert!(scene.records.is_empty());
        assert!(scene.markers.is_empty());
        assert_eq!(scene.extremes, None);
    }

    #[test]
    fn test_marker_at_prefers_last_plotted() {
        let records = vec![
            record("First", -88.23, 40.11, "5"),
            record("Second", -88.23, 40.11, "7"),
        ];
        let scene = Scene::build(datasets(records), None, 80, 30);
        let m = scene.markers[0];
        let top = scene.marker_at(m.col, m.row).unwrap();
        assert_eq!(scene.record(&scene.markers[top]).university, "Second");
        assert_eq!(scene.marker_at(0, 0), None);
    }

    #[test]
    fn test_resize_replots_markers() {
        let mut scene = Scene::build(datasets(sample()), None, 80, 30);
        let before = scene.markers.clone();
        scene.resize(40, 15);
        assert_eq!(scene.markers.len(), before.len());
        assert_eq!(scene.layers.outline.width(), 40);
        assert!(scene.markers.iter().all(|m| m.col < 40 && m.row < 15));
    }

    #[test]
    fn test_highlight_messages() {
        let r = record("A", 0.0, 0.0, "10");
        let max = Highlight::for_marker(&r, MarkerStyle::Max).unwrap();
        assert_eq!(
            max.message,
            "A has the largest CS faculty in the selected range! 10 in total."
        );
        let min = Highlight::for_marker(&r, MarkerStyle::Min).unwrap();
        assert!(min.message.contains("the smallest"));
        let both = Highlight::for_marker(&r, MarkerStyle::Both).unwrap();
        assert!(both.message.contains("both the largest and the smallest"));
        assert!(Highlight::for_marker(&r, MarkerStyle::Ordinary).is_none());
    }
}
