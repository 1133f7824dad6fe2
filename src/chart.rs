use crate::data::{FacultyRecord, Rank};

/// One bar of the detail chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartBar {
    pub rank: Rank,
    pub label: &'static str,
    /// `None` when the cell is not a number
    pub value: Option<i64>,
}

/// Per-rank breakdown for the hovered university.
///
/// Built fresh on every hover-in and dropped on hover-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailChart {
    pub title: String,
    pub bars: Vec<ChartBar>,
    /// Upper bound of the linear Y axis (which starts at 0); `None` when no
    /// bar has a numeric value
    pub y_max: Option<i64>,
}

impl DetailChart {
    pub const X_CAPTION: &'static str = "Positions";
    pub const Y_CAPTION: &'static str = "Member Count";

    pub fn new(record: &FacultyRecord) -> Self {
        let bars: Vec<ChartBar> = Rank::ALL
            .iter()
            .map(|&rank| ChartBar {
                rank,
                label: rank.label(),
                value: record.rank_count(rank),
            })
            .collect();
        let y_max = bars.iter().filter_map(|b| b.value).max();

        Self {
            title: format!(
                "{} CS Faculty {} Members in Total",
                record.university, record.total
            ),
            bars,
            y_max,
        }
    }
}
