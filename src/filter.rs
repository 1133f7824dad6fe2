use crate::data::FacultyRecord;

/// Inclusive bounds on a university's faculty total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRange {
    min: i64,
    max: i64,
}

impl FilterRange {
    /// Build a range, swapping the bounds if they arrive inverted
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn contains(&self, total: i64) -> bool {
        (self.min..=self.max).contains(&total)
    }

    /// Whether a record's total falls inside; non-numeric totals never do
    pub fn matches(&self, record: &FacultyRecord) -> bool {
        record.total().is_some_and(|t| self.contains(t))
    }
}

/// Records inside `range`, in input order. With no range every record is
/// kept.
pub fn filter_records(records: &[FacultyRecord], range: Option<FilterRange>) -> Vec<FacultyRecord> {
    match range {
        Some(range) => records.iter().filter(|r| range.matches(r)).cloned().collect(),
        None => records.to_vec(),
    }
}
