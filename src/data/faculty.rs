use serde::Deserialize;

use crate::error::LoadError;

/// Academic rank buckets, in chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Director,
    DistinguishedProfessor,
    Professor,
    AssociateProfessor,
    AssistantProfessor,
    Lecturer,
    Other,
}

impl Rank {
    pub const ALL: [Rank; 7] = [
        Rank::Director,
        Rank::DistinguishedProfessor,
        Rank::Professor,
        Rank::AssociateProfessor,
        Rank::AssistantProfessor,
        Rank::Lecturer,
        Rank::Other,
    ];

    /// Column name in the faculty table
    pub fn column(self) -> &'static str {
        match self {
            Rank::Director => "Director",
            Rank::DistinguishedProfessor => "Distinguished Professor",
            Rank::Professor => "Professor",
            Rank::AssociateProfessor => "Associate Professor",
            Rank::AssistantProfessor => "Assistant Professor",
            Rank::Lecturer => "Lecturer",
            Rank::Other => "Other",
        }
    }

    /// Bar label in the detail chart
    pub fn label(self) -> &'static str {
        match self {
            Rank::AssociateProfessor => "AP",
            other => other.column(),
        }
    }

    /// Position in [`Rank::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One row of the faculty table.
///
/// Values are kept as the source text; the accessors parse on use so a
/// malformed cell only blanks out the marker or bar that reads it.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FacultyRecord {
    #[serde(rename = "University")]
    pub university: String,
    #[serde(rename = "Lon")]
    pub lon: String,
    #[serde(rename = "Lat")]
    pub lat: String,
    #[serde(rename = "Total")]
    pub total: String,
    #[serde(rename = "Director", default)]
    pub director: String,
    #[serde(rename = "Distinguished Professor", default)]
    pub distinguished_professor: String,
    #[serde(rename = "Professor", default)]
    pub professor: String,
    #[serde(rename = "Associate Professor", default)]
    pub associate_professor: String,
    #[serde(rename = "Assistant Professor", default)]
    pub assistant_professor: String,
    #[serde(rename = "Lecturer", default)]
    pub lecturer: String,
    #[serde(rename = "Other", default)]
    pub other: String,
}

impl FacultyRecord {
    /// Faculty total, `None` when the cell is not a number
    pub fn total(&self) -> Option<i64> {
        parse_int(&self.total)
    }

    pub fn lon(&self) -> Option<f64> {
        parse_coord(&self.lon)
    }

    pub fn lat(&self) -> Option<f64> {
        parse_coord(&self.lat)
    }

    /// Raw cell for a rank column
    pub fn rank_text(&self, rank: Rank) -> &str {
        match rank {
            Rank::Director => &self.director,
            Rank::DistinguishedProfessor => &self.distinguished_professor,
            Rank::Professor => &self.professor,
            Rank::AssociateProfessor => &self.associate_professor,
            Rank::AssistantProfessor => &self.assistant_professor,
            Rank::Lecturer => &self.lecturer,
            Rank::Other => &self.other,
        }
    }

    pub fn rank_count(&self, rank: Rank) -> Option<i64> {
        parse_int(self.rank_text(rank))
    }
}

/// Leading-integer parse: optional sign, then digits; anything after the
/// digits is ignored. `"12abc"` is 12, `"10.5"` is 10, `"abc"` is `None`.
/// Digit runs that overflow `i64` are also `None`.
pub fn parse_int(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Coordinate parse; blank or non-numeric cells are `None`
pub fn parse_coord(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decode the faculty CSV (header row, columns matched by name)
pub fn read_faculty_csv(bytes: &[u8]) -> Result<Vec<FacultyRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let mut records = Vec::new();
    for row in reader.deserialize::<FacultyRecord>() {
        records.push(row?);
    }
    Ok(records)
}
