//! Build the faculty table from a raw per-professor listing.
//!
//! The raw CSV has one row per (professor, position, affiliation) and two
//! trailing columns that are not used. Rows are bucketed into [`Rank`]s per
//! university, duplicates dropped, and each university geocoded once.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::Rank;

/// Map a free-text position title to a rank; `None` for an empty title
pub fn classify_position(raw: &str) -> Option<Rank> {
    if raw.is_empty() {
        return None;
    }
    let has = |needle: &str| raw.contains(needle);

    let rank = if has("Dean") || has("Chair") || has("Director") {
        Rank::Director
    } else if has("Distinguished Professor") || has("DistinguishedProfessor") {
        Rank::DistinguishedProfessor
    } else if has("Professor")
        && !has("Associate Professor")
        && !has("AssociateProfessor")
        && !has("Assistant Professor")
        && !has("AssistantProfessor")
    {
        Rank::Professor
    } else if has("Associate Professor") || has("AssociateProfessor") {
        Rank::AssociateProfessor
    } else if has("Assistant Professor") || has("AssistantProfessor") {
        Rank::AssistantProfessor
    } else if has("Lecturer") {
        Rank::Lecturer
    } else {
        Rank::Other
    };
    Some(rank)
}

#[derive(Deserialize)]
struct Affiliation {
    name: String,
}

/// Per-university rank counts, in first-seen order
#[derive(Debug, Default)]
pub struct FacultyTally {
    universities: Vec<(String, [u32; 7])>,
    index: HashMap<String, usize>,
    seen: HashMap<String, HashSet<String>>,
}

impl FacultyTally {
    /// Count one professor. Returns false if the row was skipped (empty
    /// position, or the professor is already counted for that university).
    pub fn add(&mut self, professor: &str, position: &str, university: &str) -> bool {
        let Some(rank) = classify_position(position) else {
            return false;
        };
        let professor = professor.trim();

        let seen = self.seen.entry(university.to_string()).or_default();
        if !seen.insert(professor.to_string()) {
            return false;
        }

        let slot = match self.index.get(university) {
            Some(&slot) => slot,
            None => {
                self.universities.push((university.to_string(), [0; 7]));
                let slot = self.universities.len() - 1;
                self.index.insert(university.to_string(), slot);
                slot
            }
        };
        self.universities[slot].1[rank.index()] += 1;
        true
    }

    pub fn universities(&self) -> impl Iterator<Item = (&str, &[u32; 7])> {
        self.universities.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    pub fn len(&self) -> usize {
        self.universities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universities.is_empty()
    }
}

/// Read the raw listing (header row first, exactly five columns)
pub fn tally_raw<R: Read>(reader: R) -> Result<FacultyTally> {
    let mut csv = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut tally = FacultyTally::default();
    let mut skipped = 0usize;

    for (row_no, row) in csv.records().enumerate() {
        let row = row.with_context(|| format!("raw CSV row {row_no}"))?;
        if row.len() != 5 {
            bail!("raw CSV row {row_no}: expected 5 columns, found {}", row.len());
        }
        let affiliation: Affiliation = serde_json::from_str(&row[2])
            .with_context(|| format!("raw CSV row {row_no}: bad affiliation {:?}", &row[2]))?;

        if !tally.add(&row[0], &row[1], &affiliation.name) {
            skipped += 1;
        }
    }

    info!("tallied {} universities ({skipped} rows skipped)", tally.len());
    Ok(tally)
}

/// Looks up coordinates for a university name
pub trait Geocoder {
    /// Returns `(lat, lon)`
    fn locate(&self, query: &str) -> Result<(f64, f64)>;
}

const ARCGIS_URL: &str =
    "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer/findAddressCandidates";

/// ArcGIS World geocoding service
pub struct ArcGisGeocoder {
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct CandidateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    location: Location,
}

#[derive(Deserialize)]
struct Location {
    x: f64,
    y: f64,
}

impl ArcGisGeocoder {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("faculty-map/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl Geocoder for ArcGisGeocoder {
    fn locate(&self, query: &str) -> Result<(f64, f64)> {
        let url = reqwest::Url::parse_with_params(
            ARCGIS_URL,
            &[("SingleLine", query), ("f", "json"), ("maxLocations", "1")],
        )?;
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .with_context(|| format!("geocoding {query:?}"))?;

        let response: CandidateResponse = serde_json::from_str(&body)
            .with_context(|| format!("decoding geocoder answer for {query:?}"))?;
        let best = response
            .candidates
            .first()
            .with_context(|| format!("no location found for {query:?}"))?;
        debug!("{query} -> ({}, {})", best.location.y, best.location.x);
        Ok((best.location.y, best.location.x))
    }
}

/// Output row; field order is the column order
#[derive(Serialize)]
struct OutputRow<'a> {
    #[serde(rename = "University")]
    university: &'a str,
    #[serde(rename = "Director")]
    director: u32,
    #[serde(rename = "Distinguished Professor")]
    distinguished_professor: u32,
    #[serde(rename = "Professor")]
    professor: u32,
    #[serde(rename = "Associate Professor")]
    associate_professor: u32,
    #[serde(rename = "Assistant Professor")]
    assistant_professor: u32,
    #[serde(rename = "Lecturer")]
    lecturer: u32,
    #[serde(rename = "Other")]
    other: u32,
    #[serde(rename = "Total")]
    total: u32,
    #[serde(rename = "Lat")]
    lat: f64,
    #[serde(rename = "Lon")]
    lon: f64,
}

/// Geocode every university and write the faculty table
pub fn write_faculty_table<W: Write>(
    tally: &FacultyTally,
    geocoder: &dyn Geocoder,
    writer: W,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    for (university, counts) in tally.universities() {
        let (lat, lon) = geocoder.locate(university)?;
        let [director, distinguished_professor, professor, associate_professor, assistant_professor, lecturer, other] =
            *counts;
        csv.serialize(OutputRow {
            university,
            director,
            distinguished_professor,
            professor,
            associate_professor,
            assistant_professor,
            lecturer,
            other,
            total: counts.iter().sum(),
            lat,
            lon,
        })?;
    }

    csv.flush()?;
    Ok(())
}
