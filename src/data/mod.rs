pub mod faculty;
pub mod topology;

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use geojson::{GeoJson, Geometry, Value};
use log::{debug, info};

use crate::error::LoadError;
use crate::map::{Region, Ring};
pub use faculty::{FacultyRecord, Rank};
use topology::Topology;

/// Where a dataset comes from: a URL or a local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl FromStr for Source {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Source::Url(s.to_string()))
        } else {
            Ok(Source::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Source {
    /// Fetch the raw bytes behind this source
    pub fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        let bytes = match self {
            Source::Url(url) => fetch_url(url)?,
            Source::Path(path) => std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?,
        };
        debug!("fetched {} bytes from {}", bytes.len(), self);
        Ok(bytes)
    }
}

/// No request timeout: a fetch that never answers leaves its render pending
fn fetch_url(url: &str) -> Result<Vec<u8>, LoadError> {
    let http = |source| LoadError::Http {
        url: url.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(Option::<Duration>::None)
        .build()
        .map_err(http)?;
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(http)?;
    Ok(response.bytes().map_err(http)?.to_vec())
}

/// Both datasets a render needs
#[derive(Debug, Clone)]
pub struct Datasets {
    pub regions: Vec<Region>,
    pub records: Vec<FacultyRecord>,
}

/// Fetch and decode the boundary and faculty datasets concurrently.
/// Both must succeed; either failure fails the whole load.
pub fn load(boundaries: &Source, object: &str, faculty: &Source) -> Result<Datasets, LoadError> {
    let (regions, records) = rayon::join(
        || load_regions(boundaries, object),
        || load_faculty(faculty),
    );
    let datasets = Datasets {
        regions: regions?,
        records: records?,
    };
    info!(
        "loaded {} regions and {} universities",
        datasets.regions.len(),
        datasets.records.len()
    );
    Ok(datasets)
}

/// Fetch and decode boundary regions from TopoJSON or GeoJSON
pub fn load_regions(source: &Source, object: &str) -> Result<Vec<Region>, LoadError> {
    decode_regions(&source.fetch()?, object)
}

/// Fetch and decode the faculty table
pub fn load_faculty(source: &Source) -> Result<Vec<FacultyRecord>, LoadError> {
    faculty::read_faculty_csv(&source.fetch()?)
}

#[derive(serde::Deserialize)]
struct TypeProbe {
    #[serde(rename = "type")]
    kind: String,
}

/// Decode boundary bytes. TopoJSON documents go through `object`;
/// anything else is read as GeoJSON.
pub fn decode_regions(bytes: &[u8], object: &str) -> Result<Vec<Region>, LoadError> {
    let mut scratch = bytes.to_vec();
    let probe: TypeProbe = simd_json::serde::from_slice(&mut scratch)?;

    let geojson = if probe.kind == "Topology" {
        GeoJson::FeatureCollection(Topology::from_slice(bytes)?.feature_collection(object)?)
    } else {
        std::str::from_utf8(bytes)?.parse::<GeoJson>()?
    };

    Ok(regions_from_geojson(&geojson))
}

/// Extract one region per feature, keeping polygonal geometry only
pub fn regions_from_geojson(geojson: &GeoJson) -> Vec<Region> {
    let mut regions = Vec::new();

    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    let name = feature
                        .property("name")
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    regions.push(region_from_geometry(name, geometry));
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                let name = f.property("name").and_then(|v| v.as_str()).map(str::to_string);
                regions.push(region_from_geometry(name, geometry));
            }
        }
        GeoJson::Geometry(geometry) => {
            regions.push(region_from_geometry(None, geometry));
        }
    }

    regions.retain(|r| !r.polygons.is_empty());
    regions
}

fn region_from_geometry(name: Option<String>, geometry: &Geometry) -> Region {
    let mut polygons = Vec::new();
    collect_polygons(geometry, &mut polygons);
    Region { name, polygons }
}

fn collect_polygons(geometry: &Geometry, polygons: &mut Vec<Vec<Ring>>) {
    let to_ring = |coords: &Vec<Vec<f64>>| -> Ring {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::Polygon(rings) => {
            polygons.push(rings.iter().map(to_ring).collect());
        }
        Value::MultiPolygon(multi) => {
            for rings in multi {
                polygons.push(rings.iter().map(to_ring).collect());
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, polygons);
            }
        }
        _ => {}
    }
}
