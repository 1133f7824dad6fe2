use std::path::PathBuf;

use thiserror::Error;

/// Why a render's data load was abandoned.
///
/// Any of these aborts the whole render: the loader never hands a partial
/// dataset to the map.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed boundary JSON: {0}")]
    Json(#[from] simd_json::Error),

    #[error("malformed GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("boundary data is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed faculty table: {0}")]
    Csv(#[from] csv::Error),

    #[error("topology has no object named `{0}`")]
    MissingObject(String),

    #[error("topology references arc {index} but only {count} arcs exist")]
    ArcIndex { index: i64, count: usize },
}
