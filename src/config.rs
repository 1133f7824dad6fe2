use std::path::PathBuf;

use clap::Parser;

use crate::data::Source;

pub const DEFAULT_BOUNDARIES: &str = "https://cdn.jsdelivr.net/npm/us-atlas@3/states-10m.json";
pub const DEFAULT_FACULTY: &str = "csv_generated/us_cs_faculty.csv";

/// Interactive terminal map of US computer-science faculty by university
#[derive(Debug, Clone, Parser)]
#[command(name = "faculty-map", version)]
pub struct Config {
    /// State boundaries: TopoJSON or GeoJSON, URL or file path
    #[arg(long, env = "FACULTY_MAP_BOUNDARIES", default_value = DEFAULT_BOUNDARIES)]
    pub boundaries: Source,

    /// TopoJSON object holding the state geometries
    #[arg(long, default_value = "states")]
    pub object: String,

    /// Faculty table (CSV), URL or file path
    #[arg(long, env = "FACULTY_MAP_FACULTY", default_value = DEFAULT_FACULTY)]
    pub faculty: Source,

    /// Initial value of the minimum-size input
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub min: i64,

    /// Initial value of the maximum-size input
    #[arg(long, default_value_t = 188, allow_negative_numbers = true)]
    pub max: i64,

    /// Log file (the terminal is taken by the UI)
    #[arg(long, env = "FACULTY_MAP_LOG", default_value = "faculty-map.log")]
    pub log_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["faculty-map"]);
        assert_eq!(config.boundaries, Source::Url(DEFAULT_BOUNDARIES.into()));
        assert_eq!(config.faculty, Source::Path(DEFAULT_FACULTY.into()));
        assert_eq!(config.object, "states");
        assert_eq!((config.min, config.max), (0, 188));
    }

    #[test]
    fn test_overrides() {
        let config = Config::parse_from([
            "faculty-map",
            "--boundaries",
            "data/states.json",
            "--min",
            "20",
            "--max",
            "-5",
        ]);
        assert_eq!(config.boundaries, Source::Path("data/states.json".into()));
        assert_eq!((config.min, config.max), (20, -5));
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
