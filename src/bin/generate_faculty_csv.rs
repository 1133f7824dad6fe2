//! Turn the raw per-professor listing into the faculty table the map reads.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use faculty_map::config::DEFAULT_FACULTY;
use faculty_map::generate::{tally_raw, write_faculty_table, ArcGisGeocoder};
use log::info;

/// Count faculty per university by position and geocode each university
#[derive(Debug, Parser)]
#[command(name = "generate-faculty-csv", version)]
struct Args {
    /// Raw listing: name, position, affiliation JSON, and two unused columns
    #[arg(long, default_value = "us_cs_faculty_raw_data.csv")]
    raw: PathBuf,

    /// Where to write the faculty table
    #[arg(long, default_value = DEFAULT_FACULTY)]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let raw = File::open(&args.raw)
        .with_context(|| format!("opening {}", args.raw.display()))?;
    let tally = tally_raw(raw)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let output = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let geocoder = ArcGisGeocoder::new()?;
    write_faculty_table(&tally, &geocoder, BufWriter::new(output))?;

    info!(
        "wrote {} universities to {}",
        tally.len(),
        args.output.display()
    );
    Ok(())
}
