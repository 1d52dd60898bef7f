//! prismerge - consolidate space-time observations into query volumes.
//!
//! Reads a CSV of observations, wraps each in a buffered space-time prism,
//! greedily merges overlapping prisms into a smaller set of axis-aligned
//! volumes, and writes the result as GeoJSON plus a tabular CSV.
//!
//! # Usage
//!
//! ```bash
//! prismerge -f data/observations.csv --lat 1 --lon 2 --time 3 --name 0 \
//!     -n survey -j "consolidating the may survey" -c 500 -r
//! ```

use std::path::PathBuf;
use std::process;

use clap::Parser;

use prismerge::engine::GreedyMerger;
use prismerge::error::Result;
use prismerge::generator;
use prismerge::ids::UuidIds;
use prismerge::ingest::{self, ColumnMap};
use prismerge::output::{self, RunReport};
use prismerge::Buffers;

#[derive(Parser, Debug)]
#[command(
    name = "prismerge",
    version,
    about = "Greedy consolidation of space-time observations into query volumes"
)]
struct Cli {
    /// CSV file containing latitude, longitude, timestamp, and name columns
    #[arg(long, short = 'f')]
    file_path: PathBuf,

    /// 0-based position of the latitude column
    #[arg(long)]
    lat: usize,

    /// 0-based position of the longitude column
    #[arg(long)]
    lon: usize,

    /// 0-based position of the timestamp column (epoch seconds or ISO-8601)
    #[arg(long)]
    time: usize,

    /// 0-based position of the name column
    #[arg(long)]
    name: usize,

    /// Name of the job; output files are named after it
    #[arg(long, short = 'n')]
    job_name: String,

    /// Justification for running the search, recorded on every result row
    #[arg(long, short = 'j')]
    justification: String,

    /// Merge coefficient: how much extra merged volume to tolerate
    #[arg(long, short = 'c', default_value_t = 0.0)]
    coef: f64,

    /// Temporal buffer around each observation, in seconds
    #[arg(long, short = 't', default_value_t = 1800.0)]
    temporal_buffer: f64,

    /// Distance buffer around each observation, in meters
    #[arg(long, short = 'd', default_value_t = 100.0)]
    distance_buffer: f64,

    /// Print a summary and write a JSON run report
    #[arg(long, short = 'r')]
    report: bool,

    /// Directory for the output files
    #[arg(long, short = 'o', default_value = ".")]
    output_path: PathBuf,
}

fn run(cli: &Cli) -> Result<()> {
    let columns = ColumnMap::new(cli.lat, cli.lon, cli.time, cli.name);
    log::info!("loading data from {}", cli.file_path.display());
    let observations = ingest::read_observations(&cli.file_path, columns)?;

    let buffers = Buffers::symmetric(cli.distance_buffer, cli.temporal_buffer);
    let mut ids = UuidIds::new();
    let prisms = generator::prisms_from_observations(&observations, buffers, &mut ids)?;

    log::info!("running greedy merge with coef {}", cli.coef);
    let outcome = GreedyMerger::new()
        .with_coef(cli.coef)
        .run(generator::boxes_from_prisms(&prisms))?;
    let merged = generator::prisms_from_boxes(outcome.boxes())?;

    std::fs::create_dir_all(&cli.output_path)?;
    let geojson_path = cli.output_path.join(format!("{}.geojson", cli.job_name));
    let csv_path = cli.output_path.join(format!("{}.csv", cli.job_name));
    output::write_geojson(&geojson_path, &merged)?;
    output::write_results_csv(&csv_path, &merged, &cli.justification, &cli.job_name)?;

    if cli.report {
        let report = RunReport::new(&cli.job_name, &prisms, &outcome);
        let report_path = cli.output_path.join(format!("{}_report.json", cli.job_name));
        report.write_json(&report_path)?;
        println!("{}", report.summary());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.file_path.exists() {
        eprintln!("invalid file: {}", cli.file_path.display());
        process::exit(1);
    }

    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
