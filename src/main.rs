use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use survey::{Session, DEFAULT_RESULTS_FILE};

/// Summarises daily traffic survey files and appends the results to a report.
#[derive(Parser)]
struct Args {
    /// Directory holding the traffic_dataDDMMYYYY.csv files.
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
    /// Cumulative report the summaries are appended to.
    #[arg(long, default_value = DEFAULT_RESULTS_FILE)]
    results: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    info!(
        "reading surveys from {}, saving to {}",
        args.data_dir.display(),
        args.results.display()
    );

    let stdin = io::stdin();
    let mut session = Session::new(stdin.lock(), io::stdout(), args.data_dir, args.results);
    session.run().context("console session failed")
}
