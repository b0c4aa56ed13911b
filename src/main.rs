// QuantaEthos - main.rs
// Server and validator entry point

use clap::Parser;
use quanta_ethos::cli::{dispatch, Cli};
use quanta_ethos::telemetry::{init_tracing, DEFAULT_FILTER};
use std::process::exit;

fn main() {
    init_tracing(DEFAULT_FILTER);

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {e:#}");
        exit(1);
    }
}
