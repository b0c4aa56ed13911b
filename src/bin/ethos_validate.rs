//! Single-purpose command validator.
//!
//! Usage: `ethos-validate "<command_to_validate>"`

use clap::Parser;
use quanta_ethos::cli::{load, validate_to_json};
use quanta_ethos::telemetry::init_tracing;
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser, Debug)]
#[command(name = "ethos-validate", version, about = "Validate a command against the trust policy")]
struct Args {
    /// Command text to validate
    command: String,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    init_tracing("warn");

    let args = Args::parse();
    let result = load(args.config.as_deref()).and_then(|config| validate_to_json(&config, &args.command));
    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit(1);
        }
    }
}
