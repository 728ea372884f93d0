//! CLI entry point for the data quality audit.

use anyhow::Result;
use clap::Parser;
use rewards_audit::{AuditConfig, AuditReport, load_sources};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Data quality audit for receipt, user and brand exports",
    long_about = "Reads receipts.json, users.json and brands.json (one JSON object per line)\n\
                  from the working directory and reports missing values, implausible\n\
                  dates, orphaned receipts, negative amounts and duplicate records.\n\n\
                  A source that cannot be read is treated as empty. There are no options;\n\
                  set RUST_LOG (e.g. RUST_LOG=debug) to change log verbosity."
)]
struct Args {}

/// Initialize the tracing subscriber for logging.
///
/// The level comes from `RUST_LOG` and defaults to `info`.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let config = AuditConfig::default();
    config.validate()?;

    info!("Loading data files from {}", config.data_dir.display());
    let sources = load_sources(&config);

    let report = AuditReport::build(&sources, chrono::Local::now().naive_local());

    // Results go to stdout regardless of log level.
    print!("\n{}", report.render_text());

    Ok(())
}

fn main() -> ExitCode {
    let _args = Args::parse();
    init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("An unexpected error occurred: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
