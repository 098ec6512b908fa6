use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use tsn_cbs_latency::{logger, run_scenario_file};

/// Worst-case latency bounds of credit-based shaped streams.
#[derive(Parser, Debug)]
#[command(name = "tsn-cbs-latency")]
#[command(about = "Run the studies of a scenario file and append the bounds to CSV files")]
struct Args {
    /// Scenario JSON file
    scenario: PathBuf,

    /// Directory the study output files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Use each flow's period as CMI in every study
    #[arg(long)]
    flow_interval_as_cmi: bool,

    /// Log level (error, warn, info, debug, trace). Falls back to RUST_LOG.
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// Print the per-flow bounds of every study as JSON to stdout
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.log_level);

    let reports = run_scenario_file(&args.scenario, &args.output_dir, args.flow_interval_as_cmi)
        .with_context(|| format!("Scenario '{}' failed", args.scenario.display()))?;

    for report in &reports {
        if !report.failed_flows.is_empty() {
            log::warn!("Study '{}': {} flow(s) without result.", report.name, report.failed_flows.len());
        }
    }

    if args.summary {
        println!("{}", serde_json::to_string_pretty(&reports).context("Failed to serialize the study reports")?);
    }

    Ok(())
}
