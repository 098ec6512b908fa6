use std::path::Path;

use crate::domain::scenario::study::StudyReport;
use crate::error::Result;
use crate::loader::parser::parse_scenario_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads a scenario file and runs all of its studies, writing the CSV files into `output_dir`.
pub fn run_scenario_file(file_path: impl AsRef<Path>, output_dir: impl AsRef<Path>, force_flow_interval_as_cmi: bool) -> Result<Vec<StudyReport>> {
    let mut scenario = parse_scenario_file(file_path)?;
    log::info!("Scenario '{}' constructed successfully.", scenario.name);

    let reports = scenario.run_studies(output_dir.as_ref(), force_flow_interval_as_cmi)?;
    log::info!("Scenario '{}' finished, {} studies run.", scenario.name, reports.len());

    Ok(reports)
}
