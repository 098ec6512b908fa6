use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::api::scenario_dto::ScenarioDto;
use crate::domain::scenario::Scenario;
use crate::error::Result;

/// Parses a JSON file into a given type `T`.
///
/// Errors are converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    let parsed_data: T = serde_json::from_str(&data)?;

    Ok(parsed_data)
}

/// Reads a scenario file and builds the network it describes, paths included.
pub fn parse_scenario_file(file_path: impl AsRef<Path>) -> Result<Scenario> {
    let file_path = file_path.as_ref();
    let dto: ScenarioDto = parse_json_file(file_path)?;
    log::info!("Loaded scenario '{}' from {}.", dto.name, file_path.display());

    Scenario::try_from(dto)
}
