use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::analysis::latency_analysis::EndToEndResults;
use crate::domain::cbs::delay_bounds::{Algorithm, DelayBounds};
use crate::domain::network::{Network, flow::Flow};
use crate::error::Result;

/// Appends result rows to a CSV file.
///
/// Every row starts with the execution time and the flow label, followed by one field per
/// requested column. A column is filled from the caller's metadata if it has a value under that
/// name, otherwise with the bound of the formula of that name (6 decimals), otherwise left empty.
///
/// The header is only written when the file is new or empty, so several runs can append to the
/// same file.
#[derive(Debug, Clone)]
pub struct ResultCsvWriter {
    file_name: PathBuf,
    columns: Vec<String>,
}

impl ResultCsvWriter {
    pub fn new(file_name: impl Into<PathBuf>, columns: Vec<String>) -> Self {
        Self { file_name: file_name.into(), columns }
    }

    /// Columns for all formulas, in result order.
    pub fn all_algorithm_columns() -> Vec<String> {
        Algorithm::ALL.iter().map(|algorithm| algorithm.column_name().to_string()).collect()
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["ExecutionTime".to_string(), "Flow".to_string()];
        header.extend(self.columns.iter().cloned());
        header
    }

    pub fn result_line(&self, timestamp: &str, flow: &Flow, bounds: &DelayBounds, metadata: &BTreeMap<String, String>) -> Vec<String> {
        let mut line = vec![timestamp.to_string(), flow.label()];

        for column in &self.columns {
            let field = if let Some(value) = metadata.get(column) {
                value.clone()
            } else if let Ok(algorithm) = column.parse::<Algorithm>() {
                format!("{:.6}", bounds.get(algorithm))
            } else {
                String::new()
            };
            line.push(field);
        }
        line
    }

    /// Appends one row per successful flow. Failed flows are skipped with a warning.
    /// Returns the number of rows written.
    pub fn write(&self, network: &Network, results: &EndToEndResults, metadata: &BTreeMap<String, String>) -> Result<usize> {
        let write_header = match std::fs::metadata(&self.file_name) {
            Ok(existing) => existing.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new().create(true).append(true).open(&self.file_name)?;
        let mut csv_wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if write_header {
            csv_wtr.write_record(self.header())?;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string();
        let mut rows = 0;
        for (flow_id, result) in results {
            let Some(flow) = network.flow(*flow_id) else {
                log::warn!("Result for unknown flow {:?} dropped.", flow_id);
                continue;
            };

            match result {
                Ok(bounds) => {
                    csv_wtr.write_record(self.result_line(&timestamp, flow, bounds, metadata))?;
                    rows += 1;
                }
                Err(e) => log::warn!("No CSV row for {}: {}", flow.label(), e),
            }
        }

        csv_wtr.flush()?;
        log::info!("Wrote {} result rows to '{}'.", rows, self.file_name.display());
        Ok(rows)
    }
}
