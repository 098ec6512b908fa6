use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::analysis::csv_export::ResultCsvWriter;
use crate::domain::analysis::latency_analysis::NetworkLatencyAnalysis;
use crate::domain::cbs::delay_bounds::DelayBounds;
use crate::domain::network::flow::Flow;
use crate::domain::scenario::Scenario;
use crate::domain::utils::id::{FlowId, LinkId, NodeId};
use crate::error::{Error, Result};

/// How a study sets the idle slopes before the analysis runs.
#[derive(Debug, Clone, PartialEq)]
pub enum IdleSlopeAssignment {
    /// Idle slopes stay as configured on the links or left by the previous study.
    Keep,

    /// The same idle slope on every listed link.
    Uniform { idle_slope: f64, links: Vec<(NodeId, NodeId)> },

    /// Idle slopes derived from the flows crossing each link, using the configured CMI.
    FromFlows,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueProbe {
    pub flow: FlowId,
    pub link: LinkId,
    pub metadata: BTreeMap<String, String>,
}

/// One analysis pass over a scenario, appending its rows to `output_file`.
#[derive(Debug, Clone, PartialEq)]
pub struct Study {
    pub name: String,
    pub output_file: PathBuf,
    pub result_columns: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub idle_slope: IdleSlopeAssignment,
    pub use_flow_interval_as_cmi: bool,
    pub queue_probes: Vec<QueueProbe>,

    /// Removes an existing output file before the study writes to it.
    pub truncate_output: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub flow: String,
    pub link: String,
    pub bounds: DelayBounds,
}

/// What a study produced, keyed by flow label.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyReport {
    pub name: String,
    pub output_file: PathBuf,
    pub rows_written: usize,
    pub over_reserved_links: usize,
    pub flows: BTreeMap<String, DelayBounds>,
    pub failed_flows: BTreeMap<String, String>,
    pub queue_probes: Vec<ProbeReport>,

    /// Queue probes that could not be evaluated, keyed by `<flow>@<link>`.
    pub failed_probes: BTreeMap<String, String>,
}

impl Scenario {
    /// Runs all studies in order. Idle slopes set by a study stay in place for the next one.
    ///
    /// Output files are resolved against `output_dir`. `force_flow_interval_as_cmi` analyses every
    /// study with the flow periods as CMI, whatever the study says.
    pub fn run_studies(&mut self, output_dir: &Path, force_flow_interval_as_cmi: bool) -> Result<Vec<StudyReport>> {
        let mut reports = Vec::with_capacity(self.studies.len());

        for study in &self.studies {
            log::info!("Running study '{}' of scenario '{}'.", study.name, self.name);
            reports.push(study.run(&mut self.analysis, output_dir, force_flow_interval_as_cmi)?);
        }
        Ok(reports)
    }
}

impl Study {
    pub fn run(&self, analysis: &mut NetworkLatencyAnalysis, output_dir: &Path, force_flow_interval_as_cmi: bool) -> Result<StudyReport> {
        let output_file = output_dir.join(&self.output_file);
        if self.truncate_output && output_file.exists() {
            fs::remove_file(&output_file)?;
            log::debug!("Removed old results in '{}'.", output_file.display());
        }

        let over_reserved_links = self.apply_idle_slopes(analysis)?;

        let use_flow_interval_as_cmi = self.use_flow_interval_as_cmi || force_flow_interval_as_cmi;
        let results = analysis.calculate_end_to_end_delays(use_flow_interval_as_cmi);

        let writer = ResultCsvWriter::new(&output_file, self.result_columns.clone());
        let mut rows_written = writer.write(&analysis.network, &results, &self.metadata)?;

        let mut report = StudyReport { name: self.name.clone(), output_file, over_reserved_links, ..StudyReport::default() };
        for (flow_id, result) in results {
            let Some(flow) = analysis.network.flow(flow_id) else {
                continue;
            };
            match result {
                Ok(bounds) => {
                    report.flows.insert(flow.label(), bounds);
                }
                Err(e) => {
                    report.failed_flows.insert(flow.label(), e.to_string());
                }
            }
        }

        for probe in &self.queue_probes {
            let label = probe_label(analysis, probe);
            let (flow, link_label) = match probe_target(analysis, probe) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!(study = %self.name, probe = %label, error = %e, "Queue probe skipped");
                    report.failed_probes.insert(label, e.to_string());
                    continue;
                }
            };

            let bounds = match analysis.calculate_queue_delay_for_link(probe.link, &flow, None) {
                Ok(bounds) => bounds,
                Err(e) => {
                    tracing::warn!(study = %self.name, probe = %label, error = %e, "Queue delay could not be calculated");
                    report.failed_probes.insert(label, e.to_string());
                    continue;
                }
            };

            let mut metadata = self.metadata.clone();
            metadata.extend(probe.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
            rows_written += writer.write(&analysis.network, &BTreeMap::from([(probe.flow, Ok(bounds))]), &metadata)?;

            report.queue_probes.push(ProbeReport { flow: flow.label(), link: link_label, bounds });
        }

        report.rows_written = rows_written;
        Ok(report)
    }

    /// Returns the number of links whose idle slope exceeds their rate afterwards.
    fn apply_idle_slopes(&self, analysis: &mut NetworkLatencyAnalysis) -> Result<usize> {
        let warnings = match &self.idle_slope {
            IdleSlopeAssignment::Keep => analysis.network.over_reserved_links(),
            IdleSlopeAssignment::Uniform { idle_slope, links } => {
                for (src, dst) in links {
                    analysis.network.set_link_idle_slope(src, dst, *idle_slope)?;
                }
                analysis.network.over_reserved_links()
            }
            IdleSlopeAssignment::FromFlows => {
                let cmi = analysis.calculator().cmi();
                analysis.network.calculate_link_idle_slopes_from_flows(cmi)?
            }
        };
        Ok(warnings.len())
    }
}

fn probe_target(analysis: &NetworkLatencyAnalysis, probe: &QueueProbe) -> Result<(Flow, String)> {
    let flow = analysis.network.flow(probe.flow).ok_or_else(|| Error::FlowNotFound(format!("{:?}", probe.flow)))?;
    let link = analysis.network.link(probe.link).ok_or(Error::UnknownLink(probe.link))?;
    Ok((flow.clone(), format!("{}-{}", link.src, link.dst)))
}

/// `<flow>@<link>`, falling back to the raw keys for entries missing from the network.
fn probe_label(analysis: &NetworkLatencyAnalysis, probe: &QueueProbe) -> String {
    let flow = analysis.network.flow(probe.flow).map_or_else(|| format!("{:?}", probe.flow), |flow| flow.label());
    let link = analysis.network.link(probe.link).map_or_else(|| format!("{:?}", probe.link), |link| format!("{}-{}", link.src, link.dst));
    format!("{}@{}", flow, link)
}
