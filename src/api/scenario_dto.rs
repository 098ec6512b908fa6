use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root of a scenario file: a topology, its flows and the studies run on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub name: String,

    #[serde(default)]
    pub analysis: AnalysisDto,

    pub nodes: Vec<String>,
    pub bridges: Vec<String>,
    pub links: Vec<LinkDto>,
    pub flows: Vec<FlowDto>,

    #[serde(default)]
    pub studies: Vec<StudyDto>,
}

/// Port constants. Missing values fall back to 100 Mbit/s, 125 us CMI, no switch delay,
/// 64 to 1526 byte packets and a 96 bit IFG.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDto {
    pub link_speed: Option<f64>,
    pub cmi: Option<f64>,
    pub switch_delay: Option<f64>,
    pub min_packet_bytes: Option<u32>,
    pub max_packet_bytes: Option<u32>,
    pub ifg_bits: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub source: String,
    pub target: String,
    pub rate: f64,

    #[serde(default)]
    pub delay: f64,

    #[serde(default)]
    pub idle_slope: f64,

    #[serde(default)]
    pub bidirectional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDto {
    pub source: String,
    pub target: String,

    /// Frame size in bytes.
    pub size: u32,
    pub deadline: f64,
    pub period: f64,
    pub priority: u8,

    /// Explicit route as node hops from source to target. Shortest path if absent.
    pub path: Option<Vec<String>>,
}

/// A directed node pair naming a link or a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsDto {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyDto {
    pub name: String,
    pub output_file: String,
    pub result_columns: Vec<String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Uniform idle slope in bit/s.
    pub idle_slope: Option<f64>,

    /// Links that receive `idle_slope`. Every link used by a flow path if absent.
    pub idle_slope_links: Option<Vec<EndpointsDto>>,

    #[serde(default)]
    pub idle_slopes_from_flows: bool,

    #[serde(default)]
    pub use_flow_interval_as_cmi: bool,

    #[serde(default)]
    pub queue_probes: Vec<QueueProbeDto>,

    #[serde(default)]
    pub truncate_output: bool,
}

/// Queueing delay of one flow at a single output port, written as its own CSV row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueProbeDto {
    pub flow: EndpointsDto,
    pub link: EndpointsDto,

    /// Overrides the study metadata for this row.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
