pub mod study;

use std::collections::{BTreeSet, HashSet};

use crate::api::scenario_dto::{AnalysisDto, EndpointsDto, FlowDto, LinkDto, ScenarioDto, StudyDto};
use crate::domain::analysis::latency_analysis::{AnalysisConfig, NetworkLatencyAnalysis};
use crate::domain::network::{Network, flow::Flow};
use crate::domain::scenario::study::{IdleSlopeAssignment, QueueProbe, Study};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// A network with its flows and the studies to run on it, built from a scenario file.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub analysis: NetworkLatencyAnalysis,
    pub studies: Vec<Study>,
}

impl Scenario {
    pub fn network(&self) -> &Network {
        &self.analysis.network
    }

    /// Every link used by the path of a registered flow, ordered by endpoints.
    pub fn flow_path_links(network: &Network) -> Vec<(NodeId, NodeId)> {
        let mut links = BTreeSet::new();
        for (_, flow) in network.flows() {
            if let Some(path) = network.lookup_path(&flow.src, &flow.dst) {
                links.extend(network.path_links(path).map(|link| (link.src.clone(), link.dst.clone())));
            }
        }
        links.into_iter().collect()
    }
}

impl From<&AnalysisDto> for AnalysisConfig {
    fn from(dto: &AnalysisDto) -> Self {
        let defaults = AnalysisConfig::default();

        AnalysisConfig {
            link_speed: dto.link_speed.unwrap_or(defaults.link_speed),
            cmi: dto.cmi.unwrap_or(defaults.cmi),
            switch_delay: dto.switch_delay.unwrap_or(defaults.switch_delay),
            min_packet_bytes: dto.min_packet_bytes.unwrap_or(defaults.min_packet_bytes),
            max_packet_bytes: dto.max_packet_bytes.unwrap_or(defaults.max_packet_bytes),
            ifg_bits: dto.ifg_bits.unwrap_or(defaults.ifg_bits),
        }
    }
}

// Helper functions for the impl TryFrom<ScenarioDto> for Scenario
impl Scenario {
    fn register_nodes(network: &mut Network, dto: &ScenarioDto) -> Result<()> {
        let bridges: HashSet<&str> = dto.bridges.iter().map(String::as_str).collect();

        if let Some(both) = dto.nodes.iter().find(|node| bridges.contains(node.as_str())) {
            return Err(Error::ModelConstructionError(format!("'{}' is declared as end node and as bridge.", both)));
        }

        for node in &dto.nodes {
            network.add_node(node.as_str());
        }
        for bridge in &dto.bridges {
            network.add_bridge(bridge.as_str());
        }
        Ok(())
    }

    fn register_link(network: &mut Network, dto: &LinkDto) -> Result<()> {
        let src = Self::known_node(network, &dto.source)?;
        let dst = Self::known_node(network, &dto.target)?;

        if !dto.rate.is_finite() || dto.rate <= 0.0 {
            return Err(Error::ModelConstructionError(format!("Link {} -> {} needs a positive rate, got {}.", src, dst, dto.rate)));
        }

        if dto.bidirectional {
            network.add_bidirectional_link(src, dst, dto.rate, dto.delay, dto.idle_slope);
        } else {
            network.add_link(src, dst, dto.rate, dto.delay, dto.idle_slope);
        }
        Ok(())
    }

    fn register_flow(network: &mut Network, dto: &FlowDto) -> Result<()> {
        let src = Self::known_node(network, &dto.source)?;
        let dst = Self::known_node(network, &dto.target)?;

        if let Some(hops) = &dto.path {
            let hops = hops.iter().map(|hop| Self::known_node(network, hop)).collect::<Result<Vec<NodeId>>>()?;

            if hops.first() != Some(&src) || hops.last() != Some(&dst) {
                return Err(Error::ModelConstructionError(format!("Path of flow {} -> {} must start at {} and end at {}.", src, dst, src, dst)));
            }

            let path = network.path_from_hops(&hops)?;
            network.add_path(path);
        }

        network.add_flow(Flow::new(src, dst, dto.size, dto.deadline, dto.period, dto.priority));
        Ok(())
    }

    fn build_study(network: &Network, dto: StudyDto) -> Result<Study> {
        let idle_slope = match (dto.idle_slope, dto.idle_slopes_from_flows) {
            (Some(_), true) => {
                return Err(Error::ModelConstructionError(format!(
                    "Study '{}' sets a uniform idle slope and derives idle slopes from flows.",
                    dto.name
                )));
            }
            (Some(idle_slope), false) => {
                if !idle_slope.is_finite() || idle_slope < 0.0 {
                    return Err(Error::ModelConstructionError(format!("Study '{}' has an invalid idle slope {}.", dto.name, idle_slope)));
                }

                let links = match &dto.idle_slope_links {
                    Some(links) => links.iter().map(|link| Self::known_link(network, link)).collect::<Result<Vec<_>>>()?,
                    None => Self::flow_path_links(network),
                };
                IdleSlopeAssignment::Uniform { idle_slope, links }
            }
            (None, true) => IdleSlopeAssignment::FromFlows,
            (None, false) => {
                if dto.idle_slope_links.is_some() {
                    return Err(Error::ModelConstructionError(format!("Study '{}' lists idle slope links without an idle slope.", dto.name)));
                }
                IdleSlopeAssignment::Keep
            }
        };

        let mut queue_probes = Vec::with_capacity(dto.queue_probes.len());
        for probe in dto.queue_probes {
            let flow_src = NodeId::from(probe.flow.source.as_str());
            let flow_dst = NodeId::from(probe.flow.target.as_str());
            let flow = network
                .get_flow(&flow_src, &flow_dst)
                .ok_or_else(|| Error::FlowNotFound(format!("{} -> {}", flow_src, flow_dst)))?;

            let (link_src, link_dst) = Self::known_link(network, &probe.link)?;
            let link = network.get_link(&link_src, &link_dst).map(|link| link.id).ok_or(Error::LinkNotFound { src: link_src, dst: link_dst })?;

            queue_probes.push(QueueProbe { flow, link, metadata: probe.metadata });
        }

        Ok(Study {
            name: dto.name,
            output_file: dto.output_file.into(),
            result_columns: dto.result_columns,
            metadata: dto.metadata,
            idle_slope,
            use_flow_interval_as_cmi: dto.use_flow_interval_as_cmi,
            queue_probes,
            truncate_output: dto.truncate_output,
        })
    }

    fn known_node(network: &Network, name: &str) -> Result<NodeId> {
        let node = NodeId::from(name);
        if !network.is_known_node(&node) {
            return Err(Error::ModelConstructionError(format!("Unknown node '{}'.", name)));
        }
        Ok(node)
    }

    fn known_link(network: &Network, dto: &EndpointsDto) -> Result<(NodeId, NodeId)> {
        let src = NodeId::from(dto.source.as_str());
        let dst = NodeId::from(dto.target.as_str());
        if network.get_link(&src, &dst).is_none() {
            return Err(Error::LinkNotFound { src, dst });
        }
        Ok((src, dst))
    }
}

/// Builds the network of a scenario and validates its studies.
impl TryFrom<ScenarioDto> for Scenario {
    type Error = Error;

    fn try_from(dto: ScenarioDto) -> Result<Self> {
        let mut analysis = NetworkLatencyAnalysis::new(AnalysisConfig::from(&dto.analysis))?;

        // 1. Topology.
        Self::register_nodes(&mut analysis.network, &dto)?;
        for link in &dto.links {
            Self::register_link(&mut analysis.network, link)?;
        }

        // 2. Flows with their explicit paths, the others are routed along the shortest path.
        for flow in &dto.flows {
            Self::register_flow(&mut analysis.network, flow)?;
        }
        let unrouted = analysis.network.initialize_flow_paths();
        if !unrouted.is_empty() {
            log::warn!("{} flow(s) of scenario '{}' have no path and will fail.", unrouted.len(), dto.name);
        }

        // 3. Studies, resolved against the finished network.
        let studies = dto.studies.into_iter().map(|study| Self::build_study(&analysis.network, study)).collect::<Result<Vec<_>>>()?;

        log::info!(
            "Scenario '{}': {} links, {} flows, {} studies.",
            dto.name,
            analysis.network.num_links(),
            analysis.network.num_flows(),
            studies.len()
        );

        Ok(Scenario { name: dto.name, analysis, studies })
    }
}
