use std::collections::BTreeMap;

use crate::domain::cbs::{calculator::CbsLatencyCalculator, delay_bounds::DelayBounds, port::PortParameters};
use crate::domain::network::{Network, flow::Flow, link::Link};
use crate::domain::utils::id::{FlowId, LinkId};
use crate::error::{Error, Result};

/// Port-level constants of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Link speed in bit/s, used for every link.
    pub link_speed: f64,

    /// Credit measurement interval in seconds (125 us for SR class A).
    pub cmi: f64,

    /// Fixed forwarding delay of a bridge in seconds.
    pub switch_delay: f64,

    pub min_packet_bytes: u32,

    /// Maximum packet size in bytes, without IFG.
    pub max_packet_bytes: u32,

    pub ifg_bits: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { link_speed: 100_000_000.0, cmi: 125e-6, switch_delay: 0.0, min_packet_bytes: 64, max_packet_bytes: 1526, ifg_bits: 96 }
    }
}

/// Per-flow end-to-end results keyed by flow, in registration order.
pub type EndToEndResults = BTreeMap<FlowId, Result<DelayBounds>>;

/// Walks flow paths through a `Network` and sums up per-hop bounds for every formula.
#[derive(Debug, Clone)]
pub struct NetworkLatencyAnalysis {
    pub network: Network,
    calculator: CbsLatencyCalculator,
    switch_delay: f64,
}

impl NetworkLatencyAnalysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let calculator =
            CbsLatencyCalculator::new(config.link_speed, config.cmi, config.min_packet_bytes, config.max_packet_bytes, config.ifg_bits)?;

        Ok(Self { network: Network::new(config.ifg_bits), calculator, switch_delay: config.switch_delay })
    }

    pub fn calculator(&self) -> &CbsLatencyCalculator {
        &self.calculator
    }

    pub fn switch_delay(&self) -> f64 {
        self.switch_delay
    }

    /// Class maximum frame in bits including IFG, derived from the largest registered flow.
    pub fn class_max_frame_bits(&self) -> f64 {
        self.network.find_class_max_frame() as f64 * 8.0 + self.network.ifg_bits() as f64
    }

    /// Time to put one frame of `flow` on the wire.
    pub fn transmission_delay(&self, flow: &Flow) -> f64 {
        flow.frame_bits_with_ifg(self.network.ifg_bits()) / self.calculator.link_speed()
    }

    /// Queueing delay bounds of `flow` at the output port of `link`, using the configured CMI.
    ///
    /// Links leaving an end station have no CBS queue and yield zero bounds, as does a network
    /// without registered flows. `class_max_frame` (bits including IFG) defaults to the largest
    /// registered flow frame.
    pub fn calculate_queue_delay_for_link(&self, link: LinkId, flow: &Flow, class_max_frame: Option<f64>) -> Result<DelayBounds> {
        let link = self.network.link(link).ok_or(Error::UnknownLink(link))?;
        self.queue_delay_for_link(link, flow, class_max_frame, self.calculator.cmi())
    }

    /// End-to-end bounds of a registered flow with the configured CMI.
    ///
    /// Per hop: queueing delay, the transmission delay of the flow's frame and, for hops leaving
    /// a bridge, the switch delay.
    ///
    /// # Errors
    ///
    /// `Error::PathNotFound` if no path is cached for the flow, plus any formula error of a hop.
    pub fn calculate_end_to_end_delay_for_flow(&self, flow: FlowId) -> Result<DelayBounds> {
        let flow = self.network.flow(flow).ok_or_else(|| Error::FlowNotFound(format!("{:?}", flow)))?;
        self.end_to_end_delay(flow, self.calculator.cmi())
    }

    /// End-to-end bounds of every registered flow.
    ///
    /// With `use_flow_interval_as_cmi` each flow is analysed with its own period as CMI. A flow
    /// that fails keeps its error in the result and does not affect the others.
    pub fn calculate_end_to_end_delays(&self, use_flow_interval_as_cmi: bool) -> EndToEndResults {
        self.network
            .flows()
            .map(|(flow_id, flow)| {
                let cmi = if use_flow_interval_as_cmi { flow.period } else { self.calculator.cmi() };
                let result = self.end_to_end_delay(flow, cmi);

                match &result {
                    Ok(bounds) => log::debug!("{}: baStandard bound {:.6} s", flow.label(), bounds.ba_standard),
                    Err(e) => tracing::warn!(flow = %flow.label(), error = %e, "End-to-end delay could not be calculated"),
                }
                (flow_id, result)
            })
            .collect()
    }

    fn queue_delay_for_link(&self, link: &Link, flow: &Flow, class_max_frame: Option<f64>, cmi: f64) -> Result<DelayBounds> {
        if self.network.is_end_node(&link.src) || self.network.num_flows() == 0 {
            return Ok(DelayBounds::zero());
        }

        let port = PortParameters {
            idle_slope: link.idle_slope,
            stream_max_frame: flow.frame_bits_with_ifg(self.network.ifg_bits()),
            class_max_frame: class_max_frame.unwrap_or_else(|| self.class_max_frame_bits()),
            nr_input_links: self.network.get_num_input_links(link.id, false),
            input_idle_slopes: self.network.get_input_idle_slopes(link.id),
        };

        self.calculator.run_algorithms_for_port(&port, cmi)
    }

    fn end_to_end_delay(&self, flow: &Flow, cmi: f64) -> Result<DelayBounds> {
        let path = self
            .network
            .lookup_path(&flow.src, &flow.dst)
            .ok_or_else(|| Error::PathNotFound { src: flow.src.clone(), dst: flow.dst.clone() })?;

        let class_max_frame = self.class_max_frame_bits();
        let transmission_delay = DelayBounds::uniform(self.transmission_delay(flow));
        let switch_delay = DelayBounds::uniform(self.switch_delay);

        let mut flow_delay = DelayBounds::zero();
        for link in self.network.path_links(path) {
            flow_delay += self.queue_delay_for_link(link, flow, Some(class_max_frame), cmi)?;
            flow_delay += transmission_delay;
            if self.network.is_bridge(&link.src) {
                flow_delay += switch_delay;
            }
        }

        Ok(flow_delay)
    }
}
