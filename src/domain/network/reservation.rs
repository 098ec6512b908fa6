use std::collections::HashMap;

use crate::domain::network::{Network, link::Link};
use crate::domain::utils::id::{LinkId, NodeId};
use crate::error::{Error, Result};

/// Raised when the idle slope reserved on a link exceeds its rate.
///
/// The CBS configuration is infeasible then and the bounds computed downstream may be
/// meaningless, but the analysis still runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationWarning {
    pub link: LinkId,
    pub src: NodeId,
    pub dst: NodeId,
    pub idle_slope: f64,
    pub rate: f64,
}

impl ReservationWarning {
    fn from_link(link: &Link) -> Self {
        Self { link: link.id, src: link.src.clone(), dst: link.dst.clone(), idle_slope: link.idle_slope, rate: link.rate }
    }

    fn emit(&self) {
        tracing::warn!(
            src = %self.src,
            dst = %self.dst,
            idle_slope = self.idle_slope,
            rate = self.rate,
            "Idle slope exceeds link rate, CBS reservation is infeasible"
        );
    }
}

impl Network {
    /// Sets the idle slope of every link to the bandwidth its flows need to send one frame per `cmi`.
    ///
    /// Every flow whose cached path uses a link contributes `(size * 8 + IFG) / cmi` to it.
    /// Flows without a cached path contribute nothing. Assumes all flows share one class.
    ///
    /// Over-reserved links are reported and returned as warnings, their idle slope is set anyway.
    pub fn calculate_link_idle_slopes_from_flows(&mut self, cmi: f64) -> Result<Vec<ReservationWarning>> {
        if cmi.is_nan() || cmi <= 0.0 {
            return Err(Error::InfeasibleShaperConfiguration(format!("CMI must be positive, got {}", cmi)));
        }

        let mut reserved: HashMap<LinkId, f64> = HashMap::new();
        for flow in self.flows.values() {
            let Some(path) = self.lookup_path(&flow.src, &flow.dst) else {
                log::warn!("{} has no path, it does not reserve any bandwidth.", flow);
                continue;
            };

            let flow_idle_slope = flow.frame_bits_with_ifg(self.ifg_bits) / cmi;
            for link_id in path.links() {
                *reserved.entry(*link_id).or_insert(0.0) += flow_idle_slope;
            }
        }

        let mut warnings = Vec::new();
        for (link_id, link) in self.links.iter_mut() {
            link.idle_slope = reserved.get(&link_id).copied().unwrap_or(0.0);

            if link.is_over_reserved() {
                let warning = ReservationWarning::from_link(link);
                warning.emit();
                warnings.push(warning);
            }
        }

        Ok(warnings)
    }

    /// Checks the current idle slopes without changing them.
    pub fn over_reserved_links(&self) -> Vec<ReservationWarning> {
        self.links
            .values()
            .filter(|link| link.is_over_reserved())
            .map(|link| {
                let warning = ReservationWarning::from_link(link);
                warning.emit();
                warning
            })
            .collect()
    }
}
