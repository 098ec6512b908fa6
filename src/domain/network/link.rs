use std::fmt;

use crate::domain::utils::id::{LinkId, NodeId};

/// A directional link between two nodes (end stations or bridges).
///
/// A bidirectional connection is modelled as two independent `Link`s, so each direction
/// carries its own idle slope.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub src: NodeId,
    pub dst: NodeId,

    /// Nominal rate in bit/s. The formulas use the analysis-wide link speed instead.
    pub rate: f64,

    /// Propagation delay in seconds. Currently unused by the formulas.
    pub delay: f64,

    /// Bandwidth in bit/s reserved for the CBS class on this port.
    pub idle_slope: f64,
}

impl Link {
    /// True if `other` connects the same two nodes in the opposite direction.
    pub fn is_reverse_of(&self, other: &Link) -> bool {
        self.src == other.dst && self.dst == other.src
    }

    pub fn is_over_reserved(&self) -> bool {
        self.idle_slope > self.rate
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link {} -> {} (rate: {} bit/s, idle slope: {} bit/s)", self.src, self.dst, self.rate, self.idle_slope)
    }
}
