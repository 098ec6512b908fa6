use std::fmt;

use crate::domain::utils::id::NodeId;

/// A periodic stream of the CBS traffic class between two end stations.
///
/// Cross traffic is not modelled as flows; it only enters the analysis through the
/// configured maximum packet size.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub src: NodeId,
    pub dst: NodeId,

    /// Frame size in bytes, without the interframe gap.
    pub size: u32,

    /// Deadline in seconds.
    pub deadline: f64,

    /// Transmission interval in seconds.
    pub period: f64,

    pub priority: u8,
}

impl Flow {
    pub fn new(src: impl Into<NodeId>, dst: impl Into<NodeId>, size: u32, deadline: f64, period: f64, priority: u8) -> Self {
        Self { src: src.into(), dst: dst.into(), size, deadline, period, priority }
    }

    /// Frame size on the wire in bits, including the interframe gap.
    pub fn frame_bits_with_ifg(&self, ifg_bits: u32) -> f64 {
        (self.size as f64) * 8.0 + ifg_bits as f64
    }

    /// `<src>-<dst>`, the flow label used in result files.
    pub fn label(&self) -> String {
        format!("{}-{}", self.src, self.dst)
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Flow {} -> {} (size: {} B, deadline: {} s, period: {} s, priority: {})",
            self.src, self.dst, self.size, self.deadline, self.period, self.priority
        )
    }
}

