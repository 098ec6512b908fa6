use crate::domain::cbs::{delay_bounds::DelayBounds, port::PortParameters};
use crate::error::{Error, Result};

/// Link speed the plenary formulas are normalised to (100 Mbit/s).
const PLENARY_REFERENCE_SPEED: f64 = 100_000_000.0;

/// Computes worst-case queueing delays of a CBS output port.
///
/// The calculator only holds port-level constants. The credit measurement interval (CMI) is
/// passed to every call, so one calculator can serve flows analysed with different intervals.
///
/// Units: link speed and idle slopes in bit/s, frame sizes in bits (including IFG unless noted),
/// intervals and results in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CbsLatencyCalculator {
    link_speed: f64,
    cmi: f64,
    ifg_bits: u32,
    min_packet_bytes: u32,
    max_packet_bytes: u32,
}

impl CbsLatencyCalculator {
    /// # Errors
    ///
    /// `Error::InfeasibleShaperConfiguration` for a non-positive link speed or CMI, or a minimum
    /// packet larger than the maximum packet.
    pub fn new(link_speed: f64, cmi: f64, min_packet_bytes: u32, max_packet_bytes: u32, ifg_bits: u32) -> Result<Self> {
        if link_speed.is_nan() || link_speed <= 0.0 {
            return Err(Error::InfeasibleShaperConfiguration(format!("link speed must be positive, got {}", link_speed)));
        }
        check_cmi(cmi)?;
        if min_packet_bytes > max_packet_bytes {
            return Err(Error::InfeasibleShaperConfiguration(format!(
                "minimum packet ({} B) is larger than maximum packet ({} B)",
                min_packet_bytes, max_packet_bytes
            )));
        }

        Ok(Self { link_speed, cmi, ifg_bits, min_packet_bytes, max_packet_bytes })
    }

    pub fn link_speed(&self) -> f64 {
        self.link_speed
    }

    /// The configured CMI, used whenever no flow-specific interval is requested.
    pub fn cmi(&self) -> f64 {
        self.cmi
    }

    pub fn ifg_bits(&self) -> u32 {
        self.ifg_bits
    }

    /// Maximum packet of any class on the wire, in bits including IFG.
    pub fn ct_max_frame(&self) -> f64 {
        self.max_packet_bytes as f64 * 8.0 + self.ifg_bits as f64
    }

    /// Minimum packet on the wire, in bits including IFG.
    pub fn min_frame_with_ifg(&self) -> f64 {
        self.min_packet_bytes as f64 * 8.0 + self.ifg_bits as f64
    }

    /// IEEE 802.1BA-2021, Section 6, Equation 6-1.
    ///
    /// One interfering maximum frame, the time the class needs to catch up with its credit, and
    /// the transmission of the stream frame itself.
    pub fn ba_standard(&self, idle_slope: f64, stream_max_frame: f64, cmi: f64) -> Result<f64> {
        check_cmi(cmi)?;
        let t_max_packet = self.ct_max_frame() / self.link_speed;
        let t_stream_packet = (stream_max_frame - self.ifg_bits as f64) / self.link_speed;
        let delay_a = idle_slope * cmi / self.link_speed;

        let mut t_class_a = divide((delay_a - stream_max_frame / self.link_speed) * self.link_speed, idle_slope, "baStandard class term")?;
        // Negative only if the idle slope was derived for an interval larger than the CMI
        // (e.g. the flow interval). Clamped as a workaround, not covered by the standard.
        if t_class_a < 0.0 {
            t_class_a = 0.0;
        }

        Ok(t_max_packet + t_class_a + t_stream_packet)
    }

    /// IEEE 802.1Q-2022 Annex L.3, using only the number of input links.
    ///
    /// The first input link is assumed to carry the whole idle slope of the port. Once that
    /// budget is used up, every further input link adds one class maximum frame. The permanent
    /// buffer delay is assumed to be covered by the fan-in term, which may not hold.
    pub fn q_standard_l3_v1(&self, idle_slope: f64, class_max_frame: f64, nr_input_links: usize) -> Result<f64> {
        // Only one maximum frame in the way, the class is assumed to have the highest priority.
        let q_delay_stand = self.ct_max_frame() / self.link_speed;

        let mut fan_in_data = 0.0;
        let mut budget = idle_slope;
        for _ in 0..nr_input_links {
            if budget > 0.0 {
                let input_idle_slope = idle_slope;
                let w = self.link_speed - budget.max(input_idle_slope);
                fan_in_data += divide(self.ct_max_frame() * idle_slope * self.link_speed, w * self.link_speed, "qStandardL3V1 fan-in")?
                    + divide(class_max_frame * self.link_speed, w, "qStandardL3V1 fan-in")?;
                budget -= input_idle_slope;
            } else {
                fan_in_data += class_max_frame;
            }
        }

        let fan_in_delay = fan_in_data / self.link_speed;
        Ok(q_delay_stand + fan_in_delay + class_max_frame / self.link_speed)
    }

    /// IEEE 802.1Q-2022 Annex L.3 with the actual idle slopes of the input links.
    ///
    /// The input idle slopes are consumed from the port's idle slope in the given order, so the
    /// result depends on that order. Starvation followed by a burst can happen on all inputs at
    /// once, so the permanently buffered data equals the worst-case fan-in data.
    pub fn q_standard_l3_v2(&self, idle_slope: f64, class_max_frame: f64, input_idle_slopes: &[f64]) -> Result<f64> {
        let queueing_delay = self.ct_max_frame() / self.link_speed;

        let mut fan_in_data = 0.0;
        let mut budget = idle_slope;
        for &input_idle_slope in input_idle_slopes {
            if budget > 0.0 {
                let w = self.link_speed - budget.max(input_idle_slope);
                fan_in_data += divide(self.ct_max_frame() * idle_slope, w, "qStandardL3V2 fan-in")?
                    + divide(class_max_frame * self.link_speed, w, "qStandardL3V2 fan-in")?;
                budget -= input_idle_slope;
            } else {
                fan_in_data += class_max_frame;
            }
        }

        let fan_in_delay = fan_in_data / self.link_speed;
        let permanent_delay = fan_in_delay;
        Ok(queueing_delay + fan_in_delay + permanent_delay)
    }

    /// Bits the class may send within one CMI.
    pub fn max_reserved_plenary(&self, idle_slope: f64, cmi: f64) -> f64 {
        (cmi * idle_slope).floor()
    }

    /// Plenary proposal for Fast Ethernet (100 Mbit/s) media.
    ///
    /// The reserved bits left after the stream's own frame may be split into `N` competing
    /// packets, limited by the number of other input links and the minimum packet size.
    pub fn plenary_100_mbit(&self, idle_slope: f64, stream_max_frame: f64, nr_input_links: usize, cmi: f64) -> Result<f64> {
        check_cmi(cmi)?;
        let excess = self.max_reserved_plenary(idle_slope, cmi) - stream_max_frame;
        let n = (nr_input_links as i64 - 1).min((excess / self.min_frame_with_ifg()).floor() as i64);

        let other_packets = if n > 0 { 2.0 * excess - (excess / n as f64).ceil() } else { 0.0 };

        let q_delay_bits = self.ct_max_frame() + other_packets + stream_max_frame;
        Ok(q_delay_bits / self.link_speed)
    }

    /// Plenary proposal for Gigabit and faster media, closed form: one CMI plus one maximum frame.
    pub fn plenary_faster_media(&self, cmi: f64) -> Result<f64> {
        check_cmi(cmi)?;
        Ok(cmi + self.ct_max_frame() / self.link_speed)
    }

    /// Plenary proposal for Gigabit and faster media, derived from the credit bounds.
    pub fn plenary_faster_media_v2(&self, idle_slope: f64, stream_max_frame: f64, cmi: f64) -> Result<f64> {
        check_cmi(cmi)?;
        let max_reserved = self.max_reserved_plenary(idle_slope, cmi);
        let n = self.link_speed / PLENARY_REFERENCE_SPEED;

        let mut stream_bits = ((max_reserved - stream_max_frame) / n).ceil();
        // Negative only if the idle slope was derived for an interval larger than the CMI
        // (e.g. the flow interval). Clamped as a workaround, not covered by the proposal.
        if stream_bits < 0.0 {
            stream_bits = 0.0;
        }

        let send_slope = idle_slope - self.link_speed;
        let lo_credit = stream_bits * send_slope / self.link_speed;
        let hi_credit = self.ct_max_frame() * idle_slope / self.link_speed;
        let max_burst_size = divide(self.link_speed * (lo_credit - hi_credit), send_slope, "plenaryFasterMediaV2 burst size")?;
        let max_burst_time = divide(lo_credit - hi_credit, send_slope, "plenaryFasterMediaV2 burst time")?;
        let total_bits_queued = n * max_burst_size + (max_burst_time / cmi).floor() * stream_max_frame;

        Ok(divide(total_bits_queued, idle_slope, "plenaryFasterMediaV2 queue")? - (max_burst_time - stream_bits / self.link_speed)
            + self.ct_max_frame() / self.link_speed)
    }

    /// Runs every formula for one port.
    ///
    /// `qStandardL3V2` consumes the input idle slopes in ascending order and `qStandardL3V3` in
    /// descending order. Both are reported, the true worst case may lie with either ordering.
    pub fn run_algorithms_for_port(&self, port: &PortParameters, cmi: f64) -> Result<DelayBounds> {
        let mut input_idle_slopes = port.input_idle_slopes.clone();
        input_idle_slopes.sort_by(f64::total_cmp);
        let ascending = self.q_standard_l3_v2(port.idle_slope, port.class_max_frame, &input_idle_slopes)?;
        input_idle_slopes.reverse();
        let descending = self.q_standard_l3_v2(port.idle_slope, port.class_max_frame, &input_idle_slopes)?;

        Ok(DelayBounds {
            ba_standard: self.ba_standard(port.idle_slope, port.stream_max_frame, cmi)?,
            q_standard_l3_v1: self.q_standard_l3_v1(port.idle_slope, port.class_max_frame, port.nr_input_links)?,
            q_standard_l3_v2: ascending,
            q_standard_l3_v3: descending,
            plenary_100_mbit: self.plenary_100_mbit(port.idle_slope, port.stream_max_frame, port.nr_input_links, cmi)?,
            plenary_faster_media: self.plenary_faster_media(cmi)?,
            plenary_faster_media_v2: self.plenary_faster_media_v2(port.idle_slope, port.stream_max_frame, cmi)?,
        })
    }
}

fn check_cmi(cmi: f64) -> Result<()> {
    if cmi.is_nan() || cmi <= 0.0 {
        return Err(Error::InfeasibleShaperConfiguration(format!("CMI must be positive, got {}", cmi)));
    }
    Ok(())
}

/// Division that reports a zero denominator or a non-finite result as an infeasible shaper
/// configuration, e.g. an idle slope of zero or one equal to the link speed.
fn divide(numerator: f64, denominator: f64, term: &str) -> Result<f64> {
    let quotient = numerator / denominator;
    if denominator == 0.0 || !quotient.is_finite() {
        return Err(Error::InfeasibleShaperConfiguration(format!("{}: {} / {} is not finite", term, numerator, denominator)));
    }
    Ok(quotient)
}
