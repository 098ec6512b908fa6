use serde::Serialize;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::Error;

/// The worst-case delay formulas the analysis evaluates for every port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Algorithm {
    /// IEEE 802.1BA-2021, Section 6, Equation 6-1.
    BaStandard,

    /// IEEE 802.1Q-2022 Annex L.3, fan-in from the input link count only.
    QStandardL3V1,

    /// IEEE 802.1Q-2022 Annex L.3 with per-input idle slopes consumed in ascending order,
    /// including the permanent buffer delay.
    QStandardL3V2,

    /// Same as `QStandardL3V2` with the input idle slopes consumed in descending order.
    QStandardL3V3,

    /// Plenary proposal (av-fuller-queue-delay-calculation-0809) for Fast Ethernet media.
    Plenary100Mbit,

    /// Plenary proposal for Gigabit and faster media, closed form.
    PlenaryFasterMedia,

    /// Plenary proposal for Gigabit and faster media, full credit-based derivation.
    PlenaryFasterMediaV2,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::BaStandard,
        Algorithm::QStandardL3V1,
        Algorithm::QStandardL3V2,
        Algorithm::Plenary100Mbit,
        Algorithm::PlenaryFasterMedia,
        Algorithm::PlenaryFasterMediaV2,
        Algorithm::QStandardL3V3,
    ];

    /// The name used for result columns.
    pub fn column_name(&self) -> &'static str {
        match self {
            Algorithm::BaStandard => "baStandard",
            Algorithm::QStandardL3V1 => "qStandardL3V1",
            Algorithm::QStandardL3V2 => "qStandardL3V2",
            Algorithm::QStandardL3V3 => "qStandardL3V3",
            Algorithm::Plenary100Mbit => "plenary100Mbit",
            Algorithm::PlenaryFasterMedia => "plenaryFasterMedia",
            Algorithm::PlenaryFasterMediaV2 => "plenaryFasterMediaV2",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.column_name() == s)
            .ok_or_else(|| Error::ModelConstructionError(format!("Unknown algorithm column '{}'", s)))
    }
}

/// One delay bound in seconds per formula.
///
/// Used both for the queueing delay of a single port and for the accumulated end-to-end
/// delay of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayBounds {
    pub ba_standard: f64,
    pub q_standard_l3_v1: f64,
    pub q_standard_l3_v2: f64,
    pub q_standard_l3_v3: f64,
    pub plenary_100_mbit: f64,
    pub plenary_faster_media: f64,
    pub plenary_faster_media_v2: f64,
}

impl DelayBounds {
    /// All bounds zero. Result for ports without a CBS queue.
    pub fn zero() -> Self {
        Self::default()
    }

    /// The same value for every formula, e.g. a transmission or switching delay.
    pub fn uniform(value: f64) -> Self {
        Self {
            ba_standard: value,
            q_standard_l3_v1: value,
            q_standard_l3_v2: value,
            q_standard_l3_v3: value,
            plenary_100_mbit: value,
            plenary_faster_media: value,
            plenary_faster_media_v2: value,
        }
    }

    pub fn get(&self, algorithm: Algorithm) -> f64 {
        match algorithm {
            Algorithm::BaStandard => self.ba_standard,
            Algorithm::QStandardL3V1 => self.q_standard_l3_v1,
            Algorithm::QStandardL3V2 => self.q_standard_l3_v2,
            Algorithm::QStandardL3V3 => self.q_standard_l3_v3,
            Algorithm::Plenary100Mbit => self.plenary_100_mbit,
            Algorithm::PlenaryFasterMedia => self.plenary_faster_media,
            Algorithm::PlenaryFasterMediaV2 => self.plenary_faster_media_v2,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Algorithm, f64)> + '_ {
        Algorithm::ALL.into_iter().map(move |algorithm| (algorithm, self.get(algorithm)))
    }
}

impl Add for DelayBounds {
    type Output = DelayBounds;

    fn add(self, rhs: DelayBounds) -> DelayBounds {
        DelayBounds {
            ba_standard: self.ba_standard + rhs.ba_standard,
            q_standard_l3_v1: self.q_standard_l3_v1 + rhs.q_standard_l3_v1,
            q_standard_l3_v2: self.q_standard_l3_v2 + rhs.q_standard_l3_v2,
            q_standard_l3_v3: self.q_standard_l3_v3 + rhs.q_standard_l3_v3,
            plenary_100_mbit: self.plenary_100_mbit + rhs.plenary_100_mbit,
            plenary_faster_media: self.plenary_faster_media + rhs.plenary_faster_media,
            plenary_faster_media_v2: self.plenary_faster_media_v2 + rhs.plenary_faster_media_v2,
        }
    }
}

impl AddAssign for DelayBounds {
    fn add_assign(&mut self, rhs: DelayBounds) {
        *self = *self + rhs;
    }
}
