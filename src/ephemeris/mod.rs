//! Broadcast ephemeris records
use crate::prelude::{Duration, Epoch, SV};

mod integrated;
mod kepler;

pub use integrated::IntegratedEphemeris;
pub use kepler::KeplerianEphemeris;

/// Broadcast orbital description for one [SV], valid over a window
/// around its reference time. Read only: supplied by an external
/// collaborator through [EphemerisSource].
#[derive(Debug, Clone, PartialEq)]
pub enum Ephemeris {
    /// Closed form orbital elements (GPS, Galileo, BeiDou families)
    Keplerian(KeplerianEphemeris),
    /// Numerically integrated reference state (Glonass family)
    Integrated(IntegratedEphemeris),
}

impl Ephemeris {
    /// True if this frame is still valid at the ongoing [Epoch]
    pub fn is_valid(&self, now: Epoch) -> bool {
        match self {
            Self::Keplerian(kepler) => (now - kepler.toe).abs() < kepler.validity,
            Self::Integrated(state) => (now - state.t_ref).abs() < state.validity,
        }
    }
}

/// Implement [EphemerisSource] to supply the solver with up to date
/// broadcast ephemerides. One query per (epoch, [SV]) pair.
pub trait EphemerisSource {
    /// Provide the [Ephemeris] frame valid for this [SV] at the ongoing
    /// [Epoch], or None: the [SV] is then excluded for this epoch.
    fn ephemeris_data(&self, epoch: Epoch, sv: SV) -> Option<Ephemeris>;
}

/// Default validity window of a Keplerian frame
pub(crate) fn default_keplerian_validity() -> Duration {
    Duration::from_seconds(7200.0)
}

/// Default validity window of an integrated frame
pub(crate) fn default_integrated_validity() -> Duration {
    Duration::from_seconds(1800.0)
}
