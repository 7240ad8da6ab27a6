//! Atmospheric bias models
use crate::prelude::Epoch;

mod iono;
pub(crate) mod tropo;

pub use iono::{BdsModel, IonosphereModel, KbModel};
pub use tropo::{saastamoinen_delay_m, TroposphereModel};

/// Runtime parameters any bias model evaluation needs. Assembled by
/// the orchestrator once the satellite state and the receiver apriori
/// are known.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BiasRuntime {
    /// Ongoing [Epoch]
    pub t: Epoch,
    /// Receiver geodetic coordinates: latitude (deg), longitude (deg),
    /// height above ellipsoid (m)
    pub rx_geo_deg_deg_m: (f64, f64, f64),
    /// Satellite elevation and azimuth, in degrees
    pub sv_elev_azim_deg: (f64, f64),
    /// Selected signal frequency, in Hertz
    pub frequency_hz: f64,
}
