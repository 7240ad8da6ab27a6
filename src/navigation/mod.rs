//! Navigation estimators
use nalgebra::Vector3;

use crate::{error::Error, prelude::SV};

pub(crate) mod dop;
pub(crate) mod indexes;
pub(crate) mod kalman;
pub(crate) mod lsq;

pub(crate) use dop::dilution_of_precision;
pub(crate) use indexes::ConstellationIndexes;
pub(crate) use kalman::KalmanEstimator;
pub(crate) use lsq::LsqEstimator;

/// One ranging measurement, fully corrected and ready for estimation.
/// Each contributing signal of each [SV] produces one record.
#[derive(Debug, Clone)]
pub(crate) struct NavObservation {
    /// [SV] identity
    pub sv: SV,
    /// Satellite ECEF position at transmission, Earth rotation
    /// corrected, in meters
    pub sv_position_m: Vector3<f64>,
    /// Satellite ECEF velocity, in m/s
    pub sv_velocity_m_s: Vector3<f64>,
    /// Satellite clock bias, in meters of range
    pub sv_clock_bias_m: f64,
    /// Pseudo range (possibly smoothed / combined), in meters
    pub pseudo_range_m: f64,
    /// Doppler derived range rate, in m/s, 0.0 when unavailable
    pub range_rate_m_s: f64,
    /// Modeled troposphere delay, in meters
    pub tropo_delay_m: f64,
    /// Modeled ionosphere delay for this signal, in meters
    pub iono_delay_m: f64,
    /// Measurement variance from signal strength, in m²
    pub variance_m2: f64,
    /// Elevation, in degrees (diagnostics)
    pub elevation_deg: f64,
    /// Azimuth, in degrees (diagnostics)
    pub azimuth_deg: f64,
}

impl NavObservation {
    /// Misclosure against a position/clock hypothesis: observed minus
    /// modeled pseudo range. `clock_m` must already include the inter
    /// system offset applicable to this [SV].
    pub(crate) fn misclosure_m(&self, rx_position_m: Vector3<f64>, clock_m: f64) -> f64 {
        let rho_m = (self.sv_position_m - rx_position_m).norm();
        self.pseudo_range_m
            - (rho_m - self.sv_clock_bias_m + clock_m + self.tropo_delay_m + self.iono_delay_m)
    }

    /// Unit line of sight vector, receiver to satellite, negated for
    /// direct use as the position partials of the misclosure.
    pub(crate) fn los_partials(&self, rx_position_m: Vector3<f64>) -> Vector3<f64> {
        let rho = self.sv_position_m - rx_position_m;
        -rho / rho.norm()
    }
}

/// Estimation product common to both estimators.
#[derive(Debug, Clone)]
pub(crate) struct EstimationResult {
    /// Receiver ECEF position, in meters
    pub position_m: Vector3<f64>,
    /// Receiver ECEF velocity, in m/s (dynamic estimator only)
    pub velocity_m_s: Option<Vector3<f64>>,
    /// Receiver clock bias, in meters of range
    pub clock_bias_m: f64,
    /// Receiver clock drift, in m/s (dynamic estimator only)
    pub clock_drift_m_s: Option<f64>,
    /// Inter system offsets, in meters, in column order
    pub isb_m: Vec<f64>,
    /// Post fit residuals, one per contributing record
    pub residuals_m: Vec<(SV, f64)>,
}

/// The estimation seam: one epoch's prepared observations in, one
/// [EstimationResult] out.
pub(crate) trait Estimator {
    fn estimate(
        &mut self,
        observations: &[NavObservation],
        indexes: &ConstellationIndexes,
    ) -> Result<EstimationResult, Error>;
}
