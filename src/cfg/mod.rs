#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::prelude::Constellation;

fn default_constellations() -> Vec<Constellation> {
    vec![Constellation::GPS]
}

fn default_min_sv_elev() -> f64 {
    10.0
}

fn default_min_cn0() -> f64 {
    20.0
}

fn default_min_pseudorange() -> f64 {
    1.8E7
}

fn default_max_pseudorange() -> f64 {
    3.0E7
}

fn default_max_doppler_sigma() -> f64 {
    10.0
}

fn default_smoothing_window() -> usize {
    30
}

fn default_max_divergence() -> f64 {
    2.0
}

fn default_epoch_interval() -> f64 {
    1.0
}

fn default_convergence() -> f64 {
    0.1
}

fn default_max_iter() -> usize {
    25
}

fn default_true() -> bool {
    true
}

/// Signal selection policy: which bands contribute to the solution.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum FrequencyMode {
    /// Primary band only (single frequency + ionosphere model)
    #[default]
    Single,
    /// Both bands contribute independent measurements
    Dual,
    /// Ionosphere free pseudo range combination (requires both bands)
    IonoFree,
}

/// Measurement variance model, derived from signal strength:
/// σ² = a + b·10^(−0.1·C/N0)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct WeightModel {
    /// Variance floor, in m²
    pub a_m2: f64,
    /// C/N0 scaling term, in m²
    pub b_m2: f64,
}

impl Default for WeightModel {
    fn default() -> Self {
        Self {
            a_m2: 1.0,
            b_m2: 1.0E4,
        }
    }
}

impl WeightModel {
    /// Measurement variance in m² for given signal strength
    pub(crate) fn variance_m2(&self, cn0_dbhz: f64) -> f64 {
        self.a_m2 + self.b_m2 * 10.0_f64.powf(-0.1 * cn0_dbhz)
    }
}

/// Kalman filter tuning: process noise densities and a priori sigmas.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct KalmanTuning {
    /// Velocity random walk spectral density, in m²/s³
    pub velocity_psd_m2_s3: f64,
    /// Oscillator Allan variance h₀ coefficient (white frequency noise)
    pub h0: f64,
    /// Oscillator Allan variance h₋₂ coefficient (random walk frequency noise)
    pub h_minus_2: f64,
    /// A priori position sigma, in meters
    pub apriori_position_sigma_m: f64,
    /// A priori velocity sigma, in m/s
    pub apriori_velocity_sigma_m_s: f64,
    /// A priori clock bias sigma, in meters
    pub apriori_clock_sigma_m: f64,
    /// A priori clock drift sigma, in m/s
    pub apriori_drift_sigma_m_s: f64,
    /// A priori inter system offset sigma, in meters
    pub apriori_isb_sigma_m: f64,
    /// Range rate measurement sigma, in m/s
    pub range_rate_sigma_m_s: f64,
}

impl Default for KalmanTuning {
    fn default() -> Self {
        Self {
            velocity_psd_m2_s3: 1.0,
            h0: 2.0E-19,
            h_minus_2: 2.0E-20,
            apriori_position_sigma_m: 10.0,
            apriori_velocity_sigma_m_s: 1.0,
            apriori_clock_sigma_m: 100.0,
            apriori_drift_sigma_m_s: 10.0,
            apriori_isb_sigma_m: 30.0,
            range_rate_sigma_m_s: 0.5,
        }
    }
}

/// Physical effects compensation
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Modeling {
    /// Compensate for onboard clock offset to system time
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub sv_clock_bias: bool,
    /// Compensate for relativistic effect on onboard clock
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub relativistic_clock_bias: bool,
    /// Compensate for onboard group delay (single frequency users)
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub sv_total_group_delay: bool,
    /// Compensate for troposphere delay
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub tropo_delay: bool,
    /// Compensate for ionosphere delay (single and dual modes;
    /// disregarded in [FrequencyMode::IonoFree])
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub iono_delay: bool,
    /// Compensate for Earth rotation during signal flight
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub earth_rotation: bool,
}

impl Default for Modeling {
    fn default() -> Self {
        Self {
            sv_clock_bias: default_true(),
            relativistic_clock_bias: default_true(),
            sv_total_group_delay: default_true(),
            tropo_delay: default_true(),
            iono_delay: default_true(),
            earth_rotation: default_true(),
        }
    }
}

/// Solver parametrization. All empirical thresholds are exposed here
/// rather than hard coded at their use sites.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Enabled [Constellation]s. Measurements from any other system
    /// are rejected upfront.
    #[cfg_attr(feature = "serde", serde(default = "default_constellations"))]
    pub constellations: Vec<Constellation>,

    /// Signal selection policy
    #[cfg_attr(feature = "serde", serde(default))]
    pub frequency_mode: FrequencyMode,

    /// Dynamic mode: estimate velocity and clock drift with the
    /// recursive filter once acquisition succeeded. When false the
    /// solver produces an instantaneous fix every epoch.
    #[cfg_attr(feature = "serde", serde(default))]
    pub dynamic: bool,

    /// Minimal elevation angle for an SV to contribute, in degrees
    #[cfg_attr(feature = "serde", serde(default = "default_min_sv_elev"))]
    pub min_sv_elev_deg: f64,

    /// Noise floor: minimal C/N0 for a measurement to be considered,
    /// in dB-Hz, applied per band in use
    #[cfg_attr(feature = "serde", serde(default = "default_min_cn0"))]
    pub min_cn0_dbhz: f64,

    /// Lower bound of the physically plausible pseudo range window, in meters
    #[cfg_attr(feature = "serde", serde(default = "default_min_pseudorange"))]
    pub min_pseudorange_m: f64,

    /// Upper bound of the physically plausible pseudo range window, in meters
    #[cfg_attr(feature = "serde", serde(default = "default_max_pseudorange"))]
    pub max_pseudorange_m: f64,

    /// Doppler gate: range rate is derived only when the reported
    /// 1-σ uncertainty is at or below this threshold, in Hz
    #[cfg_attr(feature = "serde", serde(default = "default_max_doppler_sigma"))]
    pub max_doppler_sigma_hz: f64,

    /// Carrier smoothing of the code measurements
    #[cfg_attr(feature = "serde", serde(default))]
    pub code_smoothing: bool,

    /// Smoothing window length, in samples
    #[cfg_attr(feature = "serde", serde(default = "default_smoothing_window"))]
    pub smoothing_window: usize,

    /// Divergence threshold between the filter prediction and the
    /// instantaneous fix, in meters. Exceeding it is interpreted as
    /// loss of lock and forces re-acquisition.
    #[cfg_attr(feature = "serde", serde(default = "default_max_divergence"))]
    pub max_divergence_m: f64,

    /// Nominal epoch interval, in seconds
    #[cfg_attr(feature = "serde", serde(default = "default_epoch_interval"))]
    pub epoch_interval_s: f64,

    /// Least squares convergence criterion on ‖ΔX‖, in meters
    #[cfg_attr(feature = "serde", serde(default = "default_convergence"))]
    pub lsq_convergence_m: f64,

    /// Least squares iteration cap
    #[cfg_attr(feature = "serde", serde(default = "default_max_iter"))]
    pub lsq_max_iter: usize,

    /// Measurement variance model
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: WeightModel,

    /// Kalman filter tuning
    #[cfg_attr(feature = "serde", serde(default))]
    pub kalman: KalmanTuning,

    /// Physical effects compensation
    #[cfg_attr(feature = "serde", serde(default))]
    pub modeling: Modeling,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            constellations: default_constellations(),
            frequency_mode: FrequencyMode::default(),
            dynamic: false,
            min_sv_elev_deg: default_min_sv_elev(),
            min_cn0_dbhz: default_min_cn0(),
            min_pseudorange_m: default_min_pseudorange(),
            max_pseudorange_m: default_max_pseudorange(),
            max_doppler_sigma_hz: default_max_doppler_sigma(),
            code_smoothing: false,
            smoothing_window: default_smoothing_window(),
            max_divergence_m: default_max_divergence(),
            epoch_interval_s: default_epoch_interval(),
            lsq_convergence_m: default_convergence(),
            lsq_max_iter: default_max_iter(),
            weight: WeightModel::default(),
            kalman: KalmanTuning::default(),
            modeling: Modeling::default(),
        }
    }
}

impl Config {
    /// [Config] preset for static single frequency navigation
    pub fn static_preset(constellations: Vec<Constellation>) -> Self {
        Self {
            constellations,
            ..Default::default()
        }
    }

    /// [Config] preset for dynamic (roaming) navigation: velocity and
    /// clock drift are estimated, carrier smoothing is turned on.
    pub fn dynamic_preset(constellations: Vec<Constellation>) -> Self {
        Self {
            constellations,
            dynamic: true,
            code_smoothing: true,
            ..Default::default()
        }
    }

    /// True when this [Constellation] is enabled
    pub(crate) fn is_enabled(&self, constellation: Constellation) -> bool {
        self.constellations.contains(&constellation)
    }

    /// Minimal satellite count with respect to the enabled parameter set:
    /// 4, plus one per enabled secondary constellation.
    pub(crate) fn min_sv_count(&self) -> usize {
        4 + self.constellations.len().saturating_sub(1)
    }

    /// Fingerprint of the fields the active estimator state depends on.
    /// A change forces estimator re-instantiation.
    pub(crate) fn fingerprint(&self) -> (Vec<Constellation>, FrequencyMode, bool) {
        (
            self.constellations.clone(),
            self.frequency_mode,
            self.dynamic,
        )
    }
}
