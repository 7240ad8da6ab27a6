//! Estimation products
use nalgebra::Vector3;

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    prelude::{Epoch, SV},
};

/// Orchestrator state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SolverState {
    /// No epoch processed yet, or explicit reset
    #[default]
    NoFix,
    /// Instantaneous least squares fixes, from a coarse initial guess
    Acquiring,
    /// Recursive filter tracking (dynamic mode only)
    Tracking,
}

impl std::fmt::Display for SolverState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::NoFix => write!(f, "no-fix"),
            Self::Acquiring => write!(f, "acquiring"),
            Self::Tracking => write!(f, "tracking"),
        }
    }
}

/// Geometry quality metrics, from the instantaneous design matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct DilutionOfPrecision {
    /// Geometric DOP
    pub gdop: f64,
    /// Horizontal DOP
    pub hdop: f64,
    /// Vertical DOP
    pub vdop: f64,
    /// Temporal DOP
    pub tdop: f64,
}

/// Per [SV] diagnostics attached to each solution, for the telemetry
/// collaborator.
#[derive(Debug, Clone)]
pub struct SVContribution {
    /// [SV] identity
    pub sv: SV,
    /// Elevation at reception time, in degrees
    pub elevation_deg: f64,
    /// Azimuth at reception time, in degrees
    pub azimuth_deg: f64,
    /// Post fit residual, in meters
    pub residual_m: f64,
    /// True if this [SV] contributed to the solution
    pub in_use: bool,
}

/// One epoch's estimation product.
#[derive(Debug, Clone)]
pub struct PVTSolution {
    /// Sampling [Epoch]
    pub epoch: Epoch,
    /// Receiver ECEF position, in meters
    pub position_ecef_m: Vector3<f64>,
    /// Receiver ECEF velocity, in m/s (dynamic mode)
    pub velocity_ecef_m_s: Option<Vector3<f64>>,
    /// Receiver clock bias to the primary system time, in seconds
    pub clock_bias_s: f64,
    /// Receiver clock drift, in s/s (dynamic mode)
    pub clock_drift_s_s: Option<f64>,
    /// Inter system offsets, in seconds, in first seen order
    pub isb_s: Vec<f64>,
    /// [DilutionOfPrecision] values
    pub dop: DilutionOfPrecision,
    /// Per [SV] diagnostics
    pub contributions: Vec<SVContribution>,
    /// State machine position when this solution formed
    pub state: SolverState,
}

impl PVTSolution {
    pub(crate) fn new(
        epoch: Epoch,
        position_ecef_m: Vector3<f64>,
        clock_bias_m: f64,
        state: SolverState,
    ) -> Self {
        Self {
            epoch,
            position_ecef_m,
            velocity_ecef_m_s: None,
            clock_bias_s: clock_bias_m / SPEED_OF_LIGHT_M_S,
            clock_drift_s_s: None,
            isb_s: Vec::new(),
            dop: DilutionOfPrecision::default(),
            contributions: Vec::new(),
            state,
        }
    }

    /// Time of week of this solution: week number and nanoseconds
    /// into the week, in the epoch's timescale.
    pub fn time_of_week(&self) -> (u32, u64) {
        self.epoch.to_time_of_week()
    }
}
