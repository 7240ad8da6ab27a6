#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod bias;
mod candidate;
mod carrier;
mod cfg;
mod constants;
mod ephemeris;
mod error;
mod navigation;
mod observation;
mod orbit;
mod smoothing;
mod solutions;
mod solver;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::bias::{BdsModel, IonosphereModel, KbModel};
    pub use crate::bias::{saastamoinen_delay_m, TroposphereModel};
    pub use crate::candidate::Candidate;
    pub use crate::carrier::Carrier;
    pub use crate::cfg::{Config, FrequencyMode, KalmanTuning, Modeling, WeightModel};
    pub use crate::ephemeris::{Ephemeris, EphemerisSource, IntegratedEphemeris, KeplerianEphemeris};
    pub use crate::error::Error;
    pub use crate::observation::{Observation, RawMeasurement};
    pub use crate::orbit::SatelliteState;
    pub use crate::solutions::{DilutionOfPrecision, PVTSolution, SVContribution, SolverState};
    pub use crate::solver::Solver;
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale, Unit};
    pub use nalgebra::Vector3;
}

pub use error::Error;
