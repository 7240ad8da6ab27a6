//! Position solving candidate
use itertools::Itertools;
use log::debug;

use crate::{
    carrier::Carrier,
    cfg::{Config, FrequencyMode},
    error::Error,
    navigation::NavObservation,
    observation::Observation,
    orbit::SatelliteState,
    prelude::{Epoch, SV},
};

/// Ionosphere free combination of two bands
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Combination {
    /// Primary (reference) [Carrier]
    pub lhs: Carrier,
    /// Secondary [Carrier]
    pub rhs: Carrier,
    /// Combined pseudo range, in meters
    pub pseudo_range_m: f64,
    /// Combined phase range, in meters
    pub phase_range_m: Option<f64>,
}

/// One [SV]'s contribution proposal for one epoch: merged per band
/// observations, resolved state and modeled corrections.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// [SV] identity
    pub sv: SV,

    /// Sampling [Epoch] (receive time)
    pub epoch: Epoch,

    /// Merged per band [Observation]s
    pub(crate) observations: Vec<Observation>,

    /// Transmission time, as decoded
    pub(crate) tx_epoch: Epoch,

    /// Resolved [SatelliteState], None until propagation
    pub(crate) state: Option<SatelliteState>,

    /// Modeled troposphere delay, in meters
    pub(crate) tropo_delay_m: f64,
}

impl Candidate {
    /// Builds a new [Candidate] from same-[SV] observations merged
    /// across bands.
    pub(crate) fn new(sv: SV, epoch: Epoch, tx_epoch: Epoch, observations: Vec<Observation>) -> Self {
        Self {
            sv,
            epoch,
            tx_epoch,
            observations,
            state: None,
            tropo_delay_m: 0.0,
        }
    }

    /// Observed primary band (L1 like) [Observation]
    pub(crate) fn primary_observation(&self) -> Option<&Observation> {
        self.observations
            .iter()
            .filter(|ob| ob.carrier.is_primary_band())
            .reduce(|k, _| k)
    }

    /// Observed secondary band [Observation]
    pub(crate) fn secondary_observation(&self) -> Option<&Observation> {
        self.observations
            .iter()
            .filter(|ob| !ob.carrier.is_primary_band())
            .reduce(|k, _| k)
    }

    /// True if two distinct bands were observed
    pub(crate) fn is_dual_band(&self) -> bool {
        self.observations
            .iter()
            .map(|ob| ob.carrier)
            .unique()
            .count()
            > 1
    }

    /// Forms the ionosphere free pseudo range (and phase, when both
    /// phases exist) combination: α·P₁ − (α−1)·P₂ with
    /// α = f₁²/(f₁²−f₂²).
    pub(crate) fn iono_free_combination(&self) -> Result<Combination, Error> {
        let c1 = self.primary_observation().ok_or(Error::IonoFreeCombination)?;
        let c2 = self
            .secondary_observation()
            .ok_or(Error::IonoFreeCombination)?;

        let f1_hz = c1.carrier.frequency_hz();
        let f2_hz = c2.carrier.frequency_hz();
        let alpha = f1_hz.powi(2) / (f1_hz.powi(2) - f2_hz.powi(2));

        let pseudo_range_m = alpha * c1.pseudo_range_m - (alpha - 1.0) * c2.pseudo_range_m;

        let phase_range_m = match (c1.phase_range_m, c2.phase_range_m) {
            (Some(l1_m), Some(l2_m)) => Some(alpha * l1_m - (alpha - 1.0) * l2_m),
            _ => None,
        };

        Ok(Combination {
            lhs: c1.carrier,
            rhs: c2.carrier,
            pseudo_range_m,
            phase_range_m,
        })
    }

    /// True if this [Candidate] carries the signals the selected
    /// frequency mode requires.
    pub(crate) fn matches_frequency_mode(&self, cfg: &Config) -> bool {
        match cfg.frequency_mode {
            FrequencyMode::Single => self.primary_observation().is_some(),
            FrequencyMode::Dual | FrequencyMode::IonoFree => self.is_dual_band(),
        }
    }

    /// Signal transit duration in seconds
    pub(crate) fn transit_s(&self) -> f64 {
        (self.epoch - self.tx_epoch).to_seconds()
    }

    /// Turns this [Candidate] into the navigation observation records
    /// the estimators consume, one per contributing signal.
    pub(crate) fn nav_observations(&self, cfg: &Config) -> Result<Vec<NavObservation>, Error> {
        let state = self
            .state
            .as_ref()
            .unwrap_or_else(|| panic!("internal error: unresolved candidate state"));

        let mut records = Vec::with_capacity(2);

        let mut push = |ob: &Observation, pseudo_range_m: f64, iono_scale: f64| {
            records.push(NavObservation {
                sv: self.sv,
                sv_position_m: state.position_m,
                sv_velocity_m_s: state.velocity_m_s,
                sv_clock_bias_m: state.clock_bias_m,
                pseudo_range_m,
                range_rate_m_s: ob.range_rate_m_s,
                tropo_delay_m: self.tropo_delay_m,
                iono_delay_m: state.iono_delay_m * iono_scale,
                variance_m2: cfg.weight.variance_m2(ob.cn0_dbhz),
                elevation_deg: state.elevation_deg,
                azimuth_deg: state.azimuth_deg,
            });
        };

        match cfg.frequency_mode {
            FrequencyMode::Single => {
                let ob = self.primary_observation().ok_or(Error::MissingPseudoRange)?;
                push(ob, ob.pseudo_range_m, 1.0);
            },
            FrequencyMode::Dual => {
                let c1 = self.primary_observation().ok_or(Error::MissingPseudoRange)?;
                let c2 = self
                    .secondary_observation()
                    .ok_or(Error::MissingPseudoRange)?;
                let f1_hz = c1.carrier.frequency_hz();
                let f2_hz = c2.carrier.frequency_hz();
                push(c1, c1.pseudo_range_m, 1.0);
                // first order delay scales with the inverse frequency squared
                push(c2, c2.pseudo_range_m, (f1_hz / f2_hz).powi(2));
            },
            FrequencyMode::IonoFree => {
                let combination = self.iono_free_combination()?;
                let ob = self.primary_observation().ok_or(Error::MissingPseudoRange)?;
                debug!(
                    "{}({}) - iono free {}/{}: {:.3} m",
                    self.epoch, self.sv, combination.lhs, combination.rhs, combination.pseudo_range_m
                );
                // combination cancels the first order ionosphere term
                push(ob, combination.pseudo_range_m, 0.0);
            },
        }

        Ok(records)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::Constellation;

    fn observation(carrier: Carrier, pseudo_range_m: f64, phase_range_m: Option<f64>) -> Observation {
        Observation {
            carrier,
            pseudo_range_m,
            phase_range_m,
            range_rate_m_s: 0.0,
            cn0_dbhz: 40.0,
            locked: true,
            slip_count: 0,
        }
    }

    #[test]
    fn l1_l5_iono_free() {
        let sv = SV::new(Constellation::GPS, 1);
        let cd = Candidate::new(
            sv,
            Epoch::default(),
            Epoch::default(),
            vec![
                observation(Carrier::L1, 64.0, Some(66.0)),
                observation(Carrier::L5, 128.0, Some(130.0)),
            ],
        );

        assert!(cd.is_dual_band());

        let combination = cd.iono_free_combination().unwrap();
        assert_eq!(combination.lhs, Carrier::L1);
        assert_eq!(combination.rhs, Carrier::L5);

        let f1 = Carrier::L1.frequency_hz();
        let f2 = Carrier::L5.frequency_hz();
        let alpha = f1.powi(2) / (f1.powi(2) - f2.powi(2));

        assert_eq!(
            combination.pseudo_range_m,
            alpha * 64.0 - (alpha - 1.0) * 128.0
        );
        assert_eq!(
            combination.phase_range_m,
            Some(alpha * 66.0 - (alpha - 1.0) * 130.0)
        );
    }

    #[test]
    fn single_band_cannot_combine() {
        let sv = SV::new(Constellation::GPS, 2);
        let cd = Candidate::new(
            sv,
            Epoch::default(),
            Epoch::default(),
            vec![observation(Carrier::L1, 64.0, None)],
        );

        assert!(!cd.is_dual_band());
        assert!(cd.iono_free_combination().is_err());

        let cfg = Config::default();
        assert!(cd.matches_frequency_mode(&cfg), "single frequency default");

        let cfg = Config {
            frequency_mode: FrequencyMode::IonoFree,
            ..Default::default()
        };
        assert!(!cd.matches_frequency_mode(&cfg));
    }
}
