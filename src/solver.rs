//! Epoch orchestrator
use std::collections::HashMap;

use log::{debug, info, warn};
use map_3d::{ecef2geodetic, rad2deg, Ellipsoid};
use nalgebra::Vector3;

use crate::{
    bias::{BiasRuntime, IonosphereModel, TroposphereModel},
    candidate::Candidate,
    cfg::{Config, FrequencyMode},
    constants::SPEED_OF_LIGHT_M_S,
    ephemeris::{Ephemeris, EphemerisSource},
    error::Error,
    navigation::{
        dilution_of_precision, ConstellationIndexes, EstimationResult, Estimator,
        KalmanEstimator, LsqEstimator, NavObservation,
    },
    observation::RawMeasurement,
    orbit::SatelliteState,
    prelude::{Constellation, Epoch, SV},
    smoothing::Smoother,
    solutions::{PVTSolution, SVContribution, SolverState},
};

/// [Solver] drives one estimation cycle per epoch: measurement
/// filtering, satellite state propagation, estimator dispatch and the
/// `NoFix → Acquiring → Tracking` transitions. It exclusively owns all
/// cross epoch state; callers must serialize [Solver::process] calls
/// (single writer discipline).
pub struct Solver<E: EphemerisSource> {
    /// Solver parametrization
    pub cfg: Config,
    /// [EphemerisSource] collaborator
    ephemeris: E,
    /// State machine
    state: SolverState,
    /// Carrier [Smoother]
    smoother: Smoother,
    /// Active parameter set bookkeeping
    indexes: ConstellationIndexes,
    /// Instantaneous estimator
    lsq: LsqEstimator,
    /// Recursive estimator, deployed in dynamic mode
    kalman: KalmanEstimator,
    /// Broadcast ionosphere model per [Constellation]
    iono_models: HashMap<Constellation, IonosphereModel>,
    /// Last absolute fix, linearization apriori
    last_position_m: Option<Vector3<f64>>,
    /// Consecutive update counter, reset when an epoch yields nothing
    streak: u64,
    /// [Config] fingerprint captured when the estimators were formed
    fingerprint: (Vec<Constellation>, FrequencyMode, bool),
}

impl<E: EphemerisSource> Solver<E> {
    /// Create a new [Solver] from a [Config] preset and an
    /// [EphemerisSource] collaborator.
    pub fn new(cfg: Config, ephemeris: E) -> Self {
        let fingerprint = cfg.fingerprint();
        let smoother = Smoother::new(cfg.smoothing_window);
        let lsq = LsqEstimator::new(cfg.lsq_convergence_m, cfg.lsq_max_iter);
        let kalman = KalmanEstimator::new(cfg.kalman, cfg.epoch_interval_s);
        Self {
            cfg,
            ephemeris,
            state: SolverState::NoFix,
            smoother,
            indexes: ConstellationIndexes::default(),
            lsq,
            kalman,
            iono_models: HashMap::new(),
            last_position_m: None,
            streak: 0,
            fingerprint,
        }
    }

    /// Current state machine position
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Number of consecutive epochs that produced an update. Resets
    /// whenever an epoch yields nothing.
    pub fn consecutive_updates(&self) -> u64 {
        self.streak
    }

    /// Update the broadcast ionosphere model for this [Constellation],
    /// as decoded by the ephemeris collaborator.
    pub fn update_ionosphere_model(&mut self, constellation: Constellation, model: IonosphereModel) {
        self.iono_models.insert(constellation, model);
    }

    /// Externally signaled reset: discard all cross epoch state and
    /// return to [SolverState::NoFix].
    pub fn reset(&mut self) {
        info!("external reset");
        self.state = SolverState::NoFix;
        self.smoother.reset();
        self.indexes.reset();
        self.kalman = KalmanEstimator::new(self.cfg.kalman, self.cfg.epoch_interval_s);
        self.last_position_m = None;
        self.streak = 0;
    }

    /// Run one estimation cycle. All error returns are per epoch and
    /// recoverable: feed the next epoch normally.
    pub fn process(
        &mut self,
        epoch: Epoch,
        measurements: &[RawMeasurement],
    ) -> Result<PVTSolution, Error> {
        if self.fingerprint != self.cfg.fingerprint() {
            warn!("{} - configuration changed, estimators reset", epoch);
            self.fingerprint = self.cfg.fingerprint();
            self.reset();
            return Err(Error::ConfigurationChanged);
        }

        if self.state == SolverState::NoFix {
            self.state = SolverState::Acquiring;
        }

        let mut discarded = Vec::<SVContribution>::new();

        let mut pool = self.form_candidates(epoch, measurements);
        self.propagate(epoch, &mut pool);

        // policies that need an apriori position: bootstrap from a
        // coarse, uncorrected fix when none exists yet
        let apriori_m = match self.last_position_m {
            Some(position_m) => position_m,
            None => self.bootstrap(&pool)?,
        };

        self.apply_masks_and_corrections(epoch, apriori_m, &mut pool, &mut discarded);

        // constellation bookkeeping over the surviving pool only, so
        // every active column is observed this epoch. Iterating the
        // enabled list keeps the first seen order deterministic.
        let mut grown = false;
        for constellation in self.cfg.constellations.clone() {
            if pool.iter().any(|cd| cd.sv.constellation == constellation)
                && self.indexes.register(constellation)
            {
                grown = true;
            }
        }

        if self.state == SolverState::Tracking {
            while self.kalman.num_isb() < self.indexes.num_secondaries() {
                self.kalman.grow();
            }
            if grown {
                debug!("{} - parameter set grew during tracking", epoch);
            }
        }

        if pool.len() < self.cfg.min_sv_count() {
            warn!(
                "{} - {} satellites, {} required: no update",
                epoch,
                pool.len(),
                self.cfg.min_sv_count()
            );
            self.streak = 0;
            return Err(Error::InsufficientSatellites);
        }

        let observations = self.nav_observations(&pool);

        let result = match self.state {
            SolverState::Tracking => self.tracking_cycle(epoch, &observations)?,
            _ => self.acquisition_cycle(epoch, apriori_m, &observations)?,
        };

        self.streak += 1;
        self.last_position_m = Some(result.position_m);

        Ok(self.form_solution(epoch, result, &observations, discarded))
    }

    /// Validate, decode, smooth and merge raw measurements into per
    /// [SV] candidates. Invalid records are silently excluded.
    fn form_candidates(&mut self, epoch: Epoch, measurements: &[RawMeasurement]) -> Vec<Candidate> {
        let mut per_sv = HashMap::<SV, Vec<(Epoch, crate::observation::Observation)>>::new();

        for raw in measurements.iter() {
            if !raw.validate(&self.cfg) {
                continue;
            }
            match raw.decode(&self.cfg) {
                Ok(mut observation) => {
                    if self.cfg.code_smoothing {
                        self.smoother.smooth(raw.sv, &mut observation);
                    }
                    per_sv
                        .entry(raw.sv)
                        .or_default()
                        .push((raw.tx_time, observation));
                },
                Err(e) => {
                    debug!("{}({}) - dropped: {}", epoch, raw.sv, e);
                },
            }
        }

        let mut pool = Vec::with_capacity(per_sv.len());

        for (sv, decoded) in per_sv {
            let tx_epoch = decoded
                .iter()
                .find(|(_, ob)| ob.carrier.is_primary_band())
                .map(|(tx, _)| *tx)
                .unwrap_or(decoded[0].0);
            let observations = decoded.into_iter().map(|(_, ob)| ob).collect();
            let candidate = Candidate::new(sv, epoch, tx_epoch, observations);
            if candidate.matches_frequency_mode(&self.cfg) {
                pool.push(candidate);
            } else {
                debug!("{}({}) - does not match frequency mode", epoch, sv);
            }
        }

        pool
    }

    /// Resolve each candidate's satellite state from its ephemeris
    /// frame. Candidates without a valid frame are excluded.
    fn propagate(&self, epoch: Epoch, pool: &mut Vec<Candidate>) {
        let cfg = &self.cfg;
        let ephemeris = &self.ephemeris;

        pool.retain_mut(|cd| {
            let frame = match ephemeris.ephemeris_data(epoch, cd.sv) {
                Some(frame) => frame,
                None => {
                    debug!("{}({}) - {}", epoch, cd.sv, Error::EphemerisMissing(cd.sv));
                    return false;
                },
            };

            if !frame.is_valid(epoch) {
                debug!("{}({}) - outdated ephemeris", epoch, cd.sv);
                return false;
            }

            let t_tx = cd.tx_epoch;

            let (position_m, velocity_m_s, mut clock_bias_s) = match &frame {
                Ephemeris::Keplerian(kepler) => {
                    let (position_m, velocity_m_s) = kepler.resolve_state(cd.sv, t_tx);
                    let mut clock_bias_s = kepler.clock_bias_s(t_tx);
                    if cfg.modeling.relativistic_clock_bias {
                        clock_bias_s += kepler.relativistic_clock_correction_s(t_tx);
                    }
                    if cfg.modeling.sv_total_group_delay
                        && cfg.frequency_mode != FrequencyMode::IonoFree
                    {
                        clock_bias_s -= kepler.tgd_s;
                    }
                    (position_m, velocity_m_s, clock_bias_s)
                },
                Ephemeris::Integrated(state) => {
                    let (position_m, velocity_m_s) = state.resolve_state(cd.sv, t_tx);
                    (position_m, velocity_m_s, state.clock_bias_s(t_tx))
                },
            };

            if !cfg.modeling.sv_clock_bias {
                clock_bias_s = 0.0;
            }

            let mut state = SatelliteState {
                sv: cd.sv,
                position_m,
                velocity_m_s,
                clock_bias_m: clock_bias_s * SPEED_OF_LIGHT_M_S,
                elevation_deg: 0.0,
                azimuth_deg: 0.0,
                iono_delay_m: 0.0,
            };

            if cfg.modeling.earth_rotation {
                state.earth_rotation_correction(cd.transit_s());
            }

            cd.state = Some(state);
            true
        });
    }

    /// Coarse acquisition fix: no elevation mask, no atmospheric
    /// corrections, zero initial guess. Gives the linearization
    /// apriori for the corrected pass.
    fn bootstrap(&mut self, pool: &[Candidate]) -> Result<Vector3<f64>, Error> {
        let mut indexes = ConstellationIndexes::default();
        for constellation in self.cfg.constellations.iter() {
            if pool.iter().any(|cd| cd.sv.constellation == *constellation) {
                indexes.register(*constellation);
            }
        }

        let observations = self.nav_observations(pool);
        if observations.len() < 4 + indexes.num_secondaries() {
            self.streak = 0;
            return Err(Error::InsufficientSatellites);
        }

        let mut coarse = LsqEstimator::new(self.cfg.lsq_convergence_m, self.cfg.lsq_max_iter);
        let result = coarse.estimate(&observations, &indexes)?;

        debug!("bootstrap fix: {:?}", result.position_m);
        Ok(result.position_m)
    }

    /// Elevation/azimuth resolution, elevation masking and
    /// atmospheric corrections, against the apriori position.
    fn apply_masks_and_corrections(
        &self,
        epoch: Epoch,
        apriori_m: Vector3<f64>,
        pool: &mut Vec<Candidate>,
        discarded: &mut Vec<SVContribution>,
    ) {
        let (lat_rad, lon_rad, alt_m) =
            ecef2geodetic(apriori_m.x, apriori_m.y, apriori_m.z, Ellipsoid::WGS84);
        let rx_geo_deg_deg_m = (rad2deg(lat_rad), rad2deg(lon_rad), alt_m);

        let cfg = &self.cfg;
        let iono_models = &self.iono_models;

        pool.retain_mut(|cd| {
            let frequency_hz = cd
                .primary_observation()
                .map(|ob| ob.carrier.frequency_hz())
                .unwrap_or(1575.42E6);

            let state = cd.state.as_mut().expect("internal error: unresolved state");

            state.elevation_azimuth(apriori_m);

            if state.elevation_deg < cfg.min_sv_elev_deg {
                debug!(
                    "{}({}) - elevation {:.1}° below mask",
                    epoch, cd.sv, state.elevation_deg
                );
                discarded.push(SVContribution {
                    sv: cd.sv,
                    elevation_deg: state.elevation_deg,
                    azimuth_deg: state.azimuth_deg,
                    residual_m: 0.0,
                    in_use: false,
                });
                return false;
            }

            let rtm = BiasRuntime {
                t: epoch,
                rx_geo_deg_deg_m,
                sv_elev_azim_deg: (state.elevation_deg, state.azimuth_deg),
                frequency_hz,
            };

            if cfg.modeling.tropo_delay {
                cd.tropo_delay_m = TroposphereModel::delay_m(&rtm);
            }

            if cfg.modeling.iono_delay && cfg.frequency_mode != FrequencyMode::IonoFree {
                let model = iono_models
                    .get(&cd.sv.constellation)
                    .copied()
                    .unwrap_or_default();
                state.iono_delay_m = model.delay_m(&rtm);
            }

            true
        });
    }

    /// Turn the surviving pool into estimator records
    fn nav_observations(&self, pool: &[Candidate]) -> Vec<NavObservation> {
        let mut observations = Vec::with_capacity(pool.len() * 2);
        for cd in pool.iter() {
            match cd.nav_observations(&self.cfg) {
                Ok(records) => observations.extend(records),
                Err(e) => debug!("{}({}) - no contribution: {}", cd.epoch, cd.sv, e),
            }
        }
        observations
    }

    /// Acquisition: instantaneous weighted least squares fix. In
    /// dynamic mode a valid fix initializes the recursive filter and
    /// moves the machine to [SolverState::Tracking].
    fn acquisition_cycle(
        &mut self,
        epoch: Epoch,
        apriori_m: Vector3<f64>,
        observations: &[NavObservation],
    ) -> Result<EstimationResult, Error> {
        self.lsq.with_apriori(apriori_m);

        let result = match self.lsq.estimate(observations, &self.indexes) {
            Ok(result) => result,
            Err(e) => {
                self.streak = 0;
                return Err(e);
            },
        };

        debug!(
            "{} - acquisition fix in {} iterations",
            epoch, self.lsq.iterations
        );

        if self.cfg.dynamic {
            self.kalman = KalmanEstimator::new(self.cfg.kalman, self.cfg.epoch_interval_s);
            self.kalman
                .initialize(result.position_m, result.clock_bias_m, &result.isb_m);
            self.state = SolverState::Tracking;
            info!("{} - now tracking", epoch);
        }

        Ok(result)
    }

    /// Tracking: divergence watchdog against the instantaneous fix,
    /// then one recursive filter cycle.
    fn tracking_cycle(
        &mut self,
        epoch: Epoch,
        observations: &[NavObservation],
    ) -> Result<EstimationResult, Error> {
        let predicted_m = self.kalman.predicted_position_m();

        // absolute reference for the watchdog and DOP; a singular
        // instantaneous solve skips the check for this epoch
        self.lsq.with_apriori(predicted_m);
        let lsq_fix = self.lsq.estimate(observations, &self.indexes).ok();

        if let Some(fix) = &lsq_fix {
            let divergence_m = (predicted_m - fix.position_m).norm();
            if divergence_m > self.cfg.max_divergence_m {
                warn!(
                    "{} - diverged by {:.2} m: back to acquisition",
                    epoch, divergence_m
                );
                self.state = SolverState::Acquiring;
                self.kalman = KalmanEstimator::new(self.cfg.kalman, self.cfg.epoch_interval_s);
                self.streak = 0;
                return Err(Error::LargeDivergence);
            }
        }

        match self.kalman.estimate(observations, &self.indexes) {
            Ok(result) => Ok(result),
            Err(e) => {
                // prediction carried forward, prior output retained
                warn!("{} - filter update aborted: {}", epoch, e);
                Err(e)
            },
        }
    }

    /// Attach diagnostics and DOP to the estimation product
    fn form_solution(
        &self,
        epoch: Epoch,
        result: EstimationResult,
        observations: &[NavObservation],
        discarded: Vec<SVContribution>,
    ) -> PVTSolution {
        let mut solution = PVTSolution::new(epoch, result.position_m, result.clock_bias_m, self.state);

        solution.velocity_ecef_m_s = result.velocity_m_s;
        solution.clock_drift_s_s = result.clock_drift_m_s.map(|d| d / SPEED_OF_LIGHT_M_S);
        solution.isb_s = result
            .isb_m
            .iter()
            .map(|isb| isb / SPEED_OF_LIGHT_M_S)
            .collect();

        if let Some(cofactor) = &self.lsq.cofactor {
            if cofactor.nrows() >= 4 {
                solution.dop = dilution_of_precision(cofactor, result.position_m);
            }
        }

        // one diagnostics entry per SV: distinct signals of the same
        // SV share the entry, worst residual wins
        for (sv, residual_m) in result.residuals_m.iter() {
            match solution.contributions.iter_mut().find(|c| c.sv == *sv) {
                Some(entry) => {
                    if residual_m.abs() > entry.residual_m.abs() {
                        entry.residual_m = *residual_m;
                    }
                },
                None => {
                    let (elevation_deg, azimuth_deg) = observations
                        .iter()
                        .find(|ob| ob.sv == *sv)
                        .map(|ob| (ob.elevation_deg, ob.azimuth_deg))
                        .unwrap_or((0.0, 0.0));
                    solution.contributions.push(SVContribution {
                        sv: *sv,
                        elevation_deg,
                        azimuth_deg,
                        residual_m: *residual_m,
                        in_use: true,
                    });
                },
            }
        }

        solution.contributions.extend(discarded);
        solution
    }
}
