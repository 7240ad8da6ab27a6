//! Recursive Kalman filter estimation
use std::f64::consts::PI;

use log::debug;
use nalgebra::{DMatrix, DVector, Vector3};

use crate::{
    cfg::KalmanTuning,
    error::Error,
    navigation::{ConstellationIndexes, EstimationResult, Estimator, NavObservation},
};

/// Position column offset
const POS: usize = 0;
/// Velocity column offset
const VEL: usize = 3;
/// Clock bias column
const CLK: usize = 6;
/// Clock drift column
const DRIFT: usize = 7;
/// First inter system offset column
const ISB: usize = 8;

/// Recursive estimator for steady state dynamic tracking.
/// State: position(3), velocity(3), clock bias, clock drift, plus one
/// inter system offset per secondary constellation, appended in first
/// seen order. The column ordering stays fixed for the lifetime of the
/// parameter set; growth is an explicit migration that copies the
/// existing sub block unchanged into the enlarged vector.
#[derive(Debug, Clone)]
pub(crate) struct KalmanEstimator {
    /// Filter tuning
    tuning: KalmanTuning,
    /// Epoch interval driving the transition matrix, in seconds
    dt_s: f64,
    /// True once initialized from an acquisition fix
    initialized: bool,
    /// Predicted (a priori) state for the ongoing epoch
    x: DVector<f64>,
    /// Predicted (a priori) covariance
    p: DMatrix<f64>,
}

impl KalmanEstimator {
    pub fn new(tuning: KalmanTuning, dt_s: f64) -> Self {
        Self {
            tuning,
            dt_s,
            initialized: false,
            x: DVector::zeros(ISB),
            p: DMatrix::zeros(ISB, ISB),
        }
    }

    /// True once [Self::initialize] ran
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize from an acquisition fix, then predict once: the
    /// filter is ready for the next update.
    pub fn initialize(
        &mut self,
        position_m: Vector3<f64>,
        clock_bias_m: f64,
        isb_m: &[f64],
    ) {
        let dim = ISB + isb_m.len();

        self.x = DVector::zeros(dim);
        for i in 0..3 {
            self.x[POS + i] = position_m[i];
        }
        self.x[CLK] = clock_bias_m;
        for (slot, isb) in isb_m.iter().enumerate() {
            self.x[ISB + slot] = *isb;
        }

        self.p = DMatrix::zeros(dim, dim);
        for i in 0..3 {
            self.p[(POS + i, POS + i)] = self.tuning.apriori_position_sigma_m.powi(2);
            self.p[(VEL + i, VEL + i)] = self.tuning.apriori_velocity_sigma_m_s.powi(2);
        }
        self.p[(CLK, CLK)] = self.tuning.apriori_clock_sigma_m.powi(2);
        self.p[(DRIFT, DRIFT)] = self.tuning.apriori_drift_sigma_m_s.powi(2);
        for slot in 0..isb_m.len() {
            self.p[(ISB + slot, ISB + slot)] = self.tuning.apriori_isb_sigma_m.powi(2);
        }

        self.initialized = true;
        self.predict();
    }

    /// Predicted position for the ongoing epoch
    pub fn predicted_position_m(&self) -> Vector3<f64> {
        Vector3::new(self.x[POS], self.x[POS + 1], self.x[POS + 2])
    }

    /// Number of inter system offsets in the active state
    pub fn num_isb(&self) -> usize {
        self.x.len() - ISB
    }

    /// Explicit state migration: one more secondary constellation
    /// joined the parameter set. The existing sub block is copied
    /// unchanged into the enlarged vector, the new offset column
    /// starts at zero with its a priori sigma.
    pub fn grow(&mut self) {
        let dim = self.x.len() + 1;

        let mut x = DVector::zeros(dim);
        let mut p = DMatrix::zeros(dim, dim);

        x.rows_mut(0, dim - 1).copy_from(&self.x);
        p.view_mut((0, 0), (dim - 1, dim - 1)).copy_from(&self.p);
        p[(dim - 1, dim - 1)] = self.tuning.apriori_isb_sigma_m.powi(2);

        debug!("kalman - state grown to {} parameters", dim);

        self.x = x;
        self.p = p;
    }

    /// Constant velocity / constant drift transition matrix
    fn transition(&self, dim: usize) -> DMatrix<f64> {
        let mut f = DMatrix::<f64>::identity(dim, dim);
        for i in 0..3 {
            f[(POS + i, VEL + i)] = self.dt_s;
        }
        f[(CLK, DRIFT)] = self.dt_s;
        f
    }

    /// Process noise: velocity random walk over the kinematic block,
    /// oscillator Allan variance coefficients over the clock block,
    /// small random walk over the inter system offsets.
    fn process_noise(&self, dim: usize) -> DMatrix<f64> {
        let dt = self.dt_s;
        let mut q = DMatrix::<f64>::zeros(dim, dim);

        let q_v = self.tuning.velocity_psd_m2_s3;
        for i in 0..3 {
            q[(POS + i, POS + i)] = q_v * dt.powi(3) / 3.0;
            q[(POS + i, VEL + i)] = q_v * dt.powi(2) / 2.0;
            q[(VEL + i, POS + i)] = q_v * dt.powi(2) / 2.0;
            q[(VEL + i, VEL + i)] = q_v * dt;
        }

        // clock bias / drift expressed in meters: scale by c²
        let c2 = crate::constants::SPEED_OF_LIGHT_M_S.powi(2);
        let s_f = c2 * self.tuning.h0 / 2.0;
        let s_g = c2 * 2.0 * PI.powi(2) * self.tuning.h_minus_2;

        q[(CLK, CLK)] = s_f * dt + s_g * dt.powi(3) / 3.0;
        q[(CLK, DRIFT)] = s_g * dt.powi(2) / 2.0;
        q[(DRIFT, CLK)] = s_g * dt.powi(2) / 2.0;
        q[(DRIFT, DRIFT)] = s_g * dt;

        for slot in ISB..dim {
            q[(slot, slot)] = 1.0E-4 * dt;
        }

        q
    }

    /// Propagate state and covariance one epoch interval forward
    fn predict(&mut self) {
        let dim = self.x.len();
        let f = self.transition(dim);
        let q = self.process_noise(dim);

        self.x = &f * &self.x;
        self.p = &f * &self.p * f.transpose() + q;
    }
}

impl Estimator for KalmanEstimator {
    /// One measurement update against the current prediction. On
    /// success the posterior is returned and the filter immediately
    /// predicts again, ready for the next epoch. On a singular
    /// innovation covariance the update is aborted: the prediction is
    /// kept as the carried forward estimate.
    fn estimate(
        &mut self,
        observations: &[NavObservation],
        indexes: &ConstellationIndexes,
    ) -> Result<EstimationResult, Error> {
        if !self.initialized {
            panic!("internal error: filter not initialized!");
        }

        let dim = self.x.len();
        let num_isb = indexes.num_secondaries();
        assert_eq!(
            dim,
            ISB + num_isb,
            "internal error: state/parameter set mismatch"
        );

        let position_m = self.predicted_position_m();
        let velocity_m_s = Vector3::new(self.x[VEL], self.x[VEL + 1], self.x[VEL + 2]);

        let num_rr = observations.iter().filter(|ob| ob.range_rate_m_s != 0.0).count();
        let rows = observations.len() + num_rr;

        let mut h = DMatrix::<f64>::zeros(rows, dim);
        let mut z = DVector::<f64>::zeros(rows);
        let mut r = DMatrix::<f64>::zeros(rows, rows);

        let mut row = 0;
        for ob in observations.iter() {
            let clock_m = match indexes.isb_slot(ob.sv.constellation) {
                Some(slot) => self.x[CLK] + self.x[ISB + slot],
                None => self.x[CLK],
            };

            let los = ob.los_partials(position_m);
            h[(row, POS)] = los[0];
            h[(row, POS + 1)] = los[1];
            h[(row, POS + 2)] = los[2];
            h[(row, CLK)] = 1.0;
            if let Some(slot) = indexes.isb_slot(ob.sv.constellation) {
                h[(row, ISB + slot)] = 1.0;
            }

            // innovation straight from the misclosure, evaluated at the
            // freshly predicted state (the linearization point)
            z[row] = ob.misclosure_m(position_m, clock_m);
            r[(row, row)] = ob.variance_m2;
            row += 1;
        }

        for ob in observations.iter().filter(|ob| ob.range_rate_m_s != 0.0) {
            let los = ob.los_partials(position_m);
            h[(row, VEL)] = los[0];
            h[(row, VEL + 1)] = los[1];
            h[(row, VEL + 2)] = los[2];
            h[(row, DRIFT)] = 1.0;

            let predicted_rr =
                los.dot(&(velocity_m_s - ob.sv_velocity_m_s)) + self.x[DRIFT];
            z[row] = ob.range_rate_m_s - predicted_rr;
            r[(row, row)] = self.tuning.range_rate_sigma_m_s.powi(2);
            row += 1;
        }

        let ht = h.transpose();
        let s = &h * &self.p * &ht + r;
        let s_inv = s.try_inverse().ok_or(Error::SingularMatrix)?;

        let k = &self.p * &ht * s_inv;

        let x_post = &self.x + &k * &z;
        let p_post =
            (DMatrix::<f64>::identity(dim, dim) - &k * &h) * &self.p;

        debug!(
            "kalman - update with {} rows ({} range rates)",
            rows, num_rr
        );

        let position_m = Vector3::new(x_post[POS], x_post[POS + 1], x_post[POS + 2]);
        let velocity_m_s = Vector3::new(x_post[VEL], x_post[VEL + 1], x_post[VEL + 2]);

        let residuals_m = observations
            .iter()
            .map(|ob| {
                let clock_m = match indexes.isb_slot(ob.sv.constellation) {
                    Some(slot) => x_post[CLK] + x_post[ISB + slot],
                    None => x_post[CLK],
                };
                (ob.sv, ob.misclosure_m(position_m, clock_m))
            })
            .collect();

        let result = EstimationResult {
            position_m,
            velocity_m_s: Some(velocity_m_s),
            clock_bias_m: x_post[CLK],
            clock_drift_m_s: Some(x_post[DRIFT]),
            isb_m: (0..num_isb).map(|slot| x_post[ISB + slot]).collect(),
            residuals_m,
        };

        // posterior becomes the new linearization point, predict for
        // the next epoch right away
        self.x = x_post;
        self.p = p_post;
        self.predict();

        Ok(result)
    }
}
