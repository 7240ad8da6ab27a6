//! Iterative weighted least squares estimation
use log::debug;
use nalgebra::{DMatrix, DVector, Vector3};

use crate::{
    error::Error,
    navigation::{ConstellationIndexes, EstimationResult, Estimator, NavObservation},
};

/// Instantaneous weighted least squares estimator, used for
/// acquisition and as the absolute reference during tracking.
/// State: position(3) + primary clock bias + one inter system offset
/// per secondary constellation.
#[derive(Debug, Clone)]
pub(crate) struct LsqEstimator {
    /// Convergence criterion on ‖ΔX‖, in meters
    convergence_m: f64,
    /// Iteration cap, guaranteeing termination
    max_iter: usize,
    /// Initial position guess for the linearization
    pub apriori_m: Vector3<f64>,
    /// Unweighted cofactor matrix (AᵗA)⁻¹ of the last solve, for DOP
    pub cofactor: Option<DMatrix<f64>>,
    /// Iterations spent in the last solve
    pub iterations: usize,
}

impl LsqEstimator {
    pub fn new(convergence_m: f64, max_iter: usize) -> Self {
        Self {
            convergence_m,
            max_iter,
            apriori_m: Vector3::zeros(),
            cofactor: None,
            iterations: 0,
        }
    }

    /// Solve from given apriori instead of the stored one
    pub fn with_apriori(&mut self, apriori_m: Vector3<f64>) -> &mut Self {
        self.apriori_m = apriori_m;
        self
    }
}

impl Estimator for LsqEstimator {
    fn estimate(
        &mut self,
        observations: &[NavObservation],
        indexes: &ConstellationIndexes,
    ) -> Result<EstimationResult, Error> {
        let num_isb = indexes.num_secondaries();
        let dim = 4 + num_isb;
        let rows = observations.len();

        if rows < dim {
            return Err(Error::InsufficientSatellites);
        }

        // state: [x, y, z, dt, isb...]
        let mut x = DVector::<f64>::zeros(dim);
        x[0] = self.apriori_m[0];
        x[1] = self.apriori_m[1];
        x[2] = self.apriori_m[2];

        let mut a = DMatrix::<f64>::zeros(rows, dim);
        let mut b = DVector::<f64>::zeros(rows);
        let w = DMatrix::<f64>::from_diagonal(&DVector::from_iterator(
            rows,
            observations.iter().map(|ob| 1.0 / ob.variance_m2),
        ));

        self.iterations = 0;

        loop {
            let position_m = Vector3::new(x[0], x[1], x[2]);

            for (i, ob) in observations.iter().enumerate() {
                let clock_m = match indexes.isb_slot(ob.sv.constellation) {
                    Some(slot) => x[3] + x[4 + slot],
                    None => x[3],
                };

                let los = ob.los_partials(position_m);
                a[(i, 0)] = los[0];
                a[(i, 1)] = los[1];
                a[(i, 2)] = los[2];
                a[(i, 3)] = 1.0;
                for slot in 0..num_isb {
                    a[(i, 4 + slot)] = 0.0;
                }
                if let Some(slot) = indexes.isb_slot(ob.sv.constellation) {
                    a[(i, 4 + slot)] = 1.0;
                }

                b[i] = ob.misclosure_m(position_m, clock_m);
            }

            let at_w = a.transpose() * &w;
            let n = &at_w * &a;
            let n_inv = n.try_inverse().ok_or(Error::SingularMatrix)?;

            let dx = n_inv * (at_w * &b);
            x += &dx;

            self.iterations += 1;

            debug!(
                "lsq iter {} - ‖dx‖={:.4} m",
                self.iterations,
                dx.norm()
            );

            if dx.norm() < self.convergence_m || self.iterations >= self.max_iter {
                break;
            }
        }

        let position_m = Vector3::new(x[0], x[1], x[2]);

        // cofactor from the unweighted design at the solution
        self.cofactor = (a.transpose() * &a).try_inverse();

        let residuals_m = observations
            .iter()
            .map(|ob| {
                let clock_m = match indexes.isb_slot(ob.sv.constellation) {
                    Some(slot) => x[3] + x[4 + slot],
                    None => x[3],
                };
                (ob.sv, ob.misclosure_m(position_m, clock_m))
            })
            .collect();

        self.apriori_m = position_m;

        Ok(EstimationResult {
            position_m,
            velocity_m_s: None,
            clock_bias_m: x[3],
            clock_drift_m_s: None,
            isb_m: (0..num_isb).map(|slot| x[4 + slot]).collect(),
            residuals_m,
        })
    }
}
