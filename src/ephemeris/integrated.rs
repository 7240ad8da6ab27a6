//! Numerically integrated orbit propagation (Glonass family)
use log::debug;
use nalgebra::Vector3;

use crate::{
    constants::{
        EARTH_ANGULAR_VEL_RAD, EARTH_EQUATORIAL_RADIUS_M, EARTH_GRAVITATION_MU_PZ90_M3_S2,
        EARTH_J2,
    },
    ephemeris::default_integrated_validity,
    prelude::{Duration, Epoch, SV},
};

/// Broadcast reference state for numerically integrated orbits:
/// Earth fixed position/velocity and lunisolar acceleration at the
/// reference time, plus the two parameter clock model.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegratedEphemeris {
    /// Reference time (t_b), expressed in the constellation timescale
    pub t_ref: Epoch,

    /// Earth fixed position at reference time, in meters
    pub position_m: Vector3<f64>,

    /// Earth fixed velocity at reference time, in m/s
    pub velocity_m_s: Vector3<f64>,

    /// Broadcast lunisolar acceleration at reference time, in m/s²
    pub lunisolar_accel_m_s2: Vector3<f64>,

    /// Clock bias -τ at reference time, in seconds
    pub tau_s: f64,

    /// Relative frequency bias γ
    pub gamma: f64,

    /// Validity window around t_ref
    pub validity: Duration,
}

impl Default for IntegratedEphemeris {
    fn default() -> Self {
        Self {
            t_ref: Epoch::default(),
            position_m: Vector3::zeros(),
            velocity_m_s: Vector3::zeros(),
            lunisolar_accel_m_s2: Vector3::zeros(),
            tau_s: 0.0,
            gamma: 0.0,
            validity: default_integrated_validity(),
        }
    }
}

/// Integration step, in seconds
const STEP_S: f64 = 150.0;

/// Gravitational acceleration in the inertial frame: central term
/// plus second zonal harmonic, plus the broadcast lunisolar
/// perturbation rotated to the current inertial orientation.
fn acceleration(r: Vector3<f64>, lunisolar_eci: Vector3<f64>) -> Vector3<f64> {
    let rho = r.norm();
    let mu_r3 = EARTH_GRAVITATION_MU_PZ90_M3_S2 / rho.powi(3);

    let j2_factor = 1.5 * EARTH_J2 * (EARTH_EQUATORIAL_RADIUS_M / rho).powi(2);
    let z2_r2 = (r.z / rho).powi(2);

    let mut acc = Vector3::zeros();
    acc.x = -mu_r3 * r.x * (1.0 + j2_factor * (1.0 - 5.0 * z2_r2));
    acc.y = -mu_r3 * r.y * (1.0 + j2_factor * (1.0 - 5.0 * z2_r2));
    acc.z = -mu_r3 * r.z * (1.0 + j2_factor * (3.0 - 5.0 * z2_r2));

    acc + lunisolar_eci
}

fn rotation_z(theta_rad: f64) -> nalgebra::Matrix3<f64> {
    let (sin_t, cos_t) = theta_rad.sin_cos();
    nalgebra::Matrix3::new(
        cos_t, -sin_t, 0.0, //
        sin_t, cos_t, 0.0, //
        0.0, 0.0, 1.0,
    )
}

impl IntegratedEphemeris {
    /// Resolves the orbital state at transmission time by fixed step
    /// 4th order Runge-Kutta integration of the reference state,
    /// carried out in an Earth centered inertial frame aligned with
    /// the Earth fixed frame at t_ref.
    pub(crate) fn resolve_state(&self, sv: SV, t_tx: Epoch) -> (Vector3<f64>, Vector3<f64>) {
        let dt_total = (t_tx - self.t_ref).to_seconds();

        // rotate reference state into the inertial frame (identity at t_ref,
        // velocity picks up the frame rotation term)
        let omega = Vector3::new(0.0, 0.0, EARTH_ANGULAR_VEL_RAD);
        let mut r = self.position_m;
        let mut v = self.velocity_m_s + omega.cross(&self.position_m);

        let mut elapsed = 0.0_f64;
        let direction = dt_total.signum();

        while (dt_total - elapsed).abs() > 1.0E-9 {
            let step = direction * STEP_S.min((dt_total - elapsed).abs());

            // lunisolar acceleration, rotated to the current inertial orientation
            let lunisolar = rotation_z(EARTH_ANGULAR_VEL_RAD * elapsed) * self.lunisolar_accel_m_s2;

            let k1_r = v;
            let k1_v = acceleration(r, lunisolar);

            let k2_r = v + k1_v * (step / 2.0);
            let k2_v = acceleration(r + k1_r * (step / 2.0), lunisolar);

            let k3_r = v + k2_v * (step / 2.0);
            let k3_v = acceleration(r + k2_r * (step / 2.0), lunisolar);

            let k4_r = v + k3_v * step;
            let k4_v = acceleration(r + k3_r * step, lunisolar);

            r += (k1_r + k2_r * 2.0 + k3_r * 2.0 + k4_r) * (step / 6.0);
            v += (k1_v + k2_v * 2.0 + k3_v * 2.0 + k4_v) * (step / 6.0);

            elapsed += step;
        }

        // back to the Earth fixed frame at t_tx
        let theta = EARTH_ANGULAR_VEL_RAD * dt_total;
        let rot = rotation_z(-theta);

        let r_ecef = rot * r;
        let v_ecef = rot * v - omega.cross(&r_ecef);

        debug!(
            "{}({}) - integrated x={:.1} y={:.1} z={:.1} dt={:.1}",
            t_tx, sv, r_ecef.x, r_ecef.y, r_ecef.z, dt_total
        );

        (r_ecef, v_ecef)
    }

    /// Onboard clock offset to system time at transmission time,
    /// in seconds: -τ + γ·(t − t_ref)
    pub(crate) fn clock_bias_s(&self, t_tx: Epoch) -> f64 {
        let dt_s = (t_tx - self.t_ref).to_seconds();
        -self.tau_s + self.gamma * dt_s
    }
}
