//! Closed form (Keplerian) orbit propagation
use log::debug;
use nalgebra::Vector3;

use crate::{
    constants::{
        EARTH_ANGULAR_VEL_RAD, EARTH_GRAVITATION_MU_M3_S2, RELATIVISTIC_CLOCK_CORR_F,
    },
    ephemeris::default_keplerian_validity,
    prelude::{Duration, Epoch, SV},
};

/// Broadcast orbital elements, harmonic corrections and clock
/// polynomial, in the units the navigation message carries them.
#[derive(Debug, Clone, PartialEq)]
pub struct KeplerianEphemeris {
    /// Time of Issue of Ephemeris, expressed in the constellation timescale
    pub toe: Epoch,

    /// Time of Clock, expressed in the constellation timescale
    pub toc: Epoch,

    /// Semi-major axis (in meters)
    pub semi_major_axis_m: f64,

    /// Eccentricity
    pub eccentricity: f64,

    /// Mean anomaly at reference time (in radians)
    pub m0_rad: f64,

    /// Inclination at reference time (in radians)
    pub i0_rad: f64,

    /// Inclination rate (in radians/s)
    pub idot_rad_s: f64,

    /// Mean motion difference (in radians/s)
    pub dn_rad_s: f64,

    /// Longitude of ascending node at reference time (in radians)
    pub omega0_rad: f64,

    /// Argument of perigee (in radians)
    pub omega_rad: f64,

    /// Rate of right ascension (in radians/s)
    pub omega_dot_rad_s: f64,

    /// Argument of latitude harmonic corrections: sine / cosine (in radians)
    pub cus_cuc_rad: (f64, f64),

    /// Inclination harmonic corrections: sine / cosine (in radians)
    pub cis_cic_rad: (f64, f64),

    /// Radius harmonic corrections: sine / cosine (in meters)
    pub crs_crc_m: (f64, f64),

    /// Clock polynomial: bias (s), drift (s/s), drift rate (s/s²)
    pub clock_af: (f64, f64, f64),

    /// Total group delay (in seconds)
    pub tgd_s: f64,

    /// Validity window around ToE
    pub validity: Duration,
}

impl Default for KeplerianEphemeris {
    fn default() -> Self {
        Self {
            toe: Epoch::default(),
            toc: Epoch::default(),
            semi_major_axis_m: 0.0,
            eccentricity: 0.0,
            m0_rad: 0.0,
            i0_rad: 0.0,
            idot_rad_s: 0.0,
            dn_rad_s: 0.0,
            omega0_rad: 0.0,
            omega_rad: 0.0,
            omega_dot_rad_s: 0.0,
            cus_cuc_rad: (0.0, 0.0),
            cis_cic_rad: (0.0, 0.0),
            crs_crc_m: (0.0, 0.0),
            clock_af: (0.0, 0.0, 0.0),
            tgd_s: 0.0,
            validity: default_keplerian_validity(),
        }
    }
}

impl KeplerianEphemeris {
    /// ToE as seconds into the constellation week
    pub(crate) fn weekly_toe_seconds(&self) -> f64 {
        self.toe.to_time_of_week().1 as f64 / 1.0E9
    }

    /// Eccentric anomaly at t_k seconds past ToE, by fixed point
    /// iteration from the mean anomaly.
    pub(crate) fn eccentric_anomaly_rad(&self, t_k: f64) -> f64 {
        const ITERATIONS: usize = 5;

        let a_3 = self.semi_major_axis_m.powi(3);
        let n0 = (EARTH_GRAVITATION_MU_M3_S2 / a_3).sqrt();
        let m_k = self.m0_rad + (n0 + self.dn_rad_s) * t_k;

        let mut e_k = m_k;
        for _ in 0..ITERATIONS {
            e_k = m_k + self.eccentricity * e_k.sin();
        }
        e_k
    }

    /// Resolves the orbital state at transmission time: ECEF position
    /// and velocity, in meters and m/s.
    pub(crate) fn resolve_state(&self, sv: SV, t_tx: Epoch) -> (Vector3<f64>, Vector3<f64>) {
        let e = self.eccentricity;
        let a = self.semi_major_axis_m;
        let (cus, cuc) = self.cus_cuc_rad;
        let (cis, cic) = self.cis_cic_rad;
        let (crs, crc) = self.crs_crc_m;

        let t_k = (t_tx - self.toe).to_seconds();

        let n = (EARTH_GRAVITATION_MU_M3_S2 / a.powi(3)).sqrt() + self.dn_rad_s;

        let e_k = self.eccentric_anomaly_rad(t_k);
        let (sin_e_k, cos_e_k) = e_k.sin_cos();

        let v_k = ((1.0 - e.powi(2)).sqrt() * sin_e_k).atan2(cos_e_k - e);

        let phi = v_k + self.omega_rad;
        let (sin_2phi, cos_2phi) = (2.0 * phi).sin_cos();

        // second harmonic corrections
        let u_k = phi + cus * sin_2phi + cuc * cos_2phi;
        let r_k = a * (1.0 - e * cos_e_k) + crs * sin_2phi + crc * cos_2phi;
        let i_k = self.i0_rad + self.idot_rad_s * t_k + cis * sin_2phi + cic * cos_2phi;

        let omega_k = self.omega0_rad + (self.omega_dot_rad_s - EARTH_ANGULAR_VEL_RAD) * t_k
            - EARTH_ANGULAR_VEL_RAD * self.weekly_toe_seconds();

        let (sin_u_k, cos_u_k) = u_k.sin_cos();
        let (sin_i_k, cos_i_k) = i_k.sin_cos();
        let (sin_omega_k, cos_omega_k) = omega_k.sin_cos();

        // orbital plane coordinates, then ECEF
        let x_p = r_k * cos_u_k;
        let y_p = r_k * sin_u_k;

        let x = x_p * cos_omega_k - y_p * cos_i_k * sin_omega_k;
        let y = x_p * sin_omega_k + y_p * cos_i_k * cos_omega_k;
        let z = y_p * sin_i_k;

        // analytic derivatives for the velocity
        let e_k_dot = n / (1.0 - e * cos_e_k);
        let v_k_dot = e_k_dot * (1.0 - e.powi(2)).sqrt() / (1.0 - e * cos_e_k);

        let u_k_dot = v_k_dot * (1.0 + 2.0 * (cus * cos_2phi - cuc * sin_2phi));
        let r_k_dot =
            a * e * sin_e_k * e_k_dot + 2.0 * v_k_dot * (crs * cos_2phi - crc * sin_2phi);
        let i_k_dot = self.idot_rad_s + 2.0 * v_k_dot * (cis * cos_2phi - cic * sin_2phi);
        let omega_k_dot = self.omega_dot_rad_s - EARTH_ANGULAR_VEL_RAD;

        let x_p_dot = r_k_dot * cos_u_k - r_k * u_k_dot * sin_u_k;
        let y_p_dot = r_k_dot * sin_u_k + r_k * u_k_dot * cos_u_k;

        let vx = x_p_dot * cos_omega_k
            - y_p_dot * cos_i_k * sin_omega_k
            + y_p * sin_i_k * i_k_dot * sin_omega_k
            - y * omega_k_dot;
        let vy = x_p_dot * sin_omega_k + y_p_dot * cos_i_k * cos_omega_k
            - y_p * sin_i_k * i_k_dot * cos_omega_k
            + x * omega_k_dot;
        let vz = y_p_dot * sin_i_k + y_p * cos_i_k * i_k_dot;

        debug!(
            "{}({}) - kepler solving x={:.1} y={:.1} z={:.1} t_k={:.1}",
            t_tx, sv, x, y, z, t_k
        );

        (Vector3::new(x, y, z), Vector3::new(vx, vy, vz))
    }

    /// Relativistic correction of the onboard clock, in seconds:
    /// Δt_rel = F·e·√a·sin(E)
    pub(crate) fn relativistic_clock_correction_s(&self, t_tx: Epoch) -> f64 {
        let t_k = (t_tx - self.toe).to_seconds();
        let e_k = self.eccentric_anomaly_rad(t_k);
        RELATIVISTIC_CLOCK_CORR_F
            * self.eccentricity
            * self.semi_major_axis_m.sqrt()
            * e_k.sin()
    }

    /// Onboard clock offset to system time at transmission time,
    /// in seconds, from the broadcast polynomial.
    pub(crate) fn clock_bias_s(&self, t_tx: Epoch) -> f64 {
        let (af0, af1, af2) = self.clock_af;
        let dt_s = (t_tx - self.toc).to_seconds();
        af0 + af1 * dt_s + af2 * dt_s.powi(2)
    }
}
