//! Single frequency ionosphere delay models
use std::f64::consts::PI;

use crate::{
    bias::BiasRuntime,
    constants::SPEED_OF_LIGHT_M_S,
    prelude::TimeScale,
};

/// Broadcast ionosphere model, per constellation family.
#[derive(Default, Clone, Copy, Debug)]
pub enum IonosphereModel {
    /// No broadcast coefficients available: no compensation
    #[default]
    Unknown,
    /// Klobuchar model (GPS family)
    Klobuchar(KbModel),
    /// Piecewise Klobuchar variant (BDS family)
    Bds(BdsModel),
}

impl IonosphereModel {
    /// Slant delay in meters for the selected signal, 0.0 when unknown
    pub(crate) fn delay_m(&self, rtm: &BiasRuntime) -> f64 {
        match self {
            Self::Unknown => 0.0,
            Self::Klobuchar(kb) => kb.delay_m(rtm),
            Self::Bds(bds) => bds.delay_m(rtm),
        }
    }
}

/// Klobuchar model, parameterized by the 8 broadcast coefficients.
#[derive(Clone, Copy, Default, Debug)]
pub struct KbModel {
    /// Amplitude coefficients, in s, s/sc, s/sc², s/sc³
    pub alpha: (f64, f64, f64, f64),
    /// Period coefficients, in s, s/sc, s/sc², s/sc³
    pub beta: (f64, f64, f64, f64),
}

impl KbModel {
    /// Slant delay in meters, frequency scaled from the L1 vertical model.
    /// Angles are handled in semicircles, per the broadcast convention.
    pub(crate) fn delay_m(&self, rtm: &BiasRuntime) -> f64 {
        const L1_F_HZ: f64 = 1575.42E6;

        let elev_sc = rtm.sv_elev_azim_deg.0 / 180.0;
        let azim_rad = rtm.sv_elev_azim_deg.1.to_radians();
        let lat_sc = rtm.rx_geo_deg_deg_m.0 / 180.0;
        let lon_sc = rtm.rx_geo_deg_deg_m.1 / 180.0;

        // Earth centered angle to the pierce point
        let psi = 0.0137 / (elev_sc + 0.11) - 0.022;

        let mut phi_i = lat_sc + psi * azim_rad.cos();
        phi_i = phi_i.clamp(-0.416, 0.416);

        let lambda_i = lon_sc + psi * azim_rad.sin() / (phi_i * PI).cos();

        // geomagnetic latitude of the pierce point
        let phi_m = phi_i + 0.064 * ((lambda_i - 1.617) * PI).cos();

        let mut t_s = 4.32E4 * lambda_i + gpst_seconds_of_day(rtm);
        t_s = t_s.rem_euclid(86400.0);

        let mut amplitude_s = self.alpha.0
            + self.alpha.1 * phi_m
            + self.alpha.2 * phi_m.powi(2)
            + self.alpha.3 * phi_m.powi(3);
        if amplitude_s < 0.0 {
            amplitude_s = 0.0;
        }

        let mut period_s = self.beta.0
            + self.beta.1 * phi_m
            + self.beta.2 * phi_m.powi(2)
            + self.beta.3 * phi_m.powi(3);
        if period_s < 72000.0 {
            period_s = 72000.0;
        }

        let x = 2.0 * PI * (t_s - 50400.0) / period_s;

        // slant factor
        let f = 1.0 + 16.0 * (0.53 - elev_sc).powi(3);

        let vertical_s = if x.abs() < PI / 2.0 {
            5.0E-9 + amplitude_s * (1.0 - x.powi(2) / 2.0 + x.powi(4) / 24.0)
        } else {
            5.0E-9
        };

        let delay_l1_m = f * vertical_s * SPEED_OF_LIGHT_M_S;
        delay_l1_m * (L1_F_HZ / rtm.frequency_hz).powi(2)
    }
}

/// BDS broadcast variant: same 8 coefficient parameterization, but the
/// pierce point uses geographic latitude and the night time term is the
/// fixed 5 ns floor without the cosine expansion.
#[derive(Clone, Copy, Default, Debug)]
pub struct BdsModel {
    /// Amplitude coefficients
    pub alpha: (f64, f64, f64, f64),
    /// Period coefficients
    pub beta: (f64, f64, f64, f64),
}

impl BdsModel {
    pub(crate) fn delay_m(&self, rtm: &BiasRuntime) -> f64 {
        const B1_F_HZ: f64 = 1561.098E6;
        const R_EARTH_KM: f64 = 6378.0;
        const H_IONO_KM: f64 = 375.0;

        let elev_rad = rtm.sv_elev_azim_deg.0.to_radians();
        let azim_rad = rtm.sv_elev_azim_deg.1.to_radians();
        let lat_rad = rtm.rx_geo_deg_deg_m.0.to_radians();
        let lon_rad = rtm.rx_geo_deg_deg_m.1.to_radians();

        let fract = R_EARTH_KM / (R_EARTH_KM + H_IONO_KM);
        let psi = PI / 2.0 - elev_rad - (fract * elev_rad.cos()).asin();

        let phi_i = (lat_rad.sin() * psi.cos() + lat_rad.cos() * psi.sin() * azim_rad.cos()).asin();
        let lambda_i = lon_rad + (psi.sin() * azim_rad.sin() / phi_i.cos()).asin();

        let mut t_s = 43200.0 * lambda_i / PI + gpst_seconds_of_day(rtm);
        t_s = t_s.rem_euclid(86400.0);

        let phi_pi = phi_i / PI;

        let mut amplitude_s = self.alpha.0
            + self.alpha.1 * phi_pi
            + self.alpha.2 * phi_pi.powi(2)
            + self.alpha.3 * phi_pi.powi(3);
        if amplitude_s < 0.0 {
            amplitude_s = 0.0;
        }

        let mut period_s = self.beta.0
            + self.beta.1 * phi_pi
            + self.beta.2 * phi_pi.powi(2)
            + self.beta.3 * phi_pi.powi(3);
        period_s = period_s.clamp(72000.0, 172800.0);

        let x = 2.0 * PI * (t_s - 50400.0) / period_s;

        let vertical_s = if x.abs() < PI / 2.0 {
            5.0E-9 + amplitude_s * x.cos()
        } else {
            5.0E-9
        };

        let f = 1.0 / (1.0 - (fract * elev_rad.cos()).powi(2)).sqrt();

        let delay_b1_m = f * vertical_s * SPEED_OF_LIGHT_M_S;
        delay_b1_m * (B1_F_HZ / rtm.frequency_hz).powi(2)
    }
}

/// Local reference: seconds into the GPST day
fn gpst_seconds_of_day(rtm: &BiasRuntime) -> f64 {
    let t_gpst = rtm.t.to_duration_in_time_scale(TimeScale::GPST).to_seconds();
    t_gpst.rem_euclid(86400.0)
}
