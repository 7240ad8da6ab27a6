//! Troposphere delay model
use log::debug;

use crate::bias::BiasRuntime;

/// Niell mapping function coefficients, tabulated per 15° latitude
/// band (15/30/45/60/75). Values outside [15, 75] clamp to the edge
/// tables, intermediate latitudes interpolate linearly.
const LAT_BANDS_DEG: [f64; 5] = [15.0, 30.0, 45.0, 60.0, 75.0];

const DRY_A: [f64; 5] = [
    1.2769934E-3,
    1.2683230E-3,
    1.2465397E-3,
    1.2196049E-3,
    1.2045996E-3,
];
const DRY_B: [f64; 5] = [
    2.9153695E-3,
    2.9152299E-3,
    2.9288445E-3,
    2.9022565E-3,
    2.9024912E-3,
];
const DRY_C: [f64; 5] = [
    62.610505E-3,
    62.837393E-3,
    63.721774E-3,
    63.824265E-3,
    64.258455E-3,
];

const WET_A: [f64; 5] = [
    5.8021897E-4,
    5.6794847E-4,
    5.8118019E-4,
    5.9727542E-4,
    6.1641693E-4,
];
const WET_B: [f64; 5] = [
    1.4275268E-3,
    1.5138625E-3,
    1.4572752E-3,
    1.5007428E-3,
    1.7599082E-3,
];
const WET_C: [f64; 5] = [
    4.3472961E-2,
    4.6729510E-2,
    4.3908931E-2,
    4.4626982E-2,
    5.4736038E-2,
];

/// Fixed wet zenith delay, in meters
const WET_ZENITH_M: f64 = 0.1;

/// Interpolate one coefficient table at given latitude, clamping to
/// the edge bands outside [15°, 75°].
fn interpolate(lut: &[f64; 5], lat_deg: f64) -> f64 {
    let lat = lat_deg.abs();
    if lat <= LAT_BANDS_DEG[0] {
        return lut[0];
    }
    if lat >= LAT_BANDS_DEG[4] {
        return lut[4];
    }
    let idx = ((lat - 15.0) / 15.0).floor() as usize;
    let frac = (lat - LAT_BANDS_DEG[idx]) / 15.0;
    lut[idx] + (lut[idx + 1] - lut[idx]) * frac
}

/// Normalized continued fraction mapping value from (a, b, c)
/// coefficients, evaluated at elevation.
fn mapping(a: f64, b: f64, c: f64, elev_rad: f64) -> f64 {
    let sin_e = elev_rad.sin();
    let num = 1.0 + a / (1.0 + b / (1.0 + c));
    let den = sin_e + a / (sin_e + b / (sin_e + c));
    num / den
}

/// Latitude banded troposphere model: zenith delays mapped to the
/// line of sight with Niell continued fraction coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct TroposphereModel {}

impl TroposphereModel {
    /// Dry (hydrostatic) mapping value at the satellite's elevation
    pub(crate) fn dry_mapping(rtm: &BiasRuntime) -> f64 {
        let lat_deg = rtm.rx_geo_deg_deg_m.0;
        let elev_rad = rtm.sv_elev_azim_deg.0.to_radians();
        let a = interpolate(&DRY_A, lat_deg);
        let b = interpolate(&DRY_B, lat_deg);
        let c = interpolate(&DRY_C, lat_deg);
        mapping(a, b, c, elev_rad)
    }

    /// Wet mapping value at the satellite's elevation
    pub(crate) fn wet_mapping(rtm: &BiasRuntime) -> f64 {
        let lat_deg = rtm.rx_geo_deg_deg_m.0;
        let elev_rad = rtm.sv_elev_azim_deg.0.to_radians();
        let a = interpolate(&WET_A, lat_deg);
        let b = interpolate(&WET_B, lat_deg);
        let c = interpolate(&WET_C, lat_deg);
        mapping(a, b, c, elev_rad)
    }

    /// Zenith delay: dry component from the standard pressure model
    /// decaying exponentially with height, plus the fixed wet constant.
    /// Returns (wet, dry), in meters.
    pub(crate) fn zenith_delay_m(rtm: &BiasRuntime) -> (f64, f64) {
        let h_m = rtm.rx_geo_deg_deg_m.2;
        let dry_m = 2.3 * (-0.116E-3 * h_m).exp();
        (WET_ZENITH_M, dry_m)
    }

    /// Total slant delay at the satellite's elevation, in meters
    pub(crate) fn delay_m(rtm: &BiasRuntime) -> f64 {
        let (zwd_m, zdd_m) = Self::zenith_delay_m(rtm);
        let delay_m = zdd_m * Self::dry_mapping(rtm) + zwd_m * Self::wet_mapping(rtm);
        debug!(
            "{} - tropo: zdd={:.3} zwd={:.3} slant={:.3}",
            rtm.t, zdd_m, zwd_m, delay_m
        );
        delay_m
    }
}

/// Standard atmosphere, tabulated per height band (meters):
/// pressure (mBar), temperature (K) and the Saastamoinen B correction.
const ATMO_H_M: [f64; 9] = [
    0.0, 500.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0, 4000.0, 5000.0,
];
const ATMO_P_MBAR: [f64; 9] = [
    1013.25, 954.61, 898.76, 845.59, 795.01, 746.91, 701.21, 616.60, 540.48,
];
const ATMO_T_K: [f64; 9] = [
    288.15, 284.90, 281.65, 278.40, 275.15, 271.90, 268.65, 262.15, 255.65,
];
const ATMO_B: [f64; 9] = [
    1.156, 1.079, 1.006, 0.938, 0.874, 0.813, 0.757, 0.654, 0.563,
];
/// Relative humidity assumed by the standard atmosphere tables
const ATMO_RH: f64 = 0.5;

fn atmo_interpolate(lut: &[f64; 9], h_m: f64) -> f64 {
    if h_m <= ATMO_H_M[0] {
        return lut[0];
    }
    let mut idx = 0;
    while idx < 7 && h_m > ATMO_H_M[idx + 1] {
        idx += 1;
    }
    let frac = (h_m - ATMO_H_M[idx]) / (ATMO_H_M[idx + 1] - ATMO_H_M[idx]);
    lut[idx] + (lut[idx + 1] - lut[idx]) * frac
}

/// Standalone Saastamoinen slant delay, in meters, from elevation
/// (degrees) and receiver height above sea level (meters).
/// Pressure, temperature and humidity derive from the standard
/// atmosphere tables. Beyond 5000 m the model does not apply and the
/// -1.0 sentinel is returned.
pub fn saastamoinen_delay_m(elev_deg: f64, height_m: f64) -> f64 {
    if height_m > 5000.0 {
        return -1.0;
    }

    let h_m = height_m.max(0.0);
    let p_mbar = atmo_interpolate(&ATMO_P_MBAR, h_m);
    let t_k = atmo_interpolate(&ATMO_T_K, h_m);
    let b = atmo_interpolate(&ATMO_B, h_m);

    // water vapour pressure from relative humidity
    let e_mbar = ATMO_RH * 6.108 * ((17.15 * t_k - 4684.0) / (t_k - 38.45)).exp();

    let z_rad = (90.0 - elev_deg).to_radians();

    0.002277 / z_rad.cos()
        * (p_mbar + (1255.0 / t_k + 0.05) * e_mbar - b * z_rad.tan().powi(2))
}
