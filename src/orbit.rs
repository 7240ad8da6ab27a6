//! Resolved satellite state
use map_3d::{ecef2geodetic, Ellipsoid};
use nalgebra::{Matrix3, Vector3};

use crate::{
    constants::EARTH_ANGULAR_VEL_RAD,
    prelude::SV,
};

/// Fully resolved state of one [SV] at one transmission time.
/// Recomputed every epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteState {
    /// [SV] identity
    pub sv: SV,
    /// ECEF position, in meters
    pub position_m: Vector3<f64>,
    /// ECEF velocity, in m/s
    pub velocity_m_s: Vector3<f64>,
    /// Onboard clock offset to system time, in meters of range
    pub clock_bias_m: f64,
    /// Elevation from the receiver, in degrees
    pub elevation_deg: f64,
    /// Azimuth from the receiver, in degrees, in [0, 360)
    pub azimuth_deg: f64,
    /// Modeled ionosphere delay for the selected signal, in meters
    pub iono_delay_m: f64,
}

impl SatelliteState {
    /// Rotate the ECEF position about the polar axis by ω·τ to
    /// compensate Earth rotation during signal flight.
    pub(crate) fn earth_rotation_correction(&mut self, transit_s: f64) {
        let theta = EARTH_ANGULAR_VEL_RAD * transit_s;
        let (sin_t, cos_t) = theta.sin_cos();
        let rot = Matrix3::new(
            cos_t, sin_t, 0.0, //
            -sin_t, cos_t, 0.0, //
            0.0, 0.0, 1.0,
        );
        self.position_m = rot * self.position_m;
        self.velocity_m_s = rot * self.velocity_m_s;
    }

    /// Elevation and azimuth of the line of sight, from given receiver
    /// ECEF position, via the local topocentric (NED) frame:
    /// elevation = −asin(down), azimuth = atan2(east, north) in [0, 360).
    pub(crate) fn elevation_azimuth(&mut self, rx_ecef_m: Vector3<f64>) {
        let (lat_rad, lon_rad, _) =
            ecef2geodetic(rx_ecef_m.x, rx_ecef_m.y, rx_ecef_m.z, Ellipsoid::WGS84);

        let los = (self.position_m - rx_ecef_m).normalize();

        let (sin_lat, cos_lat) = lat_rad.sin_cos();
        let (sin_lon, cos_lon) = lon_rad.sin_cos();

        let north = Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
        let east = Vector3::new(-sin_lon, cos_lon, 0.0);
        let down = Vector3::new(-cos_lat * cos_lon, -cos_lat * sin_lon, -sin_lat);

        let n = north.dot(&los);
        let e = east.dot(&los);
        let d = down.dot(&los);

        self.elevation_deg = (-d).asin().to_degrees();

        let mut azimuth_deg = e.atan2(n).to_degrees();
        if azimuth_deg < 0.0 {
            azimuth_deg += 360.0;
        }
        self.azimuth_deg = azimuth_deg;
    }

}
