//! Shared synthetic scenarios
use std::collections::HashMap;

use nalgebra::Vector3;

use crate::{
    cfg::{Config, Modeling},
    constants::SPEED_OF_LIGHT_M_S,
    ephemeris::{Ephemeris, EphemerisSource, KeplerianEphemeris},
    prelude::{Constellation, Duration, Epoch, SV},
    observation::RawMeasurement,
};

/// Truth receiver position: on the equator, at Greenwich longitude
pub fn receiver_position_m() -> Vector3<f64> {
    Vector3::new(6378137.0, 0.0, 0.0)
}

/// Truth receiver clock bias, in meters of range
pub const RX_CLOCK_BIAS_M: f64 = 300.0;

/// Synthetic inter system offset applied to non GPS measurements
pub const ISB_M: f64 = 50.0;

/// Reference epoch: exactly at a GPST week boundary, so the test
/// orbit geometry is fully determined by the orbital elements
pub fn t0() -> Epoch {
    Epoch::from_gpst_seconds(2280.0 * 604800.0)
}

/// [Config] under which synthetic measurements are exact: atmospheric
/// and Earth rotation effects are not simulated by the builders.
pub fn test_config() -> Config {
    Config {
        constellations: vec![Constellation::GPS],
        min_sv_elev_deg: 5.0,
        modeling: Modeling {
            sv_clock_bias: true,
            relativistic_clock_bias: true,
            sv_total_group_delay: false,
            tropo_delay: false,
            iono_delay: false,
            earth_rotation: false,
        },
        ..Default::default()
    }
}

/// Circular orbit (e = 0, no harmonic corrections) from plane
/// orientation and in-plane anomaly, all angles in degrees.
pub fn circular_orbit(omega0_deg: f64, i_deg: f64, u0_deg: f64, af0_s: f64) -> KeplerianEphemeris {
    KeplerianEphemeris {
        toe: t0(),
        toc: t0(),
        semi_major_axis_m: 26.56E6,
        eccentricity: 0.0,
        m0_rad: u0_deg.to_radians(),
        i0_rad: i_deg.to_radians(),
        omega0_rad: omega0_deg.to_radians(),
        clock_af: (af0_s, 0.0, 0.0),
        ..Default::default()
    }
}

/// [EphemerisSource] over a fixed frame table
#[derive(Debug, Clone, Default)]
pub struct TestEphemerides {
    pub frames: HashMap<SV, Ephemeris>,
}

impl EphemerisSource for TestEphemerides {
    fn ephemeris_data(&self, _epoch: Epoch, sv: SV) -> Option<Ephemeris> {
        self.frames.get(&sv).cloned()
    }
}

/// Six GPS satellites, geometrically diverse above the test receiver
pub fn gps_scenario() -> TestEphemerides {
    let mut frames = HashMap::new();
    for (prn, omega0_deg, i_deg, u0_deg, af0_s) in [
        (1, 0.0, 0.0, 20.0, 2.0E-5),
        (2, 0.0, 0.0, -25.0, -1.0E-5),
        (3, 0.0, 60.0, 30.0, 5.0E-6),
        (4, 0.0, 60.0, -30.0, 0.0),
        (5, 0.0, 90.0, 55.0, 1.5E-5),
        (6, 0.0, 90.0, -55.0, -2.0E-5),
    ] {
        frames.insert(
            SV::new(Constellation::GPS, prn),
            Ephemeris::Keplerian(circular_orbit(omega0_deg, i_deg, u0_deg, af0_s)),
        );
    }
    TestEphemerides { frames }
}

/// GPS scenario augmented with two Galileo satellites
pub fn dual_scenario() -> TestEphemerides {
    let mut scenario = gps_scenario();
    for (prn, omega0_deg, i_deg, u0_deg, af0_s) in [
        (11, 15.0, 60.0, 10.0, 1.0E-5),
        (12, -15.0, 60.0, 15.0, -5.0E-6),
    ] {
        scenario.frames.insert(
            SV::new(Constellation::Galileo, prn),
            Ephemeris::Keplerian(circular_orbit(omega0_deg, i_deg, u0_deg, af0_s)),
        );
    }
    scenario
}

/// Noiseless measurement snapshot at epoch t, for given truth
/// receiver state. Light time is solved by fixed point iteration, so
/// the records are exactly consistent with the crate's own
/// propagation under [test_config].
pub fn measurements_at(
    ephemerides: &TestEphemerides,
    t: Epoch,
    rx_position_m: Vector3<f64>,
    rx_clock_bias_m: f64,
) -> Vec<RawMeasurement> {
    let mut measurements = Vec::new();

    for (sv, frame) in ephemerides.frames.iter() {
        let kepler = match frame {
            Ephemeris::Keplerian(kepler) => kepler,
            _ => unreachable!("synthetic scenarios are Keplerian"),
        };

        let isb_m = if sv.constellation == Constellation::GPS {
            0.0
        } else {
            ISB_M
        };

        let mut pseudo_range_m = 2.3E7;
        for _ in 0..4 {
            let tx = t - Duration::from_seconds(pseudo_range_m / SPEED_OF_LIGHT_M_S);
            let (position_m, _) = kepler.resolve_state(*sv, tx);
            let rho_m = (position_m - rx_position_m).norm();
            let sv_clock_s = kepler.clock_bias_s(tx) + kepler.relativistic_clock_correction_s(tx);
            pseudo_range_m =
                rho_m + rx_clock_bias_m + isb_m - sv_clock_s * SPEED_OF_LIGHT_M_S;
        }

        measurements.push(RawMeasurement {
            sv: *sv,
            frequency_hz: 1575.42E6,
            rx_time: t,
            tx_time: t - Duration::from_seconds(pseudo_range_m / SPEED_OF_LIGHT_M_S),
            phase_cycles: None,
            doppler_hz: None,
            doppler_sigma_hz: None,
            cn0_dbhz: 45.0,
            locked: true,
            slip_count: 0,
        });
    }

    measurements
}
