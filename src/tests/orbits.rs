use nalgebra::Vector3;

use crate::{
    constants::EARTH_GRAVITATION_MU_M3_S2,
    ephemeris::IntegratedEphemeris,
    prelude::{Constellation, Duration, SV},
    tests::{circular_orbit, init_logger, t0},
};

#[test]
fn circular_orbit_reference() {
    init_logger();

    // equatorial circular orbit: at ToE the anomaly chain collapses
    // to plain plane trigonometry
    let ephemeris = circular_orbit(0.0, 0.0, 30.0, 0.0);
    let sv = SV::new(Constellation::GPS, 1);

    let (position_m, velocity_m_s) = ephemeris.resolve_state(sv, t0());

    let a = ephemeris.semi_major_axis_m;
    let u = 30.0_f64.to_radians();

    let expected = Vector3::new(a * u.cos(), a * u.sin(), 0.0);
    assert!(
        (position_m - expected).norm() < 1.0,
        "position error {:.3} m",
        (position_m - expected).norm()
    );

    // Earth fixed speed: inertial circular speed minus the frame
    // rotation term (prograde equatorial orbit)
    let speed = (EARTH_GRAVITATION_MU_M3_S2 / a).sqrt();
    let ecef_speed = speed - crate::constants::EARTH_ANGULAR_VEL_RAD * a;
    assert!((velocity_m_s.norm() - ecef_speed).abs() / ecef_speed < 1.0E-3);
    assert!(position_m.dot(&velocity_m_s).abs() / (a * ecef_speed) < 1.0E-3);
}

#[test]
fn inclined_orbit_reference() {
    init_logger();

    let ephemeris = circular_orbit(40.0, 55.0, -20.0, 0.0);
    let sv = SV::new(Constellation::GPS, 2);

    let (position_m, _) = ephemeris.resolve_state(sv, t0());

    let a = ephemeris.semi_major_axis_m;
    let (sin_u, cos_u) = (-20.0_f64).to_radians().sin_cos();
    let (sin_i, cos_i) = 55.0_f64.to_radians().sin_cos();
    let (sin_om, cos_om) = 40.0_f64.to_radians().sin_cos();

    let expected = Vector3::new(
        a * (cos_u * cos_om - sin_u * cos_i * sin_om),
        a * (cos_u * sin_om + sin_u * cos_i * cos_om),
        a * sin_u * sin_i,
    );

    assert!(
        (position_m - expected).norm() < 1.0,
        "position error {:.3} m",
        (position_m - expected).norm()
    );
}

#[test]
fn eccentric_anomaly_iterations() {
    let mut ephemeris = circular_orbit(0.0, 0.0, 0.0, 0.0);
    ephemeris.eccentricity = 0.01;
    ephemeris.m0_rad = 0.3;

    let e_k = ephemeris.eccentric_anomaly_rad(0.0);
    let residual = e_k - ephemeris.eccentricity * e_k.sin() - ephemeris.m0_rad;
    assert!(
        residual.abs() < 1.0E-9,
        "kepler equation residual {:.3e}",
        residual
    );
}

#[test]
fn relativistic_correction_bounds() {
    let mut ephemeris = circular_orbit(0.0, 0.0, 45.0, 0.0);

    // circular orbit carries no relativistic term
    assert_eq!(ephemeris.relativistic_clock_correction_s(t0()), 0.0);

    ephemeris.eccentricity = 0.02;
    let correction_s = ephemeris.relativistic_clock_correction_s(t0());
    let bound_s = 4.442807633E-10 * 0.02 * ephemeris.semi_major_axis_m.sqrt();
    assert!(correction_s.abs() > 0.0);
    assert!(correction_s.abs() <= bound_s);
}

fn glonass_reference() -> IntegratedEphemeris {
    // circular inertial speed for the reference radius, flying along
    // +y, expressed in the rotating Earth fixed frame
    let radius_m = 25.5E6;
    let speed = (crate::constants::EARTH_GRAVITATION_MU_PZ90_M3_S2 / radius_m).sqrt()
        - crate::constants::EARTH_ANGULAR_VEL_RAD * radius_m;
    IntegratedEphemeris {
        t_ref: t0(),
        position_m: Vector3::new(radius_m, 0.0, 0.0),
        velocity_m_s: Vector3::new(0.0, speed, 0.0),
        lunisolar_accel_m_s2: Vector3::new(0.0, 0.0, 0.0),
        tau_s: 5.0E-6,
        gamma: 1.0E-11,
        ..Default::default()
    }
}

#[test]
fn integration_identity_at_reference() {
    init_logger();
    let ephemeris = glonass_reference();
    let sv = SV::new(Constellation::Glonass, 1);

    let (position_m, velocity_m_s) = ephemeris.resolve_state(sv, t0());
    assert!((position_m - ephemeris.position_m).norm() < 1.0E-6);
    assert!((velocity_m_s - ephemeris.velocity_m_s).norm() < 1.0E-9);
}

#[test]
fn integration_round_trip() {
    init_logger();
    let ephemeris = glonass_reference();
    let sv = SV::new(Constellation::Glonass, 1);

    let t1 = t0() + Duration::from_seconds(600.0);
    let (position_m, velocity_m_s) = ephemeris.resolve_state(sv, t1);

    // a satellite at ~25500 km moves ~2 300 km in 10 minutes
    let displacement_m = (position_m - ephemeris.position_m).norm();
    assert!(displacement_m > 1.0E6);

    // integrate back from the propagated state: recovers the
    // reference state
    let reversed = IntegratedEphemeris {
        t_ref: t1,
        position_m,
        velocity_m_s,
        ..glonass_reference()
    };

    let (position_m, velocity_m_s) = reversed.resolve_state(sv, t0());
    assert!(
        (position_m - ephemeris.position_m).norm() < 0.1,
        "round trip error {:.6} m",
        (position_m - ephemeris.position_m).norm()
    );
    assert!((velocity_m_s - ephemeris.velocity_m_s).norm() < 1.0E-3);
}

#[test]
fn glonass_clock_model() {
    let ephemeris = glonass_reference();
    let t1 = t0() + Duration::from_seconds(100.0);
    let bias_s = ephemeris.clock_bias_s(t1);
    assert!((bias_s - (-5.0E-6 + 1.0E-11 * 100.0)).abs() < 1.0E-15);
}
