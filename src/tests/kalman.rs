use nalgebra::Vector3;

use crate::{
    cfg::KalmanTuning,
    navigation::{ConstellationIndexes, Estimator, KalmanEstimator, NavObservation},
    prelude::{Constellation, SV},
    tests::{
        init_logger,
        lsq::{nav_obs, satellite_positions_m},
        receiver_position_m, RX_CLOCK_BIAS_M,
    },
};

fn tight_tuning() -> KalmanTuning {
    KalmanTuning {
        velocity_psd_m2_s3: 1.0E-4,
        ..Default::default()
    }
}

fn gps_indexes() -> ConstellationIndexes {
    let mut indexes = ConstellationIndexes::default();
    indexes.register(Constellation::GPS);
    indexes
}

fn observations(rx_position_m: Vector3<f64>, clock_bias_m: f64) -> Vec<NavObservation> {
    satellite_positions_m()
        .into_iter()
        .enumerate()
        .map(|(i, position_m)| {
            let mut ob = nav_obs(
                SV::new(Constellation::GPS, (i + 1) as u8),
                position_m,
                rx_position_m,
                clock_bias_m,
                0.0,
            );
            ob.variance_m2 = 1.0E-2;
            ob
        })
        .collect()
}

#[test]
fn static_noiseless_convergence() {
    init_logger();

    let truth_m = receiver_position_m();
    let indexes = gps_indexes();

    let mut filter = KalmanEstimator::new(tight_tuning(), 1.0);

    // initialized a few meters off the truth
    filter.initialize(
        truth_m + Vector3::new(5.0, -3.0, 2.0),
        RX_CLOCK_BIAS_M + 10.0,
        &[],
    );
    assert!(filter.initialized());

    let mut last_error_m = f64::MAX;
    for epoch in 0..8 {
        let result = filter
            .estimate(&observations(truth_m, RX_CLOCK_BIAS_M), &indexes)
            .unwrap();
        let error_m = (result.position_m - truth_m).norm();
        if epoch >= 3 {
            assert!(
                error_m < 0.1,
                "epoch {}: error {:.4} m, not converged",
                epoch,
                error_m
            );
            assert!(error_m <= last_error_m + 1.0E-3, "filter diverging");
        }
        last_error_m = error_m;
    }

    assert!(
        last_error_m < 1.0E-2,
        "steady state error {:.5} m",
        last_error_m
    );
}

#[test]
fn range_rate_rows_observe_clock_drift() {
    init_logger();

    let truth_m = receiver_position_m();
    let indexes = gps_indexes();
    const DRIFT_M_S: f64 = 5.0;

    let mut filter = KalmanEstimator::new(tight_tuning(), 1.0);
    filter.initialize(truth_m, RX_CLOCK_BIAS_M, &[]);

    let mut drift_m_s = 0.0;
    for epoch in 0..12 {
        // clock runs off linearly, Doppler sees the drift directly
        let clock_m = RX_CLOCK_BIAS_M + DRIFT_M_S * (epoch + 1) as f64;
        let mut obs = observations(truth_m, clock_m);
        for ob in obs.iter_mut() {
            ob.range_rate_m_s = DRIFT_M_S;
        }

        let result = filter.estimate(&obs, &indexes).unwrap();
        drift_m_s = result.clock_drift_m_s.unwrap();
    }

    assert!(
        (drift_m_s - DRIFT_M_S).abs() < 0.5,
        "estimated drift {:.3} m/s",
        drift_m_s
    );
}

#[test]
#[should_panic]
fn update_before_initialization() {
    let indexes = gps_indexes();
    let mut filter = KalmanEstimator::new(KalmanTuning::default(), 1.0);
    let _ = filter.estimate(&observations(receiver_position_m(), 0.0), &indexes);
}
