use crate::prelude::{Config, Constellation};

#[test]
fn named_thresholds() {
    let cfg = Config::default();

    // empirical constants are configuration values, not literals
    assert_eq!(cfg.min_cn0_dbhz, 20.0);
    assert_eq!(cfg.min_pseudorange_m, 1.8E7);
    assert_eq!(cfg.max_pseudorange_m, 3.0E7);
    assert_eq!(cfg.max_divergence_m, 2.0);
    assert_eq!(cfg.smoothing_window, 30);
    assert_eq!(cfg.lsq_max_iter, 25);
    assert_eq!(cfg.lsq_convergence_m, 0.1);
}

#[test]
fn minimal_sv_policy() {
    let cfg = Config::static_preset(vec![Constellation::GPS]);
    assert_eq!(cfg.min_sv_count(), 4);

    let cfg = Config::static_preset(vec![Constellation::GPS, Constellation::Galileo]);
    assert_eq!(cfg.min_sv_count(), 5);

    let cfg = Config::static_preset(vec![
        Constellation::GPS,
        Constellation::Galileo,
        Constellation::BeiDou,
    ]);
    assert_eq!(cfg.min_sv_count(), 6);
}

#[test]
fn presets() {
    let cfg = Config::dynamic_preset(vec![Constellation::GPS]);
    assert!(cfg.dynamic);
    assert!(cfg.code_smoothing);

    let cfg = Config::static_preset(vec![Constellation::GPS]);
    assert!(!cfg.dynamic);
}

#[cfg(feature = "serde")]
#[test]
fn parsing() {
    let cfg: Config = serde_json::from_str(
        r#"{
            "dynamic": true,
            "min_cn0_dbhz": 25.0,
            "frequency_mode": "IonoFree"
        }"#,
    )
    .unwrap();

    assert!(cfg.dynamic);
    assert_eq!(cfg.min_cn0_dbhz, 25.0);
    assert_eq!(cfg.frequency_mode, crate::prelude::FrequencyMode::IonoFree);

    // unspecified fields fall back to the documented defaults
    assert_eq!(cfg.max_divergence_m, 2.0);
    assert_eq!(cfg.smoothing_window, 30);
}
