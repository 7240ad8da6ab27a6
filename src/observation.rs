//! Raw measurement decoding and validation
use log::debug;

use crate::{
    carrier::Carrier,
    cfg::Config,
    constants::SPEED_OF_LIGHT_M_S,
    error::Error,
    prelude::{Constellation, Epoch, SV},
};

/// Per band raw ranging record, as supplied by the sensor layer once
/// per epoch. Discarded once folded into the epoch's [Observation]s.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMeasurement {
    /// [SV] identity
    pub sv: SV,
    /// Sampled carrier frequency, in Hertz
    pub frequency_hz: f64,
    /// Receive time, corrected for the known receiver clock offset
    pub rx_time: Epoch,
    /// Transmit time, as decoded from the signal
    pub tx_time: Epoch,
    /// Accumulated carrier phase, in cycles
    pub phase_cycles: Option<f64>,
    /// Doppler shift, in Hertz
    pub doppler_hz: Option<f64>,
    /// Reported 1-σ Doppler uncertainty, in Hertz
    pub doppler_sigma_hz: Option<f64>,
    /// Carrier to noise density ratio, in dB-Hz
    pub cn0_dbhz: f64,
    /// Carrier lock indication
    pub locked: bool,
    /// Cycle slip counter, as maintained by the tracking loops
    pub slip_count: u16,
}

impl RawMeasurement {
    /// True if this record passes the upfront acceptance criteria:
    /// its [Constellation] is enabled and its signal strength exceeds
    /// the configured noise floor for the band in use.
    pub fn validate(&self, cfg: &Config) -> bool {
        if !cfg.is_enabled(self.sv.constellation) {
            debug!("{}({}) - disabled constellation", self.rx_time, self.sv);
            return false;
        }
        if self.cn0_dbhz <= cfg.min_cn0_dbhz {
            debug!(
                "{}({}) - {:.1} dB-Hz below noise floor",
                self.rx_time, self.sv, self.cn0_dbhz
            );
            return false;
        }
        true
    }

    /// Decode this record into a usable [Observation]:
    /// band classification, pseudo range formation and plausibility
    /// window, Doppler gating.
    pub fn decode(&self, cfg: &Config) -> Result<Observation, Error> {
        let carrier = classify(self.sv.constellation, self.frequency_hz)?;
        let lambda_m = SPEED_OF_LIGHT_M_S / self.frequency_hz;

        let dt_s = (self.rx_time - self.tx_time).to_seconds();
        if dt_s < 0.0 {
            return Err(Error::PhysicalNonSenseRxPriorTx);
        }

        let pseudo_range_m = dt_s * SPEED_OF_LIGHT_M_S;
        if pseudo_range_m < cfg.min_pseudorange_m || pseudo_range_m > cfg.max_pseudorange_m {
            debug!(
                "{}({}) - pseudo range {:.0} m outside plausible window",
                self.rx_time, self.sv, pseudo_range_m
            );
            return Err(Error::MeasurementInvalid);
        }

        // Doppler contributes a range rate only when its reported
        // uncertainty passes the gate. Otherwise 0.0 (unavailable).
        let range_rate_m_s = match (self.doppler_hz, self.doppler_sigma_hz) {
            (Some(doppler_hz), Some(sigma_hz)) if sigma_hz <= cfg.max_doppler_sigma_hz => {
                -doppler_hz * lambda_m
            },
            _ => 0.0,
        };

        Ok(Observation {
            carrier,
            pseudo_range_m,
            phase_range_m: self.phase_cycles.map(|cycles| cycles * lambda_m),
            range_rate_m_s,
            cn0_dbhz: self.cn0_dbhz,
            locked: self.locked,
            slip_count: self.slip_count,
        })
    }
}

/// Decoded, per band ranging quantities for one [SV] at one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Classified [Carrier] signal
    pub carrier: Carrier,
    /// Pseudo range, in meters. Mutated in place by carrier smoothing.
    pub pseudo_range_m: f64,
    /// Carrier phase range, in meters
    pub phase_range_m: Option<f64>,
    /// Doppler derived range rate, in m/s. 0.0 when the Doppler gate
    /// rejected the measurement.
    pub range_rate_m_s: f64,
    /// Carrier to noise density ratio, in dB-Hz
    pub cn0_dbhz: f64,
    /// Carrier lock indication
    pub locked: bool,
    /// Cycle slip counter
    pub slip_count: u16,
}

impl Observation {
    /// True when the Doppler gate accepted a range rate for this band
    pub fn has_range_rate(&self) -> bool {
        self.range_rate_m_s != 0.0
    }
}

/// Classifies sampled frequency, then maps the shared-frequency signals
/// onto the constellation actually observed.
fn classify(constellation: Constellation, freq_hz: f64) -> Result<Carrier, Error> {
    let carrier = Carrier::from_frequency_hz(freq_hz)?;
    let carrier = match (constellation, carrier) {
        (Constellation::Galileo, Carrier::L1) => Carrier::E1,
        (Constellation::Galileo, Carrier::L5) => Carrier::E5A,
        (Constellation::BeiDou, Carrier::L5) => Carrier::B2A,
        _ => carrier,
    };
    Ok(carrier)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::Duration;

    fn raw(sv: SV, range_m: f64) -> RawMeasurement {
        let rx_time = Epoch::from_gpst_seconds(1000.0);
        RawMeasurement {
            sv,
            frequency_hz: 1575.42E6,
            rx_time,
            tx_time: rx_time - Duration::from_seconds(range_m / SPEED_OF_LIGHT_M_S),
            phase_cycles: None,
            doppler_hz: None,
            doppler_sigma_hz: None,
            cn0_dbhz: 45.0,
            locked: true,
            slip_count: 0,
        }
    }

    #[test]
    fn pseudo_range_window() {
        let cfg = Config::default();
        let sv = SV::new(Constellation::GPS, 1);

        // timestamps quantize to the nanosecond (~0.3 m of range)
        let ok = raw(sv, 2.2E7).decode(&cfg).unwrap();
        assert!((ok.pseudo_range_m - 2.2E7).abs() < 1.0);

        assert_eq!(
            raw(sv, 1.0E7).decode(&cfg),
            Err(Error::MeasurementInvalid),
            "below plausible window"
        );
        assert_eq!(
            raw(sv, 3.5E7).decode(&cfg),
            Err(Error::MeasurementInvalid),
            "above plausible window"
        );
    }

    #[test]
    fn doppler_gating() {
        let cfg = Config::default();
        let sv = SV::new(Constellation::GPS, 7);

        let mut m = raw(sv, 2.2E7);
        m.doppler_hz = Some(1000.0);
        m.doppler_sigma_hz = Some(1.0);
        let decoded = m.decode(&cfg).unwrap();
        assert!(decoded.has_range_rate());
        assert!((decoded.range_rate_m_s + 1000.0 * Carrier::L1.wavelength_m()).abs() < 1.0E-6);

        m.doppler_sigma_hz = Some(cfg.max_doppler_sigma_hz + 1.0);
        let decoded = m.decode(&cfg).unwrap();
        assert_eq!(decoded.range_rate_m_s, 0.0);
        assert!(!decoded.has_range_rate());
    }

    #[test]
    fn noise_floor() {
        let cfg = Config::default();
        let sv = SV::new(Constellation::GPS, 3);
        let mut m = raw(sv, 2.2E7);
        assert!(m.validate(&cfg));
        m.cn0_dbhz = cfg.min_cn0_dbhz - 1.0;
        assert!(!m.validate(&cfg));

        let glo = raw(SV::new(Constellation::Glonass, 3), 2.2E7);
        assert!(!glo.validate(&cfg), "constellation not enabled");
    }
}
