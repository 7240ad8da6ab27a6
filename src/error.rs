use thiserror::Error;

use crate::prelude::SV;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Measurement rejected by the decoding or validation process:
    /// unknown carrier frequency, pseudo range outside the plausible
    /// window, or signal strength below the configured noise floor.
    /// The satellite is silently excluded for this epoch.
    #[error("invalid measurement")]
    MeasurementInvalid,

    /// Sampled carrier frequency does not classify into any known signal.
    #[error("unknown carrier frequency")]
    UnknownCarrierFrequency,

    /// No valid ephemeris frame for this [SV]: no propagation is possible,
    /// the satellite is excluded for this epoch.
    #[error("no valid ephemeris for {0}")]
    EphemerisMissing(SV),

    /// Not enough satellites passed the exclusion policies with respect
    /// to the active parameter set: this epoch yields no update and the
    /// tracking duration counter resets.
    #[error("not enough satellites for an update")]
    InsufficientSatellites,

    /// The normal equation or innovation covariance matrix could not be
    /// inverted. The epoch's update is aborted and the previous valid
    /// state is retained.
    #[error("failed to invert matrix")]
    SingularMatrix,

    /// Enabled constellations or frequency mode changed since the active
    /// estimator was formed: the estimator is re-instantiated with a
    /// resized state and this epoch yields no update.
    #[error("configuration changed: estimator reset")]
    ConfigurationChanged,

    /// Predicted position diverged from the instantaneous fix beyond the
    /// configured threshold, interpreted as loss of lock: the state
    /// machine falls back to acquisition.
    #[error("large divergence: re-acquisition needed")]
    LargeDivergence,

    /// Missing pseudo range observation for the selected frequency mode.
    #[error("missing pseudo range observation")]
    MissingPseudoRange,

    /// Dual frequency mode requires the ionosphere-free combination
    /// to be formed, which needs both bands present.
    #[error("failed to form ionosphere free combination")]
    IonoFreeCombination,

    /// Physical non sense (reception prior transmission) due to bad
    /// signal data: the measurement is dropped.
    #[error("physical non sense: rx prior tx")]
    PhysicalNonSenseRxPriorTx,
}
