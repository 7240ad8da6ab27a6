//! Carrier smoothing (Hatch filter)
use std::collections::HashMap;

use log::debug;

use crate::{
    carrier::Carrier,
    observation::Observation,
    prelude::SV,
};

#[derive(Clone, PartialEq, Eq, Hash)]
struct Key {
    /// [SV]
    sv: SV,
    /// [Carrier]
    carrier: Carrier,
}

/// Per (SV, band) recursion state. Only the previous epoch is retained.
struct Slot {
    n: usize,
    smoothed_m: f64,
    phase_m: f64,
    slip_count: u16,
}

/// Hatch filter over the code measurements, keyed per (SV, band).
/// The averaging window saturates at the configured length; the
/// recursion resets whenever no compatible previous observation exists
/// (new satellite or band, lock loss, cycle slip, missing phase).
pub(crate) struct Smoother {
    window: usize,
    slots: HashMap<Key, Slot>,
}

impl Smoother {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            slots: HashMap::with_capacity(16),
        }
    }

    /// Forget all recursion state (reset request or re-acquisition)
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// Smooth this [Observation]'s code measurement in place.
    pub fn smooth(&mut self, sv: SV, observation: &mut Observation) {
        let key = Key {
            sv,
            carrier: observation.carrier,
        };

        let raw_m = observation.pseudo_range_m;

        let phase_m = match observation.phase_range_m {
            Some(phase_m) if observation.locked => phase_m,
            _ => {
                // no usable phase this epoch: drop state, pass raw through
                self.slots.remove(&key);
                return;
            },
        };

        if let Some(slot) = self.slots.get_mut(&key) {
            if slot.slip_count == observation.slip_count {
                let n = (slot.n + 1).min(self.window);
                let alpha = 1.0 / n as f64;
                let dphase_m = phase_m - slot.phase_m;
                let smoothed_m = alpha * raw_m + (1.0 - alpha) * (slot.smoothed_m + dphase_m);
                debug!(
                    "{}({}) - smoothing n={} raw={:.3} smoothed={:.3}",
                    sv, observation.carrier, n, raw_m, smoothed_m
                );
                slot.n = n;
                slot.phase_m = phase_m;
                slot.smoothed_m = smoothed_m;
                observation.pseudo_range_m = smoothed_m;
                return;
            }
            debug!("{}({}) - cycle slip: smoothing reset", sv, observation.carrier);
        }

        self.slots.insert(
            key,
            Slot {
                n: 1,
                smoothed_m: raw_m,
                phase_m,
                slip_count: observation.slip_count,
            },
        );
    }
}
