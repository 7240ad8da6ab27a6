//! Constellation to parameter column bookkeeping
use log::debug;

use crate::prelude::Constellation;

/// Maps each active [Constellation] onto its parameter column.
/// The primary system (first seen) shares the receiver clock column;
/// each secondary system owns one inter system offset column, in
/// first seen order. The ordering is fixed for the lifetime of a
/// parameter set: growth appends, never reorders.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ConstellationIndexes {
    /// Primary [Constellation]
    primary: Option<Constellation>,
    /// Secondary [Constellation]s, in first seen order
    secondaries: Vec<Constellation>,
}

impl ConstellationIndexes {
    /// Forget the active parameter set (reset / re-acquisition)
    pub fn reset(&mut self) {
        self.primary = None;
        self.secondaries.clear();
    }

    /// Number of secondary systems in the active parameter set
    pub fn num_secondaries(&self) -> usize {
        self.secondaries.len()
    }

    /// Register this [Constellation], in first seen order. Returns
    /// true if the parameter set grew (migration required).
    pub fn register(&mut self, constellation: Constellation) -> bool {
        match self.primary {
            None => {
                debug!("{} - primary constellation", constellation);
                self.primary = Some(constellation);
                true
            },
            Some(primary) if primary == constellation => false,
            Some(_) => {
                if self.secondaries.contains(&constellation) {
                    false
                } else {
                    debug!("{} - new secondary constellation", constellation);
                    self.secondaries.push(constellation);
                    true
                }
            },
        }
    }

    /// Inter system offset slot of this [Constellation]:
    /// None for the primary system, Some(i) for the i-th secondary.
    pub fn isb_slot(&self, constellation: Constellation) -> Option<usize> {
        if self.primary == Some(constellation) {
            None
        } else {
            self.secondaries.iter().position(|c| *c == constellation)
        }
    }

    /// True if this [Constellation] belongs to the active parameter set
    pub fn contains(&self, constellation: Constellation) -> bool {
        self.primary == Some(constellation) || self.secondaries.contains(&constellation)
    }
}
