use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger close time, in whole seconds since the network epoch.
///
/// Close time is supplied by the surrounding ledger pipeline and only moves
/// forward between ledger closes. Nothing in Tally reads a wall clock.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerTime(u64);

impl LedgerTime {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// The time `secs` seconds later, saturating at the maximum.
    pub const fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Returns `true` if this time is strictly after `mark`.
    pub fn is_after(&self, mark: LedgerTime) -> bool {
        self.0 > mark.0
    }

    /// Returns `true` if this time is at or after `mark`.
    pub fn has_reached(&self, mark: LedgerTime) -> bool {
        self.0 >= mark.0
    }
}

impl fmt::Debug for LedgerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerTime({}s)", self.0)
    }
}

impl fmt::Display for LedgerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl From<u64> for LedgerTime {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}
