use std::fmt;

use serde::{Deserialize, Serialize};

/// Amount of the native currency, in drops.
///
/// Signed so that a submitted amount can be validated as positive rather than
/// rejected at parse time. Ledger balances are never negative.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Drops(i64);

impl Drops {
    pub const ZERO: Drops = Drops(0);

    pub const fn new(drops: i64) -> Self {
        Self(drops)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Drops) -> Option<Drops> {
        self.0.checked_add(other.0).map(Drops)
    }

    pub fn checked_sub(self, other: Drops) -> Option<Drops> {
        self.0.checked_sub(other.0).map(Drops)
    }

    pub fn checked_mul(self, factor: u32) -> Option<Drops> {
        self.0.checked_mul(i64::from(factor)).map(Drops)
    }
}

impl fmt::Debug for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Drops({})", self.0)
    }
}

impl fmt::Display for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} drops", self.0)
    }
}

impl From<i64> for Drops {
    fn from(drops: i64) -> Self {
        Self(drops)
    }
}
