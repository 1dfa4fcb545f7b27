//! Block-height clock primitives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value amounts: stakes, deposits, treasury balances.
pub type Amount = u128;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    #[must_use]
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn saturating_add(self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }

    /// Blocks elapsed since `earlier`; zero if `earlier` is in the future.
    #[must_use]
    pub const fn since(self, earlier: BlockHeight) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EpochNumber(u64);

impl EpochNumber {
    pub const GENESIS: Self = Self(0);

    #[must_use]
    pub const fn new(epoch: u64) -> Self {
        Self(epoch)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(epoch) => Some(Self(epoch)),
            None => None,
        }
    }

    /// Position in per-epoch tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EpochNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
