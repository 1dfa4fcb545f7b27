//! Window-gated epoch counter.
//!
//! Epoch `n + 1` opens once `n + 1` full windows have elapsed since genesis.
//! An advance moves exactly one step no matter how many windows have passed.
//! Repeating an advance inside the window that was just entered is a no-op;
//! only the first advance out of genesis can fail on the window.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use anchorage_types::{BlockHeight, EpochNumber, RegistryError};

/// Outcome of an accepted advance call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochAdvance {
    Advanced { from: EpochNumber, to: EpochNumber },
    /// At the maximum epoch, or the epoch was already advanced for this window.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochClock {
    genesis: BlockHeight,
    current: EpochNumber,
    advanced: BTreeSet<EpochNumber>,
    /// Anchors pinned per epoch, indexed by epoch. Always `current + 1` long.
    anchor_counts: Vec<u32>,
}

impl EpochClock {
    #[must_use]
    pub fn new(genesis: BlockHeight) -> Self {
        Self {
            genesis,
            current: EpochNumber::GENESIS,
            advanced: BTreeSet::new(),
            anchor_counts: vec![0],
        }
    }

    #[must_use]
    pub const fn genesis(&self) -> BlockHeight {
        self.genesis
    }

    #[must_use]
    pub const fn current(&self) -> EpochNumber {
        self.current
    }

    #[must_use]
    pub fn is_advanced(&self, epoch: EpochNumber) -> bool {
        self.advanced.contains(&epoch)
    }

    #[must_use]
    pub fn anchor_count(&self, epoch: EpochNumber) -> u32 {
        self.anchor_counts.get(epoch.index()).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn anchor_counts(&self) -> &[u32] {
        &self.anchor_counts
    }

    /// First block at which `epoch` may be entered.
    #[must_use]
    pub const fn opens_at(&self, epoch: EpochNumber, window: u64) -> BlockHeight {
        self.genesis
            .saturating_add(epoch.value().saturating_mul(window))
    }

    /// Decide what an advance at `block` would do, without doing it.
    pub fn check_advance(
        &self,
        block: BlockHeight,
        window: u64,
        max_epochs: u64,
    ) -> Result<EpochAdvance, RegistryError> {
        let next = self.current.next();
        if next.value() >= max_epochs {
            return Ok(EpochAdvance::Unchanged);
        }
        let opens_at = self.opens_at(next, window);
        if block < opens_at {
            if self.entered_by_advance() {
                return Ok(EpochAdvance::Unchanged);
            }
            return Err(RegistryError::EpochWindowNotReached { next, opens_at });
        }
        Ok(EpochAdvance::Advanced {
            from: self.current,
            to: next,
        })
    }

    fn entered_by_advance(&self) -> bool {
        self.current
            .prev()
            .is_some_and(|prev| self.advanced.contains(&prev))
    }

    /// Structural checks for a clock decoded from disk.
    pub(crate) fn check_consistency(&self) -> Result<(), &'static str> {
        if self.anchor_counts.len() != self.current.index().saturating_add(1) {
            return Err("per-epoch anchor counters do not match the current epoch");
        }
        if self.advanced.len() != self.current.index()
            || self.advanced.iter().any(|epoch| *epoch >= self.current)
        {
            return Err("advanced epochs do not match the current epoch");
        }
        Ok(())
    }

    /// Apply a step previously approved by [`Self::check_advance`].
    pub(crate) fn advance(&mut self) -> (EpochNumber, EpochNumber) {
        let from = self.current;
        self.advanced.insert(from);
        self.current = from.next();
        self.anchor_counts.push(0);
        (from, self.current)
    }

    pub(crate) fn record_anchors(&mut self, epoch: EpochNumber, count: u32) -> u32 {
        match self.anchor_counts.get_mut(epoch.index()) {
            Some(slot) => {
                *slot = slot.saturating_add(count);
                *slot
            }
            None => 0,
        }
    }
}
