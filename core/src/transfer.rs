//! Outbound value transfers.
//!
//! The registry hands value to a [`ValueSink`] after its own bookkeeping is
//! updated. The sink receives the registry so it can call back into it; every
//! mutating call made from there is rejected until the transfer returns.

use serde::Serialize;
use thiserror::Error;

use anchorage_types::{AccountId, Amount};

use crate::Registry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TransferFailure {
    reason: String,
}

impl TransferFailure {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

pub trait ValueSink {
    /// Move `amount` to `to`. An error rolls back the calling operation.
    fn deliver(
        &mut self,
        registry: &mut Registry,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub to: AccountId,
    pub amount: Amount,
}

/// Records every delivery in order and never refuses one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayoutLedger {
    payouts: Vec<Payout>,
}

impl PayoutLedger {
    #[must_use]
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    #[must_use]
    pub fn total_to(&self, account: &AccountId) -> Amount {
        self.payouts
            .iter()
            .filter(|payout| payout.to == *account)
            .fold(0, |sum, payout| sum.saturating_add(payout.amount))
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Payout> + '_ {
        self.payouts.drain(..)
    }
}

impl ValueSink for PayoutLedger {
    fn deliver(
        &mut self,
        _registry: &mut Registry,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferFailure> {
        self.payouts.push(Payout { to, amount });
        Ok(())
    }
}
