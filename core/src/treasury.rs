//! Working balance and fee pool.

use std::mem;

use serde::{Deserialize, Serialize};

use anchorage_config::BPS_DENOMINATOR;
use anchorage_types::{Amount, RegistryError};

/// `(net, fee)` with `fee = floor(gross * bps / 10_000)`.
///
/// Computed in two parts so the product never overflows.
#[must_use]
pub fn split_fee(gross: Amount, bps: u16) -> (Amount, Amount) {
    let denominator = Amount::from(BPS_DENOMINATOR);
    let bps = Amount::from(bps.min(BPS_DENOMINATOR));
    let fee = gross / denominator * bps + gross % denominator * bps / denominator;
    (gross - fee, fee)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositReceipt {
    pub fee: Amount,
    pub working_balance: Amount,
    pub fee_pool: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub requested: Amount,
    pub amount: Amount,
    pub balance_before: Amount,
    pub balance_after: Amount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryAccount {
    working: Amount,
    fee_pool: Amount,
}

impl TreasuryAccount {
    #[must_use]
    pub const fn working_balance(&self) -> Amount {
        self.working
    }

    #[must_use]
    pub const fn fee_pool(&self) -> Amount {
        self.fee_pool
    }

    /// `fee_bps` is `None` when no fee recipient is configured.
    pub(crate) fn deposit(
        &mut self,
        gross: Amount,
        fee_bps: Option<u16>,
    ) -> Result<DepositReceipt, RegistryError> {
        let (net, fee) = fee_bps.map_or((gross, 0), |bps| split_fee(gross, bps));
        let working = self
            .working
            .checked_add(net)
            .ok_or(RegistryError::AmountOverflow)?;
        let fee_pool = self
            .fee_pool
            .checked_add(fee)
            .ok_or(RegistryError::AmountOverflow)?;
        self.working = working;
        self.fee_pool = fee_pool;
        Ok(DepositReceipt {
            fee,
            working_balance: working,
            fee_pool,
        })
    }

    /// Debit up to `requested`, clamped to the working balance.
    pub(crate) fn withdraw(&mut self, requested: Amount) -> WithdrawReceipt {
        let balance_before = self.working;
        let amount = requested.min(balance_before);
        self.working = balance_before - amount;
        WithdrawReceipt {
            requested,
            amount,
            balance_before,
            balance_after: self.working,
        }
    }

    pub(crate) fn take_fees(&mut self) -> Amount {
        mem::take(&mut self.fee_pool)
    }

    pub(crate) fn restore_working(&mut self, amount: Amount) {
        self.working = self.working.saturating_add(amount);
    }

    pub(crate) fn restore_fees(&mut self, amount: Amount) {
        self.fee_pool = self.fee_pool.saturating_add(amount);
    }
}
