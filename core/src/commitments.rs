//! Time-locked stakes per (anchor, account).
//!
//! The lock is tracked per anchor. A stake sets a fresh lock only when none
//! exists or the current one has expired; top-ups under an active lock leave it
//! alone. A lock expires at the block equal to its `lock_until`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use anchorage_types::{AccountId, Amount, AnchorId, BlockHeight, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeReceipt {
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub anchor_total: Amount,
    pub lock_until: BlockHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseReceipt {
    pub amount: Amount,
    pub anchor_total: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentLedger {
    balances: BTreeMap<AnchorId, BTreeMap<AccountId, Amount>>,
    totals: BTreeMap<AnchorId, Amount>,
    locks: BTreeMap<AnchorId, BlockHeight>,
    /// Sum of all balances; held apart from the treasury.
    escrow: Amount,
}

impl CommitmentLedger {
    #[must_use]
    pub fn balance(&self, anchor: &AnchorId, account: &AccountId) -> Amount {
        self.balances
            .get(anchor)
            .and_then(|accounts| accounts.get(account))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self, anchor: &AnchorId) -> Amount {
        self.totals.get(anchor).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn lock_until(&self, anchor: &AnchorId) -> Option<BlockHeight> {
        self.locks.get(anchor).copied()
    }

    #[must_use]
    pub fn is_locked(&self, anchor: &AnchorId, block: BlockHeight) -> bool {
        self.lock_until(anchor).is_some_and(|until| block < until)
    }

    #[must_use]
    pub const fn escrow(&self) -> Amount {
        self.escrow
    }

    pub(crate) fn stake(
        &mut self,
        anchor: AnchorId,
        account: AccountId,
        amount: Amount,
        block: BlockHeight,
        lock_window: u64,
    ) -> Result<StakeReceipt, RegistryError> {
        let balance_before = self.balance(&anchor, &account);
        let balance_after = balance_before
            .checked_add(amount)
            .ok_or(RegistryError::AmountOverflow)?;
        let anchor_total = self
            .total(&anchor)
            .checked_add(amount)
            .ok_or(RegistryError::AmountOverflow)?;
        let escrow = self
            .escrow
            .checked_add(amount)
            .ok_or(RegistryError::AmountOverflow)?;
        let lock_until = match self.lock_until(&anchor) {
            Some(until) if block < until => until,
            _ => block.saturating_add(lock_window),
        };

        self.balances
            .entry(anchor)
            .or_default()
            .insert(account, balance_after);
        self.totals.insert(anchor, anchor_total);
        self.locks.insert(anchor, lock_until);
        self.escrow = escrow;

        Ok(StakeReceipt {
            balance_before,
            balance_after,
            anchor_total,
            lock_until,
        })
    }

    /// Remove the caller's whole balance. Undo with [`Self::restore`].
    pub(crate) fn release(
        &mut self,
        anchor: AnchorId,
        account: AccountId,
        block: BlockHeight,
    ) -> Result<ReleaseReceipt, RegistryError> {
        let amount = self.balance(&anchor, &account);
        if amount == 0 {
            return Err(RegistryError::NoCommitment { anchor, account });
        }
        if let Some(until) = self.lock_until(&anchor)
            && block < until
        {
            return Err(RegistryError::CommitmentLocked { until });
        }

        let anchor_total = self.total(&anchor).saturating_sub(amount);
        if let Some(accounts) = self.balances.get_mut(&anchor) {
            accounts.remove(&account);
            if accounts.is_empty() {
                self.balances.remove(&anchor);
            }
        }
        self.totals.insert(anchor, anchor_total);
        self.escrow = self.escrow.saturating_sub(amount);

        Ok(ReleaseReceipt {
            amount,
            anchor_total,
        })
    }

    pub(crate) fn restore(&mut self, anchor: AnchorId, account: AccountId, amount: Amount) {
        self.balances
            .entry(anchor)
            .or_default()
            .insert(account, amount);
        let total = self.total(&anchor).saturating_add(amount);
        self.totals.insert(anchor, total);
        self.escrow = self.escrow.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::CommitmentLedger;
    use anchorage_types::{AccountId, AnchorId, BlockHeight, RegistryError};

    const LOCK: u64 = 128;

    fn ids() -> (AnchorId, AccountId) {
        (AnchorId::from_label("a1"), AccountId::from_label("staker"))
    }

    #[test]
    fn top_up_under_active_lock_keeps_it() {
        let (anchor, account) = ids();
        let mut ledger = CommitmentLedger::default();
        let first = ledger
            .stake(anchor, account, 1, BlockHeight::new(100), LOCK)
            .expect("stake");
        assert_eq!(first.lock_until, BlockHeight::new(228));

        let topped = ledger
            .stake(anchor, account, 4, BlockHeight::new(227), LOCK)
            .expect("top up");
        assert_eq!(topped.lock_until, BlockHeight::new(228));
        assert_eq!(topped.balance_before, 1);
        assert_eq!(topped.balance_after, 5);
        assert_eq!(ledger.escrow(), 5);
    }

    #[test]
    fn top_up_after_expiry_resets_from_top_up_block() {
        let (anchor, account) = ids();
        let mut ledger = CommitmentLedger::default();
        ledger
            .stake(anchor, account, 1, BlockHeight::new(100), LOCK)
            .expect("stake");
        let topped = ledger
            .stake(anchor, account, 1, BlockHeight::new(300), LOCK)
            .expect("top up");
        assert_eq!(topped.lock_until, BlockHeight::new(428));
    }

    #[test]
    fn release_honors_the_lock_boundary() {
        let (anchor, account) = ids();
        let mut ledger = CommitmentLedger::default();
        ledger
            .stake(anchor, account, 7, BlockHeight::new(0), LOCK)
            .expect("stake");
        assert_eq!(
            ledger.release(anchor, account, BlockHeight::new(127)),
            Err(RegistryError::CommitmentLocked {
                until: BlockHeight::new(128)
            })
        );
        let receipt = ledger
            .release(anchor, account, BlockHeight::new(128))
            .expect("release");
        assert_eq!(receipt.amount, 7);
        assert_eq!(receipt.anchor_total, 0);
        assert_eq!(ledger.balance(&anchor, &account), 0);
        assert_eq!(ledger.escrow(), 0);
    }

    #[test]
    fn release_without_balance_fails() {
        let (anchor, account) = ids();
        let mut ledger = CommitmentLedger::default();
        assert_eq!(
            ledger.release(anchor, account, BlockHeight::new(0)),
            Err(RegistryError::NoCommitment { anchor, account })
        );
    }

    #[test]
    fn restore_undoes_release() {
        let (anchor, account) = ids();
        let mut ledger = CommitmentLedger::default();
        ledger
            .stake(anchor, account, 9, BlockHeight::new(0), LOCK)
            .expect("stake");
        let before = ledger.clone();
        let receipt = ledger
            .release(anchor, account, BlockHeight::new(500))
            .expect("release");
        ledger.restore(anchor, account, receipt.amount);
        assert_eq!(ledger, before);
    }

    #[test]
    fn overflow_is_rejected_without_change() {
        let (anchor, account) = ids();
        let mut ledger = CommitmentLedger::default();
        ledger
            .stake(anchor, account, u128::MAX, BlockHeight::new(0), LOCK)
            .expect("stake");
        let before = ledger.clone();
        assert_eq!(
            ledger.stake(anchor, AccountId::from_label("other"), 1, BlockHeight::new(1), LOCK),
            Err(RegistryError::AmountOverflow)
        );
        assert_eq!(ledger, before);
    }
}
