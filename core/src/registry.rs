//! The registry and its call surface.
//!
//! Every mutating call follows the same shape: re-entrancy guard, role,
//! pause switch, then input checks in the order zero value, existence,
//! duplicate, capacity. Nothing is written until every check has passed, and
//! the call's notifications are appended in the same step as its state change.

use std::collections::BTreeSet;

use serde::Serialize;

use anchorage_config::{FeeSchedule, RegistryConfig};
use anchorage_types::{
    AccountId, Amount, AnchorId, BlockHeight, EpochNumber, Event, Fingerprint, LinkId, LinkKind,
    Notification, RecallHash, RegistryError, Role, Strength, Tag, Tags, Tier,
};

use crate::access::AccessController;
use crate::anchors::{Anchor, AnchorCounts, AnchorStore};
use crate::commitments::{CommitmentLedger, ReleaseReceipt, StakeReceipt};
use crate::epoch::{EpochAdvance, EpochClock};
use crate::events::EventLog;
use crate::links::{Link, LinkStore};
use crate::paging;
use crate::persistence::RegistryState;
use crate::slots::SlotPlacement;
use crate::transfer::ValueSink;
use crate::treasury::{DepositReceipt, TreasuryAccount, WithdrawReceipt};

/// Caller context of one mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub caller: AccountId,
    pub block: BlockHeight,
    /// Value attached to the call. Only `stake` and `deposit` read it.
    pub value: Amount,
}

impl Call {
    #[must_use]
    pub const fn new(caller: AccountId, block: BlockHeight) -> Self {
        Self {
            caller,
            block,
            value: 0,
        }
    }

    #[must_use]
    pub const fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// Point-in-time summary with the first anchors and links in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub genesis: BlockHeight,
    pub epoch: EpochNumber,
    pub paused: bool,
    pub anchors: AnchorCounts,
    pub total_links: usize,
    pub occupied_slots: usize,
    pub working_balance: Amount,
    pub fee_pool: Amount,
    pub escrow: Amount,
    pub event_count: usize,
    pub first_anchors: Vec<Anchor>,
    pub first_links: Vec<Link>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    config: RegistryConfig,
    access: AccessController,
    clock: EpochClock,
    anchors: AnchorStore,
    links: LinkStore,
    commitments: CommitmentLedger,
    treasury: TreasuryAccount,
    events: EventLog,
}

fn check_batch_shape(len: usize, others: &[usize], max: usize) -> Result<(), RegistryError> {
    if len == 0 {
        return Err(RegistryError::EmptyBatch);
    }
    if len > max {
        return Err(RegistryError::BatchTooLarge { len, max });
    }
    if others.iter().any(|other| *other != len) {
        return Err(RegistryError::LengthMismatch);
    }
    Ok(())
}

impl Registry {
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        let access = AccessController::new(*config.roles());
        let clock = EpochClock::new(config.genesis());
        Self {
            config,
            access,
            clock,
            anchors: AnchorStore::default(),
            links: LinkStore::default(),
            commitments: CommitmentLedger::default(),
            treasury: TreasuryAccount::default(),
            events: EventLog::default(),
        }
    }

    pub(crate) fn from_state(config: RegistryConfig, state: RegistryState) -> Self {
        Self {
            config,
            access: state.access,
            clock: state.clock,
            anchors: state.anchors,
            links: state.links,
            commitments: state.commitments,
            treasury: state.treasury,
            events: state.events,
        }
    }

    pub(crate) fn to_state(&self) -> RegistryState {
        RegistryState {
            access: self.access.clone(),
            clock: self.clock.clone(),
            anchors: self.anchors.clone(),
            links: self.links.clone(),
            commitments: self.commitments.clone(),
            treasury: self.treasury,
            events: self.events.clone(),
        }
    }

    fn gate(&self, call: &Call, role: Role) -> Result<(), RegistryError> {
        self.access.ensure_idle()?;
        self.access.require(&call.caller, role)?;
        self.access.ensure_active()
    }

    fn emit(&mut self, block: BlockHeight, notifications: impl IntoIterator<Item = Notification>) {
        self.events.append(block, notifications);
    }

    fn ensure_epoch_room(&self, epoch: EpochNumber, additional: u32) -> Result<(), RegistryError> {
        let cap = self.config.limits().anchors_per_epoch;
        if self.clock.anchor_count(epoch).saturating_add(additional) > cap {
            return Err(RegistryError::EpochFull { epoch, cap });
        }
        Ok(())
    }

    fn ensure_link_room(&self, additional: usize) -> Result<(), RegistryError> {
        let cap = self.config.limits().max_links;
        if self.links.len().saturating_add(additional) > cap {
            return Err(RegistryError::LinkCapReached { cap });
        }
        Ok(())
    }

    /// A link endpoint must exist and not be deprecated at forge time.
    fn check_endpoint(&self, id: &AnchorId) -> Result<(), RegistryError> {
        let anchor = self
            .anchors
            .get(id)
            .ok_or(RegistryError::UnknownAnchor(*id))?;
        if anchor.is_deprecated() {
            return Err(RegistryError::AnchorDeprecated(*id));
        }
        Ok(())
    }

    fn pay_out<S: ValueSink + ?Sized>(
        &mut self,
        sink: &mut S,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), RegistryError> {
        self.access.begin_transfer();
        let delivered = sink.deliver(self, to, amount);
        self.access.end_transfer();
        match delivered {
            Ok(()) => {
                tracing::info!("Transferred {amount} to {to}");
                Ok(())
            }
            Err(failure) => {
                tracing::warn!("Transfer of {amount} to {to} failed: {failure}");
                Err(RegistryError::TransferFailed {
                    to,
                    amount,
                    reason: failure.reason().to_owned(),
                })
            }
        }
    }

    // Anchors

    /// Pin a new anchor in the current epoch. Returns the epoch it was stamped with.
    pub fn pin(
        &mut self,
        call: &Call,
        id: AnchorId,
        tier: u8,
        fingerprint: Fingerprint,
        tags: &[Tag],
    ) -> Result<EpochNumber, RegistryError> {
        self.gate(call, Role::Curator)?;
        if id.is_zero() {
            return Err(RegistryError::ZeroId);
        }
        if fingerprint.is_zero() {
            return Err(RegistryError::ZeroFingerprint);
        }
        let tags = Tags::new(tags).map_err(|err| RegistryError::TooManyTags {
            count: err.count,
            max: Tags::MAX,
        })?;
        if self.anchors.contains(&id) {
            return Err(RegistryError::DuplicateAnchor(id));
        }
        let epoch = self.clock.current();
        self.ensure_epoch_room(epoch, 1)?;

        let tier = Tier::clamped(tier);
        self.anchors.insert(Anchor::new(
            id,
            call.caller,
            tier,
            epoch,
            call.block,
            fingerprint,
            tags,
        ));
        let epoch_anchors = self.clock.record_anchors(epoch, 1);
        self.emit(
            call.block,
            [Notification::Pinned {
                anchor: id,
                creator: call.caller,
                tier,
                epoch,
                epoch_anchors,
                total_anchors: self.anchors.len(),
            }],
        );
        Ok(epoch)
    }

    /// Pin several anchors under one epoch stamp. All or nothing.
    pub fn pin_batch(
        &mut self,
        call: &Call,
        ids: &[AnchorId],
        tiers: &[u8],
        fingerprints: &[Fingerprint],
    ) -> Result<usize, RegistryError> {
        self.gate(call, Role::Curator)?;
        check_batch_shape(
            ids.len(),
            &[tiers.len(), fingerprints.len()],
            self.config.limits().pin_batch,
        )?;

        let epoch = self.clock.current();
        let mut staged = BTreeSet::new();
        for (index, (id, fingerprint)) in ids.iter().zip(fingerprints).enumerate() {
            if id.is_zero() {
                return Err(RegistryError::ZeroId);
            }
            if fingerprint.is_zero() {
                return Err(RegistryError::ZeroFingerprint);
            }
            if self.anchors.contains(id) || !staged.insert(*id) {
                return Err(RegistryError::DuplicateAnchor(*id));
            }
            self.ensure_epoch_room(epoch, u32::try_from(index + 1).unwrap_or(u32::MAX))?;
        }

        let mut notifications = Vec::with_capacity(ids.len() + 1);
        for ((id, tier), fingerprint) in ids.iter().zip(tiers).zip(fingerprints) {
            let tier = Tier::clamped(*tier);
            self.anchors.insert(Anchor::new(
                *id,
                call.caller,
                tier,
                epoch,
                call.block,
                *fingerprint,
                Tags::default(),
            ));
            let epoch_anchors = self.clock.record_anchors(epoch, 1);
            notifications.push(Notification::Pinned {
                anchor: *id,
                creator: call.caller,
                tier,
                epoch,
                epoch_anchors,
                total_anchors: self.anchors.len(),
            });
        }
        notifications.push(Notification::BatchPinned {
            epoch,
            count: ids.len(),
            total_anchors: self.anchors.len(),
        });
        self.emit(call.block, notifications);
        Ok(ids.len())
    }

    /// Replace an anchor's fingerprint. Returns the superseded one.
    pub fn update_content(
        &mut self,
        call: &Call,
        id: AnchorId,
        fingerprint: Fingerprint,
    ) -> Result<Fingerprint, RegistryError> {
        self.gate(call, Role::Curator)?;
        if id.is_zero() {
            return Err(RegistryError::ZeroId);
        }
        if fingerprint.is_zero() {
            return Err(RegistryError::ZeroFingerprint);
        }
        let anchor = self
            .anchors
            .get(&id)
            .ok_or(RegistryError::UnknownAnchor(id))?;
        if anchor.is_deprecated() {
            return Err(RegistryError::AnchorDeprecated(id));
        }

        let previous = self
            .anchors
            .replace_fingerprint(&id, fingerprint, call.block)
            .ok_or(RegistryError::UnknownAnchor(id))?;
        self.emit(
            call.block,
            [Notification::ContentUpdated {
                anchor: id,
                previous,
                current: fingerprint,
            }],
        );
        Ok(previous)
    }

    /// Flag an anchor as deprecated. Repeating it succeeds; returns whether it already was.
    pub fn deprecate(&mut self, call: &Call, id: AnchorId) -> Result<bool, RegistryError> {
        self.gate(call, Role::Curator)?;
        if id.is_zero() {
            return Err(RegistryError::ZeroId);
        }
        let was_deprecated = self
            .anchors
            .mark_deprecated(&id, call.block)
            .ok_or(RegistryError::UnknownAnchor(id))?;
        self.emit(
            call.block,
            [Notification::Deprecated {
                anchor: id,
                was_deprecated,
            }],
        );
        Ok(was_deprecated)
    }

    pub fn store_recall(
        &mut self,
        call: &Call,
        id: AnchorId,
        recall: RecallHash,
    ) -> Result<(), RegistryError> {
        self.gate(call, Role::Timekeeper)?;
        if id.is_zero() {
            return Err(RegistryError::ZeroId);
        }
        if recall.is_zero() {
            return Err(RegistryError::ZeroFingerprint);
        }
        let anchor = self
            .anchors
            .get(&id)
            .ok_or(RegistryError::UnknownAnchor(id))?;
        if anchor.is_deprecated() {
            return Err(RegistryError::AnchorDeprecated(id));
        }
        if anchor.is_recall_stored() {
            return Err(RegistryError::RecallAlreadyStored(id));
        }

        self.anchors
            .attach_recall(&id, recall, call.block)
            .ok_or(RegistryError::UnknownAnchor(id))?;
        self.emit(
            call.block,
            [Notification::RecallStored { anchor: id, recall }],
        );
        Ok(())
    }

    // Links

    /// Forge a directed link. Kind and strength are clamped into range.
    #[allow(clippy::too_many_arguments)]
    pub fn forge_link(
        &mut self,
        call: &Call,
        id: LinkId,
        from: AnchorId,
        to: AnchorId,
        kind: u8,
        strength: u8,
        fingerprint: Fingerprint,
    ) -> Result<SlotPlacement, RegistryError> {
        self.gate(call, Role::Linker)?;
        if id.is_zero() || from.is_zero() || to.is_zero() {
            return Err(RegistryError::ZeroId);
        }
        if fingerprint.is_zero() {
            return Err(RegistryError::ZeroFingerprint);
        }
        self.check_endpoint(&from)?;
        self.check_endpoint(&to)?;
        if self.links.contains(&id) {
            return Err(RegistryError::DuplicateLink(id));
        }
        self.ensure_link_room(1)?;

        let link = Link::new(
            id,
            from,
            to,
            LinkKind::clamped(kind),
            Strength::clamped(strength),
            fingerprint,
            call.block,
        );
        let (placement, notification) = self.insert_link(link);
        self.emit(call.block, [notification]);
        Ok(placement)
    }

    /// Forge several links at full strength. All or nothing.
    pub fn forge_batch(
        &mut self,
        call: &Call,
        ids: &[LinkId],
        froms: &[AnchorId],
        tos: &[AnchorId],
        kinds: &[u8],
        fingerprints: &[Fingerprint],
    ) -> Result<usize, RegistryError> {
        self.gate(call, Role::Linker)?;
        check_batch_shape(
            ids.len(),
            &[froms.len(), tos.len(), kinds.len(), fingerprints.len()],
            self.config.limits().forge_batch,
        )?;

        let mut staged = BTreeSet::new();
        for (index, (((id, from), to), fingerprint)) in
            ids.iter().zip(froms).zip(tos).zip(fingerprints).enumerate()
        {
            if id.is_zero() || from.is_zero() || to.is_zero() {
                return Err(RegistryError::ZeroId);
            }
            if fingerprint.is_zero() {
                return Err(RegistryError::ZeroFingerprint);
            }
            self.check_endpoint(from)?;
            self.check_endpoint(to)?;
            if self.links.contains(id) || !staged.insert(*id) {
                return Err(RegistryError::DuplicateLink(*id));
            }
            self.ensure_link_room(index + 1)?;
        }

        let mut notifications = Vec::with_capacity(ids.len() + 1);
        for ((((id, from), to), kind), fingerprint) in
            ids.iter().zip(froms).zip(tos).zip(kinds).zip(fingerprints)
        {
            let link = Link::new(
                *id,
                *from,
                *to,
                LinkKind::clamped(*kind),
                Strength::FULL,
                *fingerprint,
                call.block,
            );
            let (_, notification) = self.insert_link(link);
            notifications.push(notification);
        }
        notifications.push(Notification::BatchForged {
            count: ids.len(),
            total_links: self.links.len(),
        });
        self.emit(call.block, notifications);
        Ok(ids.len())
    }

    fn insert_link(&mut self, link: Link) -> (SlotPlacement, Notification) {
        let (id, from, to, kind, strength) = (
            link.id(),
            link.from(),
            link.to(),
            link.kind(),
            link.strength(),
        );
        let placement = self.links.insert(link);
        let notification = Notification::Forged {
            link: id,
            from,
            to,
            kind,
            strength,
            slot: placement.slot,
            displaced: placement.displaced,
            total_links: self.links.len(),
        };
        (placement, notification)
    }

    // Epochs

    pub fn advance_epoch(&mut self, call: &Call) -> Result<EpochAdvance, RegistryError> {
        self.gate(call, Role::Timekeeper)?;
        let limits = self.config.limits();
        let outcome =
            self.clock
                .check_advance(call.block, limits.epoch_window, limits.max_epochs)?;
        match outcome {
            EpochAdvance::Unchanged => {
                tracing::debug!("Epoch advance at block {} left epoch unchanged", call.block);
            }
            EpochAdvance::Advanced { .. } => {
                let (from, to) = self.clock.advance();
                tracing::info!("Epoch advanced {from} -> {to} at block {}", call.block);
                self.emit(call.block, [Notification::EpochAdvanced { from, to }]);
            }
        }
        Ok(outcome)
    }

    // Commitments

    /// Stake `call.value` on an anchor.
    pub fn stake(&mut self, call: &Call, anchor: AnchorId) -> Result<StakeReceipt, RegistryError> {
        self.access.ensure_idle()?;
        self.access.ensure_active()?;
        if anchor.is_zero() {
            return Err(RegistryError::ZeroId);
        }
        if call.value == 0 {
            return Err(RegistryError::ZeroAmount);
        }
        if !self.anchors.contains(&anchor) {
            return Err(RegistryError::UnknownAnchor(anchor));
        }

        let receipt = self.commitments.stake(
            anchor,
            call.caller,
            call.value,
            call.block,
            self.config.limits().lock_window,
        )?;
        self.emit(
            call.block,
            [Notification::Staked {
                anchor,
                account: call.caller,
                amount: call.value,
                balance_before: receipt.balance_before,
                balance_after: receipt.balance_after,
                anchor_total: receipt.anchor_total,
                lock_until: receipt.lock_until,
            }],
        );
        Ok(receipt)
    }

    /// Release the caller's whole stake on an anchor once its lock has expired.
    pub fn release<S: ValueSink + ?Sized>(
        &mut self,
        call: &Call,
        anchor: AnchorId,
        sink: &mut S,
    ) -> Result<ReleaseReceipt, RegistryError> {
        self.access.ensure_idle()?;
        if anchor.is_zero() {
            return Err(RegistryError::ZeroId);
        }
        if !self.anchors.contains(&anchor) {
            return Err(RegistryError::UnknownAnchor(anchor));
        }

        let receipt = self.commitments.release(anchor, call.caller, call.block)?;
        if let Err(err) = self.pay_out(sink, call.caller, receipt.amount) {
            self.commitments
                .restore(anchor, call.caller, receipt.amount);
            return Err(err);
        }
        self.emit(
            call.block,
            [Notification::Released {
                anchor,
                account: call.caller,
                amount: receipt.amount,
                anchor_total: receipt.anchor_total,
            }],
        );
        Ok(receipt)
    }

    // Treasury

    /// Credit `call.value` to the treasury. A zero value is accepted and does nothing.
    pub fn deposit(&mut self, call: &Call) -> Result<Option<DepositReceipt>, RegistryError> {
        self.access.ensure_idle()?;
        if call.value == 0 {
            tracing::debug!("Ignoring zero-value deposit from {}", call.caller);
            return Ok(None);
        }
        let fee_bps = self.config.fee().map(FeeSchedule::bps);
        let receipt = self.treasury.deposit(call.value, fee_bps)?;
        self.emit(
            call.block,
            [Notification::Deposited {
                from: call.caller,
                gross: call.value,
                fee: receipt.fee,
                working_balance: receipt.working_balance,
                fee_pool: receipt.fee_pool,
            }],
        );
        Ok(Some(receipt))
    }

    /// Pay out of the working balance, clamping `amount` to what is there.
    /// Allowed while paused.
    pub fn withdraw<S: ValueSink + ?Sized>(
        &mut self,
        call: &Call,
        to: AccountId,
        amount: Amount,
        sink: &mut S,
    ) -> Result<WithdrawReceipt, RegistryError> {
        self.access.ensure_idle()?;
        self.access.require(&call.caller, Role::Curator)?;
        if amount == 0 {
            return Err(RegistryError::ZeroAmount);
        }
        if to.is_zero() {
            return Err(RegistryError::ZeroAccount);
        }

        let receipt = self.treasury.withdraw(amount);
        if receipt.amount > 0
            && let Err(err) = self.pay_out(sink, to, receipt.amount)
        {
            self.treasury.restore_working(receipt.amount);
            return Err(err);
        }
        self.emit(
            call.block,
            [Notification::Withdrawn {
                to,
                requested: receipt.requested,
                amount: receipt.amount,
                balance_before: receipt.balance_before,
                balance_after: receipt.balance_after,
            }],
        );
        Ok(receipt)
    }

    /// Pay the whole fee pool to the configured fee recipient.
    pub fn sweep_fees<S: ValueSink + ?Sized>(
        &mut self,
        call: &Call,
        sink: &mut S,
    ) -> Result<Amount, RegistryError> {
        self.gate(call, Role::Curator)?;
        let recipient = match self.config.fee() {
            Some(fee) if self.treasury.fee_pool() > 0 => fee.recipient(),
            _ => return Err(RegistryError::EmptyFeePool),
        };

        let amount = self.treasury.take_fees();
        if let Err(err) = self.pay_out(sink, recipient, amount) {
            self.treasury.restore_fees(amount);
            return Err(err);
        }
        self.emit(
            call.block,
            [Notification::FeesSwept {
                to: recipient,
                amount,
            }],
        );
        Ok(amount)
    }

    // Pause switch

    pub fn pause(&mut self, call: &Call) -> Result<(), RegistryError> {
        self.gate(call, Role::Curator)?;
        let was_paused = self.access.set_paused(true);
        tracing::info!("Registry paused at block {}", call.block);
        self.emit(call.block, [Notification::Paused { was_paused }]);
        Ok(())
    }

    /// Always accepted from the curator, paused or not.
    pub fn unpause(&mut self, call: &Call) -> Result<(), RegistryError> {
        self.access.ensure_idle()?;
        self.access.require(&call.caller, Role::Curator)?;
        let was_paused = self.access.set_paused(false);
        tracing::info!("Registry unpaused at block {}", call.block);
        self.emit(call.block, [Notification::Unpaused { was_paused }]);
        Ok(())
    }

    // Reads

    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[must_use]
    pub const fn access(&self) -> &AccessController {
        &self.access
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    #[must_use]
    pub const fn clock(&self) -> &EpochClock {
        &self.clock
    }

    #[must_use]
    pub const fn anchors(&self) -> &AnchorStore {
        &self.anchors
    }

    #[must_use]
    pub const fn links(&self) -> &LinkStore {
        &self.links
    }

    #[must_use]
    pub const fn commitments(&self) -> &CommitmentLedger {
        &self.commitments
    }

    #[must_use]
    pub const fn treasury(&self) -> &TreasuryAccount {
        &self.treasury
    }

    #[must_use]
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn anchor(&self, id: &AnchorId) -> Option<&Anchor> {
        self.anchors.get(id)
    }

    #[must_use]
    pub fn link(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    /// Like [`Self::anchor`], but a missing anchor is an error.
    pub fn try_anchor(&self, id: &AnchorId) -> Result<&Anchor, RegistryError> {
        self.anchors.get(id).ok_or(RegistryError::UnknownAnchor(*id))
    }

    /// Like [`Self::link`], but a missing link is an error.
    pub fn try_link(&self, id: &LinkId) -> Result<&Link, RegistryError> {
        self.links.get(id).ok_or(RegistryError::UnknownLink(*id))
    }

    pub fn content_history(&self, id: &AnchorId) -> Result<&[Fingerprint], RegistryError> {
        self.try_anchor(id)?;
        Ok(self.anchors.history(id))
    }

    /// Anchors pinned per epoch, for at most `max` epochs from genesis.
    #[must_use]
    pub fn epoch_counters(&self, max: usize) -> &[u32] {
        paging::head(self.clock.anchor_counts(), max)
    }

    pub fn events_range(&self, offset: usize, limit: usize) -> Result<&[Event], RegistryError> {
        self.events.range(offset, limit)
    }

    #[must_use]
    pub fn snapshot(&self, max_anchors: usize, max_links: usize) -> Snapshot {
        Snapshot {
            genesis: self.clock.genesis(),
            epoch: self.clock.current(),
            paused: self.access.is_paused(),
            anchors: self.anchors.counts(),
            total_links: self.links.len(),
            occupied_slots: self.links.slots().occupied(),
            working_balance: self.treasury.working_balance(),
            fee_pool: self.treasury.fee_pool(),
            escrow: self.commitments.escrow(),
            event_count: self.events.len(),
            first_anchors: self.anchors.iter().take(max_anchors).cloned().collect(),
            first_links: self.links.iter().take(max_links).cloned().collect(),
        }
    }
}
