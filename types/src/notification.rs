//! Structured notifications emitted by successful registry mutations.
//!
//! One notification per accepted call; batches emit one per item followed by
//! a summary. Each carries the before/after values an external observer needs
//! to follow the state without re-reading it.

use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Amount, AnchorId, BlockHeight, EpochNumber, Fingerprint, LinkId, LinkKind,
    RecallHash, Strength, Tier,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    Pinned {
        anchor: AnchorId,
        creator: AccountId,
        tier: Tier,
        epoch: EpochNumber,
        epoch_anchors: u32,
        total_anchors: usize,
    },
    BatchPinned {
        epoch: EpochNumber,
        count: usize,
        total_anchors: usize,
    },
    ContentUpdated {
        anchor: AnchorId,
        previous: Fingerprint,
        current: Fingerprint,
    },
    Deprecated {
        anchor: AnchorId,
        was_deprecated: bool,
    },
    RecallStored {
        anchor: AnchorId,
        recall: RecallHash,
    },
    Forged {
        link: LinkId,
        from: AnchorId,
        to: AnchorId,
        kind: LinkKind,
        strength: Strength,
        slot: usize,
        displaced: Option<LinkId>,
        total_links: usize,
    },
    BatchForged {
        count: usize,
        total_links: usize,
    },
    EpochAdvanced {
        from: EpochNumber,
        to: EpochNumber,
    },
    Staked {
        anchor: AnchorId,
        account: AccountId,
        amount: Amount,
        balance_before: Amount,
        balance_after: Amount,
        anchor_total: Amount,
        lock_until: BlockHeight,
    },
    Released {
        anchor: AnchorId,
        account: AccountId,
        amount: Amount,
        anchor_total: Amount,
    },
    Deposited {
        from: AccountId,
        gross: Amount,
        fee: Amount,
        working_balance: Amount,
        fee_pool: Amount,
    },
    Withdrawn {
        to: AccountId,
        requested: Amount,
        amount: Amount,
        balance_before: Amount,
        balance_after: Amount,
    },
    FeesSwept {
        to: AccountId,
        amount: Amount,
    },
    Paused {
        was_paused: bool,
    },
    Unpaused {
        was_paused: bool,
    },
}

impl Notification {
    /// Stable snake_case name, matching the serialized tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pinned { .. } => "pinned",
            Self::BatchPinned { .. } => "batch_pinned",
            Self::ContentUpdated { .. } => "content_updated",
            Self::Deprecated { .. } => "deprecated",
            Self::RecallStored { .. } => "recall_stored",
            Self::Forged { .. } => "forged",
            Self::BatchForged { .. } => "batch_forged",
            Self::EpochAdvanced { .. } => "epoch_advanced",
            Self::Staked { .. } => "staked",
            Self::Released { .. } => "released",
            Self::Deposited { .. } => "deposited",
            Self::Withdrawn { .. } => "withdrawn",
            Self::FeesSwept { .. } => "fees_swept",
            Self::Paused { .. } => "paused",
            Self::Unpaused { .. } => "unpaused",
        }
    }
}

/// A notification stamped with its position in the log and the block of the
/// call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sequence: u64,
    pub block: BlockHeight,
    pub notification: Notification,
}

#[cfg(test)]
mod tests {
    use super::Notification;
    use crate::{AccountId, EpochNumber};

    #[test]
    fn serialized_tag_matches_name() {
        let notification = Notification::EpochAdvanced {
            from: EpochNumber::new(0),
            to: EpochNumber::new(1),
        };
        let json = serde_json::to_value(&notification).expect("serialize");
        assert!(json.get(notification.name()).is_some());
    }

    #[test]
    fn wide_amounts_survive_json() {
        let notification = Notification::Deposited {
            from: AccountId::from_label("payer"),
            gross: u128::MAX,
            fee: 0,
            working_balance: u128::MAX,
            fee_pool: 0,
        };
        let json = serde_json::to_string(&notification).expect("serialize");
        let back: Notification = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, notification);
    }
}
