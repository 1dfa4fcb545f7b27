//! Registry failure taxonomy.
//!
//! Every rejected call returns exactly one of these and leaves no trace in
//! registry state. Successful no-ops (zero deposit, epoch already advanced)
//! are not errors and never appear here.

use thiserror::Error;

use crate::{AccountId, Amount, AnchorId, BlockHeight, EpochNumber, LinkId, Role};

/// Coarse classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong role, paused registry, or re-entrant call.
    Authorization,
    /// Malformed input: zero values, bad batch shape, bad range.
    Validation,
    /// Unknown anchor or link.
    NotFound,
    /// A fixed bound would be exceeded.
    Capacity,
    /// The request contradicts current state.
    StateConflict,
    /// The outbound value transfer was refused by its destination.
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("caller {caller} does not hold the {required} role")]
    Unauthorized { caller: AccountId, required: Role },
    #[error("registry is paused")]
    Paused,
    #[error("re-entrant call rejected while a value transfer is in flight")]
    Reentrant,

    #[error("identifier must not be zero")]
    ZeroId,
    #[error("fingerprint must not be zero")]
    ZeroFingerprint,
    #[error("amount must not be zero")]
    ZeroAmount,
    #[error("account must not be zero")]
    ZeroAccount,
    #[error("{count} tags exceed the limit of {max}")]
    TooManyTags { count: usize, max: usize },
    #[error("batch must not be empty")]
    EmptyBatch,
    #[error("batch arrays differ in length")]
    LengthMismatch,
    #[error("offset {offset} is past the end ({len})")]
    InvalidRange { offset: usize, len: usize },
    #[error("amount overflow")]
    AmountOverflow,

    #[error("unknown anchor {0}")]
    UnknownAnchor(AnchorId),
    #[error("unknown link {0}")]
    UnknownLink(LinkId),

    #[error("epoch {epoch} already holds {cap} anchors")]
    EpochFull { epoch: EpochNumber, cap: u32 },
    #[error("link capacity of {cap} reached")]
    LinkCapReached { cap: usize },
    #[error("batch of {len} exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("anchor {0} already exists")]
    DuplicateAnchor(AnchorId),
    #[error("link {0} already exists")]
    DuplicateLink(LinkId),
    #[error("anchor {0} is deprecated")]
    AnchorDeprecated(AnchorId),
    #[error("anchor {0} already has a recall hash")]
    RecallAlreadyStored(AnchorId),
    #[error("epoch {next} opens at block {opens_at}")]
    EpochWindowNotReached {
        next: EpochNumber,
        opens_at: BlockHeight,
    },
    #[error("{account} has no commitment on anchor {anchor}")]
    NoCommitment { anchor: AnchorId, account: AccountId },
    #[error("commitment locked until block {until}")]
    CommitmentLocked { until: BlockHeight },
    #[error("fee pool is empty")]
    EmptyFeePool,

    #[error("transfer of {amount} to {to} failed: {reason}")]
    TransferFailed {
        to: AccountId,
        amount: Amount,
        reason: String,
    },
}

impl RegistryError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } | Self::Paused | Self::Reentrant => ErrorKind::Authorization,
            Self::ZeroId
            | Self::ZeroFingerprint
            | Self::ZeroAmount
            | Self::ZeroAccount
            | Self::TooManyTags { .. }
            | Self::EmptyBatch
            | Self::LengthMismatch
            | Self::InvalidRange { .. }
            | Self::AmountOverflow => ErrorKind::Validation,
            Self::UnknownAnchor(_) | Self::UnknownLink(_) => ErrorKind::NotFound,
            Self::EpochFull { .. } | Self::LinkCapReached { .. } | Self::BatchTooLarge { .. } => {
                ErrorKind::Capacity
            }
            Self::DuplicateAnchor(_)
            | Self::DuplicateLink(_)
            | Self::AnchorDeprecated(_)
            | Self::RecallAlreadyStored(_)
            | Self::EpochWindowNotReached { .. }
            | Self::NoCommitment { .. }
            | Self::CommitmentLocked { .. }
            | Self::EmptyFeePool => ErrorKind::StateConflict,
            Self::TransferFailed { .. } => ErrorKind::Transfer,
        }
    }
}
