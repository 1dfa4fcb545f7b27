//! Registry state machine for Anchorage.
//!
//! [`Registry`] owns every component and is the only mutation surface. Each
//! mutating call is gated by [`AccessController`], validated in full, and then
//! committed together with its notifications. A rejected call leaves no trace.

mod access;
mod anchors;
mod commitments;
mod epoch;
mod events;
mod links;
mod paging;
mod persistence;
mod registry;
mod slots;
mod transfer;
mod treasury;


pub use access::AccessController;
pub use anchors::{Anchor, AnchorCounts, AnchorStore};
pub use commitments::{CommitmentLedger, ReleaseReceipt, StakeReceipt};
pub use epoch::{EpochAdvance, EpochClock};
pub use events::EventLog;
pub use links::{Link, LinkStore};
pub use persistence::{STATE_VERSION, StateFileError, load_state, save_state, save_state_with};
pub use registry::{Call, Registry, Snapshot};
pub use slots::{SLOT_COUNT, SlotPlacement, SlotTable, slot_of};
pub use transfer::{Payout, PayoutLedger, TransferFailure, ValueSink};
pub use treasury::{DepositReceipt, TreasuryAccount, WithdrawReceipt, split_fee};
