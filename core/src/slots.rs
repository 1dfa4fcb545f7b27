//! Fixed-size secondary index over link ids.
//!
//! A link lands in its home slot when that slot is free; otherwise it takes the
//! next slot (wrapping) and overwrites whatever is there. There is no further
//! probing and no resize, so entries are lost under collision. Nothing reads
//! this table to decide whether a link exists.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use anchorage_types::LinkId;

pub const SLOT_COUNT: usize = 32;

/// Home slot: SHA-256 of the id as a big-endian integer, modulo [`SLOT_COUNT`].
///
/// The modulus divides 256, so only the last digest byte matters.
#[must_use]
pub fn slot_of(id: &LinkId) -> usize {
    let digest = Sha256::digest(id.as_bytes());
    usize::from(digest[digest.len() - 1]) % SLOT_COUNT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlacement {
    pub slot: usize,
    /// The entry that was overwritten, if any.
    pub displaced: Option<LinkId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotTable {
    slots: [Option<LinkId>; SLOT_COUNT],
}

impl SlotTable {
    pub(crate) fn place(&mut self, id: LinkId) -> SlotPlacement {
        let home = slot_of(&id);
        let slot = if self.slots[home].is_some() {
            (home + 1) % SLOT_COUNT
        } else {
            home
        };
        let displaced = self.slots[slot].replace(id);
        if let Some(previous) = displaced {
            tracing::warn!("Slot {slot} overwritten: {previous} displaced by {id}");
        }
        SlotPlacement { slot, displaced }
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<LinkId> {
        self.slots.get(slot).copied().flatten()
    }

    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Option<LinkId>] {
        &self.slots
    }
}
