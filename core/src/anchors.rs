//! Anchor table.
//!
//! Anchors are never removed. The creation-order list is append-only and the
//! scans over it are linear; the per-epoch cap keeps them bounded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use anchorage_types::{
    AccountId, AnchorId, BlockHeight, EpochNumber, Fingerprint, RecallHash, RegistryError, Tag,
    Tags, Tier,
};

use crate::paging;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    id: AnchorId,
    creator: AccountId,
    tier: Tier,
    epoch: EpochNumber,
    created_at: BlockHeight,
    updated_at: BlockHeight,
    fingerprint: Fingerprint,
    tags: Tags,
    recall: Option<RecallHash>,
    deprecated: bool,
}

impl Anchor {
    pub(crate) fn new(
        id: AnchorId,
        creator: AccountId,
        tier: Tier,
        epoch: EpochNumber,
        block: BlockHeight,
        fingerprint: Fingerprint,
        tags: Tags,
    ) -> Self {
        Self {
            id,
            creator,
            tier,
            epoch,
            created_at: block,
            updated_at: block,
            fingerprint,
            tags,
            recall: None,
            deprecated: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> AnchorId {
        self.id
    }

    #[must_use]
    pub const fn creator(&self) -> AccountId {
        self.creator
    }

    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub const fn epoch(&self) -> EpochNumber {
        self.epoch
    }

    #[must_use]
    pub const fn created_at(&self) -> BlockHeight {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> BlockHeight {
        self.updated_at
    }

    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        self.tags.as_slice()
    }

    #[must_use]
    pub const fn recall(&self) -> Option<RecallHash> {
        self.recall
    }

    #[must_use]
    pub const fn is_recall_stored(&self) -> bool {
        self.recall.is_some()
    }

    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        self.deprecated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AnchorCounts {
    pub total: usize,
    pub recall_stored: usize,
    pub deprecated: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorStore {
    anchors: BTreeMap<AnchorId, Anchor>,
    order: Vec<AnchorId>,
    /// Superseded fingerprints, oldest first.
    history: BTreeMap<AnchorId, Vec<Fingerprint>>,
}

impl AnchorStore {
    #[must_use]
    pub fn get(&self, id: &AnchorId) -> Option<&Anchor> {
        self.anchors.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &AnchorId) -> bool {
        self.anchors.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in creation order.
    #[must_use]
    pub fn ids(&self) -> &[AnchorId] {
        &self.order
    }

    pub fn page(&self, offset: usize, limit: usize) -> Result<&[AnchorId], RegistryError> {
        paging::page(&self.order, offset, limit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.order.iter().filter_map(|id| self.anchors.get(id))
    }

    #[must_use]
    pub fn by_epoch(&self, epoch: EpochNumber) -> Vec<AnchorId> {
        self.iter()
            .filter(|anchor| anchor.epoch == epoch)
            .map(Anchor::id)
            .collect()
    }

    #[must_use]
    pub fn by_tier(&self, tier: Tier) -> Vec<AnchorId> {
        self.iter()
            .filter(|anchor| anchor.tier == tier)
            .map(Anchor::id)
            .collect()
    }

    #[must_use]
    pub fn by_tag(&self, tag: &Tag) -> Vec<AnchorId> {
        self.iter()
            .filter(|anchor| anchor.tags.contains(tag))
            .map(Anchor::id)
            .collect()
    }

    #[must_use]
    pub fn counts(&self) -> AnchorCounts {
        self.iter().fold(
            AnchorCounts {
                total: self.len(),
                ..AnchorCounts::default()
            },
            |mut counts, anchor| {
                counts.recall_stored += usize::from(anchor.is_recall_stored());
                counts.deprecated += usize::from(anchor.deprecated);
                counts
            },
        )
    }

    #[must_use]
    pub fn history(&self, id: &AnchorId) -> &[Fingerprint] {
        self.history.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn insert(&mut self, anchor: Anchor) {
        self.order.push(anchor.id);
        self.anchors.insert(anchor.id, anchor);
    }

    /// Returns the superseded fingerprint, or `None` for an unknown id.
    pub(crate) fn replace_fingerprint(
        &mut self,
        id: &AnchorId,
        fingerprint: Fingerprint,
        block: BlockHeight,
    ) -> Option<Fingerprint> {
        let anchor = self.anchors.get_mut(id)?;
        let previous = anchor.fingerprint;
        anchor.fingerprint = fingerprint;
        anchor.updated_at = block;
        self.history.entry(*id).or_default().push(previous);
        Some(previous)
    }

    /// Returns whether the anchor was already deprecated.
    pub(crate) fn mark_deprecated(&mut self, id: &AnchorId, block: BlockHeight) -> Option<bool> {
        let anchor = self.anchors.get_mut(id)?;
        let was = anchor.deprecated;
        if !was {
            anchor.deprecated = true;
            anchor.updated_at = block;
        }
        Some(was)
    }

    pub(crate) fn attach_recall(
        &mut self,
        id: &AnchorId,
        recall: RecallHash,
        block: BlockHeight,
    ) -> Option<()> {
        let anchor = self.anchors.get_mut(id)?;
        anchor.recall = Some(recall);
        anchor.updated_at = block;
        Some(())
    }
}
