//! Link table, adjacency lists and the slot index.
//!
//! The id map and the adjacency lists are authoritative. Links are never
//! mutated or removed once forged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use anchorage_types::{AnchorId, BlockHeight, Fingerprint, LinkId, LinkKind, RegistryError, Strength};

use crate::paging;
use crate::slots::{SlotPlacement, SlotTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    id: LinkId,
    from: AnchorId,
    to: AnchorId,
    kind: LinkKind,
    strength: Strength,
    fingerprint: Fingerprint,
    created_at: BlockHeight,
}

impl Link {
    pub(crate) const fn new(
        id: LinkId,
        from: AnchorId,
        to: AnchorId,
        kind: LinkKind,
        strength: Strength,
        fingerprint: Fingerprint,
        created_at: BlockHeight,
    ) -> Self {
        Self {
            id,
            from,
            to,
            kind,
            strength,
            fingerprint,
            created_at,
        }
    }

    #[must_use]
    pub const fn id(&self) -> LinkId {
        self.id
    }

    #[must_use]
    pub const fn from(&self) -> AnchorId {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> AnchorId {
        self.to
    }

    #[must_use]
    pub const fn kind(&self) -> LinkKind {
        self.kind
    }

    #[must_use]
    pub const fn strength(&self) -> Strength {
        self.strength
    }

    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    #[must_use]
    pub const fn created_at(&self) -> BlockHeight {
        self.created_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStore {
    links: BTreeMap<LinkId, Link>,
    order: Vec<LinkId>,
    outbound: BTreeMap<AnchorId, Vec<LinkId>>,
    inbound: BTreeMap<AnchorId, Vec<LinkId>>,
    slots: SlotTable,
}

impl LinkStore {
    #[must_use]
    pub fn get(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &LinkId) -> bool {
        self.links.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> &[LinkId] {
        &self.order
    }

    pub fn page(&self, offset: usize, limit: usize) -> Result<&[LinkId], RegistryError> {
        paging::page(&self.order, offset, limit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.order.iter().filter_map(|id| self.links.get(id))
    }

    #[must_use]
    pub fn outbound(&self, anchor: &AnchorId) -> &[LinkId] {
        self.outbound.get(anchor).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn inbound(&self, anchor: &AnchorId) -> &[LinkId] {
        self.inbound.get(anchor).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether any link runs `from -> to`. Scans whichever adjacency list is shorter.
    #[must_use]
    pub fn exists_between(&self, from: &AnchorId, to: &AnchorId) -> bool {
        let outbound = self.outbound(from);
        let inbound = self.inbound(to);
        if outbound.len() <= inbound.len() {
            outbound
                .iter()
                .filter_map(|id| self.links.get(id))
                .any(|link| link.to == *to)
        } else {
            inbound
                .iter()
                .filter_map(|id| self.links.get(id))
                .any(|link| link.from == *from)
        }
    }

    #[must_use]
    pub fn inbound_strength(&self, anchor: &AnchorId) -> u64 {
        self.strength_sum(self.inbound(anchor))
    }

    #[must_use]
    pub fn outbound_strength(&self, anchor: &AnchorId) -> u64 {
        self.strength_sum(self.outbound(anchor))
    }

    fn strength_sum(&self, ids: &[LinkId]) -> u64 {
        ids.iter()
            .filter_map(|id| self.links.get(id))
            .map(|link| u64::from(link.strength.value()))
            .sum()
    }

    #[must_use]
    pub const fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub(crate) fn insert(&mut self, link: Link) -> SlotPlacement {
        let placement = self.slots.place(link.id);
        self.order.push(link.id);
        self.outbound.entry(link.from).or_default().push(link.id);
        self.inbound.entry(link.to).or_default().push(link.id);
        self.links.insert(link.id, link);
        placement
    }
}
