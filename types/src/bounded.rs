//! Small bounded scalars.
//!
//! Out-of-range input is clamped at construction rather than rejected, so
//! every held value is in range by construction. Tier collapses to zero; kind
//! and strength saturate at their maximum.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Tag;

/// Anchor tier in `[0, 7]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const MAX: u8 = 7;

    /// Values above [`Tier::MAX`] become tier 0.
    #[must_use]
    pub const fn clamped(raw: u8) -> Self {
        if raw > Self::MAX { Self(0) } else { Self(raw) }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for Tier {
    fn from(raw: u8) -> Self {
        Self::clamped(raw)
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

/// Link kind in `[0, 31]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct LinkKind(u8);

impl LinkKind {
    pub const MAX: u8 = 31;

    #[must_use]
    pub const fn clamped(raw: u8) -> Self {
        if raw > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(raw)
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for LinkKind {
    fn from(raw: u8) -> Self {
        Self::clamped(raw)
    }
}

impl From<LinkKind> for u8 {
    fn from(kind: LinkKind) -> Self {
        kind.0
    }
}

/// Link strength in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Strength(u8);

impl Strength {
    pub const MAX: u8 = 100;
    /// Strength assigned to every batch-forged link.
    pub const FULL: Self = Self(Self::MAX);

    #[must_use]
    pub const fn clamped(raw: u8) -> Self {
        if raw > Self::MAX {
            Self::FULL
        } else {
            Self(raw)
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for Strength {
    fn from(raw: u8) -> Self {
        Self::clamped(raw)
    }
}

impl From<Strength> for u8 {
    fn from(strength: Strength) -> Self {
        strength.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{count} tags exceed the limit of {}", Tags::MAX)]
pub struct TooManyTags {
    pub count: usize,
}

/// At most [`Tags::MAX`] tags, in caller order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tag>", into = "Vec<Tag>")]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub const MAX: usize = 4;

    pub fn new(tags: &[Tag]) -> Result<Self, TooManyTags> {
        if tags.len() > Self::MAX {
            return Err(TooManyTags { count: tags.len() });
        }
        Ok(Self(tags.to_vec()))
    }

    #[must_use]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Tag] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Tag>> for Tags {
    type Error = TooManyTags;

    fn try_from(tags: Vec<Tag>) -> Result<Self, Self::Error> {
        Self::new(&tags)
    }
}

impl From<Tags> for Vec<Tag> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}
