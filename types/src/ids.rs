use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdParseError {
    #[error("expected {expected} bytes, found {found}")]
    Length { expected: usize, found: usize },
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Fixed-width opaque identifier.
///
/// The all-zero value is representable because callers can submit it; the
/// registry rejects it at the boundary. Serializes as `0x`-prefixed hex so the
/// value also works as a JSON map key.
macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;
            pub const ZERO: Self = Self([0; $len]);

            #[must_use]
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Left-aligned label, zero padded. Bytes past the width are dropped.
            #[must_use]
            pub fn from_label(label: &str) -> Self {
                let mut bytes = [0u8; $len];
                let src = label.as_bytes();
                let n = src.len().min($len);
                bytes[..n].copy_from_slice(&src[..n]);
                Self(bytes)
            }

            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            #[must_use]
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            pub fn parse_hex(raw: &str) -> Result<Self, IdParseError> {
                let raw = raw.trim();
                let digits = raw
                    .strip_prefix("0x")
                    .or_else(|| raw.strip_prefix("0X"))
                    .unwrap_or(raw);
                let decoded = hex::decode(digits)?;
                let bytes: [u8; $len] =
                    decoded
                        .as_slice()
                        .try_into()
                        .map_err(|_err| IdParseError::Length {
                            expected: $len,
                            found: decoded.len(),
                        })?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_hex(s)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse_hex(&raw).map_err(D::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// Anchor (graph node) identifier.
    AnchorId,
    32
);
fixed_bytes!(
    /// Link (graph edge) identifier.
    LinkId,
    32
);
fixed_bytes!(
    /// Content or configuration digest supplied by the caller.
    Fingerprint,
    32
);
fixed_bytes!(
    /// Free-form anchor tag.
    Tag,
    32
);
fixed_bytes!(
    /// Digest attached by the timekeeper once an anchor's recall data is stored.
    RecallHash,
    32
);
fixed_bytes!(
    /// Caller / payee account.
    AccountId,
    20
);
