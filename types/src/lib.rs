//! Core domain types for Anchorage.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the registry.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod bounded;
mod chain;
mod error;
mod ids;
mod notification;
mod role;

pub use bounded::{LinkKind, Strength, Tags, Tier, TooManyTags};
pub use chain::{Amount, BlockHeight, EpochNumber};
pub use error::{ErrorKind, RegistryError};
pub use ids::{AccountId, AnchorId, Fingerprint, IdParseError, LinkId, RecallHash, Tag};
pub use notification::{Event, Notification};
pub use role::Role;
