//! Shared infrastructure utilities for Anchorage.
//!
//! Kept out of the domain-pure `anchorage-types` crate because everything
//! here touches the filesystem:
//!
//! - **`atomic_write`**: crash-safe state file persistence (temp + rename)

pub mod atomic_write;

pub use atomic_write::{SyncPolicy, atomic_write, atomic_write_with, recover_backup};
