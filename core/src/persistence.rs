//! Registry state file.
//!
//! The whole registry is one JSON document, replaced atomically on every save.
//! Configuration is not stored beyond what is needed to refuse a file written
//! under different roles or a different genesis block.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use anchorage_config::RegistryConfig;
use anchorage_types::BlockHeight;
use anchorage_utils::{SyncPolicy, atomic_write_with, recover_backup};

use crate::Registry;
use crate::access::AccessController;
use crate::anchors::AnchorStore;
use crate::commitments::CommitmentLedger;
use crate::epoch::EpochClock;
use crate::events::EventLog;
use crate::links::LinkStore;
use crate::treasury::TreasuryAccount;

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("failed to read state file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write state file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode state file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode registry state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("state file version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("state file was written under a different {0}")]
    ConfigMismatch(&'static str),
    #[error("state file is inconsistent: {0}")]
    Inconsistent(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegistryState {
    pub(crate) access: AccessController,
    pub(crate) clock: EpochClock,
    pub(crate) anchors: AnchorStore,
    pub(crate) links: LinkStore,
    pub(crate) commitments: CommitmentLedger,
    pub(crate) treasury: TreasuryAccount,
    pub(crate) events: EventLog,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    genesis: BlockHeight,
    state: RegistryState,
}

pub fn save_state(registry: &Registry, path: &Path) -> Result<(), StateFileError> {
    save_state_with(registry, path, SyncPolicy::Durable)
}

pub fn save_state_with(
    registry: &Registry,
    path: &Path,
    policy: SyncPolicy,
) -> Result<(), StateFileError> {
    let file = StateFile {
        version: STATE_VERSION,
        genesis: registry.config().genesis(),
        state: registry.to_state(),
    };
    let bytes = serde_json::to_vec_pretty(&file).map_err(StateFileError::Encode)?;
    atomic_write_with(path, &bytes, policy).map_err(|source| StateFileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        "Saved registry state to {} ({} events)",
        path.display(),
        registry.events().len()
    );
    Ok(())
}

/// Load a registry saved by [`save_state`] and bind it to `config`.
pub fn load_state(path: &Path, config: RegistryConfig) -> Result<Registry, StateFileError> {
    recover_backup(path);
    let raw = fs::read(path).map_err(|source| StateFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: StateFile = serde_json::from_slice(&raw).map_err(|source| StateFileError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    if file.version != STATE_VERSION {
        return Err(StateFileError::Version {
            found: file.version,
            expected: STATE_VERSION,
        });
    }
    if file.genesis != config.genesis() || file.state.clock.genesis() != config.genesis() {
        return Err(StateFileError::ConfigMismatch("genesis block"));
    }
    if file.state.access.roles() != config.roles() {
        return Err(StateFileError::ConfigMismatch("role assignment"));
    }
    file.state
        .clock
        .check_consistency()
        .map_err(StateFileError::Inconsistent)?;

    Ok(Registry::from_state(config, file.state))
}
