//! On-disk TOML shape. Everything is optional except `[roles]`; validation
//! happens in [`ConfigFile::into_config`].

use serde::Deserialize;

use anchorage_types::{AccountId, BlockHeight};

use crate::{
    ConfigError, DEFAULT_FEE_BPS, FeeSchedule, Limits, RegistryConfig, Roles, expand_env_vars,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub genesis_block: Option<u64>,
    pub roles: RolesFile,
    pub treasury: Option<TreasuryFile>,
    pub limits: Option<LimitsFile>,
}

/// Role holders as hex strings. `${VAR}` references are expanded before parsing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolesFile {
    pub curator: String,
    pub linker: String,
    pub timekeeper: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreasuryFile {
    pub fee_recipient: String,
    /// Default: 25.
    pub fee_bps: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsFile {
    pub epoch_window: Option<u64>,
    pub lock_window: Option<u64>,
    pub max_epochs: Option<u64>,
    pub anchors_per_epoch: Option<u32>,
    pub max_links: Option<usize>,
    pub pin_batch: Option<usize>,
    pub forge_batch: Option<usize>,
}

impl LimitsFile {
    fn resolve(self) -> Limits {
        let defaults = Limits::default();
        Limits {
            epoch_window: self.epoch_window.unwrap_or(defaults.epoch_window),
            lock_window: self.lock_window.unwrap_or(defaults.lock_window),
            max_epochs: self.max_epochs.unwrap_or(defaults.max_epochs),
            anchors_per_epoch: self.anchors_per_epoch.unwrap_or(defaults.anchors_per_epoch),
            max_links: self.max_links.unwrap_or(defaults.max_links),
            pin_batch: self.pin_batch.unwrap_or(defaults.pin_batch),
            forge_batch: self.forge_batch.unwrap_or(defaults.forge_batch),
        }
    }
}

fn parse_account(field: &'static str, raw: &str) -> Result<AccountId, ConfigError> {
    let expanded = expand_env_vars(raw);
    AccountId::parse_hex(expanded.trim()).map_err(|source| ConfigError::Account { field, source })
}

impl ConfigFile {
    pub fn into_config(self) -> Result<RegistryConfig, ConfigError> {
        let roles = Roles::new(
            parse_account("curator", &self.roles.curator)?,
            parse_account("linker", &self.roles.linker)?,
            parse_account("timekeeper", &self.roles.timekeeper)?,
        )?;

        let fee = match self.treasury {
            Some(treasury) => Some(FeeSchedule::new(
                parse_account("fee_recipient", &treasury.fee_recipient)?,
                treasury.fee_bps.unwrap_or(DEFAULT_FEE_BPS),
            )?),
            None => None,
        };

        let limits = self.limits.unwrap_or_default().resolve();
        RegistryConfig::new(
            roles,
            BlockHeight::new(self.genesis_block.unwrap_or(0)),
            fee,
            limits,
        )
    }
}
