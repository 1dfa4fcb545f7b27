//! Configuration for the anchorage registry.
//!
//! The registry takes one immutable [`RegistryConfig`] at startup: the three
//! role holders, the genesis block, the optional fee schedule, and the fixed
//! limits. Nothing in it is ever rotated or mutated afterwards.
//!
//! ```toml
//! genesis_block = 1000
//!
//! [roles]
//! curator = "0x…"
//! linker = "${ANCHORAGE_LINKER}"
//! timekeeper = "0x…"
//!
//! [treasury]
//! fee_recipient = "0x…"
//! fee_bps = 25
//!
//! [limits]
//! epoch_window = 128
//! ```

mod file;

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use anchorage_types::{AccountId, BlockHeight, IdParseError, Role};

pub use file::{ConfigFile, LimitsFile, RolesFile, TreasuryFile};

/// Basis-point denominator for fee schedules.
pub const BPS_DENOMINATOR: u16 = 10_000;
pub const DEFAULT_FEE_BPS: u16 = 25;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {field} account: {source}")]
    Account {
        field: &'static str,
        #[source]
        source: IdParseError,
    },
    #[error("{0} account must not be zero")]
    ZeroAccount(&'static str),
    #[error("{first} and {second} roles share account {account}")]
    SharedRole {
        first: Role,
        second: Role,
        account: AccountId,
    },
    #[error("fee of {bps} bps exceeds {}", BPS_DENOMINATOR)]
    FeeTooHigh { bps: u16 },
    #[error("limit {0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("could not determine the config path")]
    NoPath,
}

/// The three role holders. Non-zero and pairwise distinct by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    curator: AccountId,
    linker: AccountId,
    timekeeper: AccountId,
}

impl Roles {
    pub fn new(
        curator: AccountId,
        linker: AccountId,
        timekeeper: AccountId,
    ) -> Result<Self, ConfigError> {
        let roles = Self {
            curator,
            linker,
            timekeeper,
        };
        for role in Role::ALL {
            if roles.holder(role).is_zero() {
                return Err(ConfigError::ZeroAccount(role.as_str()));
            }
        }
        for (i, first) in Role::ALL.iter().enumerate() {
            for second in &Role::ALL[i + 1..] {
                let account = roles.holder(*first);
                if account == roles.holder(*second) {
                    return Err(ConfigError::SharedRole {
                        first: *first,
                        second: *second,
                        account,
                    });
                }
            }
        }
        Ok(roles)
    }

    #[must_use]
    pub const fn holder(&self, role: Role) -> AccountId {
        match role {
            Role::Curator => self.curator,
            Role::Linker => self.linker,
            Role::Timekeeper => self.timekeeper,
        }
    }

    #[must_use]
    pub fn holds(&self, account: &AccountId, role: Role) -> bool {
        self.holder(role) == *account
    }
}

/// Deposit fee: `bps / 10_000` of every deposit goes to `recipient`'s pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    recipient: AccountId,
    bps: u16,
}

impl FeeSchedule {
    pub fn new(recipient: AccountId, bps: u16) -> Result<Self, ConfigError> {
        if recipient.is_zero() {
            return Err(ConfigError::ZeroAccount("fee_recipient"));
        }
        if bps > BPS_DENOMINATOR {
            return Err(ConfigError::FeeTooHigh { bps });
        }
        Ok(Self { recipient, bps })
    }

    #[must_use]
    pub const fn recipient(&self) -> AccountId {
        self.recipient
    }

    #[must_use]
    pub const fn bps(&self) -> u16 {
        self.bps
    }
}

/// Fixed capacity and timing bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Blocks per epoch.
    pub epoch_window: u64,
    /// Blocks a fresh commitment stays locked.
    pub lock_window: u64,
    /// Number of epochs the clock can ever reach, counting epoch 0.
    pub max_epochs: u64,
    pub anchors_per_epoch: u32,
    pub max_links: usize,
    pub pin_batch: usize,
    pub forge_batch: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            epoch_window: 128,
            lock_window: 128,
            max_epochs: 1024,
            anchors_per_epoch: 512,
            max_links: 4096,
            pin_batch: 64,
            forge_batch: 48,
        }
    }
}

impl Limits {
    fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("epoch_window", self.epoch_window == 0),
            ("lock_window", self.lock_window == 0),
            ("max_epochs", self.max_epochs == 0),
            ("anchors_per_epoch", self.anchors_per_epoch == 0),
            ("max_links", self.max_links == 0),
            ("pin_batch", self.pin_batch == 0),
            ("forge_batch", self.forge_batch == 0),
        ];
        match checks.into_iter().find(|(_, zero)| *zero) {
            Some((field, _)) => Err(ConfigError::ZeroLimit(field)),
            None => Ok(()),
        }
    }
}

/// Validated, immutable registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    roles: Roles,
    genesis: BlockHeight,
    fee: Option<FeeSchedule>,
    limits: Limits,
}

impl RegistryConfig {
    pub fn new(
        roles: Roles,
        genesis: BlockHeight,
        fee: Option<FeeSchedule>,
        limits: Limits,
    ) -> Result<Self, ConfigError> {
        limits.validate()?;
        Ok(Self {
            roles,
            genesis,
            fee,
            limits,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw)?;
        file.into_config()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(source) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), source);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        match Self::from_toml_str(&content) {
            Err(ConfigError::Parse(source)) => {
                tracing::warn!("Failed to parse config at {}: {}", path.display(), source);
                Err(ConfigError::ParseFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
            other => other,
        }
    }

    /// Load from [`config_path`].
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = config_path().ok_or(ConfigError::NoPath)?;
        Self::load(&path)
    }

    #[must_use]
    pub const fn roles(&self) -> &Roles {
        &self.roles
    }

    #[must_use]
    pub const fn genesis(&self) -> BlockHeight {
        self.genesis
    }

    #[must_use]
    pub const fn fee(&self) -> Option<&FeeSchedule> {
        self.fee.as_ref()
    }

    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".anchorage").join("config.toml"))
}

/// Replace every `${VAR}` with the variable's value; unset variables become empty.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + len + 1..];
    }

    out.push_str(rest);
    out
}
