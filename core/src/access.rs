//! Role gate, pause switch and the in-flight transfer guard.

use std::mem;

use serde::{Deserialize, Serialize};

use anchorage_config::Roles;
use anchorage_types::{AccountId, RegistryError, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessController {
    roles: Roles,
    paused: bool,
    /// Set only for the duration of an outbound value transfer.
    #[serde(skip)]
    transfer_in_flight: bool,
}

impl AccessController {
    #[must_use]
    pub const fn new(roles: Roles) -> Self {
        Self {
            roles,
            paused: false,
            transfer_in_flight: false,
        }
    }

    #[must_use]
    pub const fn roles(&self) -> &Roles {
        &self.roles
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub const fn transfer_in_flight(&self) -> bool {
        self.transfer_in_flight
    }

    /// First check of every mutating call.
    pub fn ensure_idle(&self) -> Result<(), RegistryError> {
        if self.transfer_in_flight {
            tracing::warn!("Rejected re-entrant call during value transfer");
            return Err(RegistryError::Reentrant);
        }
        Ok(())
    }

    pub fn require(&self, caller: &AccountId, role: Role) -> Result<(), RegistryError> {
        if self.roles.holds(caller, role) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                caller: *caller,
                required: role,
            })
        }
    }

    pub fn ensure_active(&self) -> Result<(), RegistryError> {
        if self.paused {
            Err(RegistryError::Paused)
        } else {
            Ok(())
        }
    }

    /// Returns the previous value.
    pub(crate) fn set_paused(&mut self, paused: bool) -> bool {
        mem::replace(&mut self.paused, paused)
    }

    pub(crate) fn begin_transfer(&mut self) {
        self.transfer_in_flight = true;
    }

    pub(crate) fn end_transfer(&mut self) {
        self.transfer_in_flight = false;
    }
}
