use std::fmt;

use serde::{Deserialize, Serialize};

/// The three capability holders. Each is a single account fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Anchor lifecycle, pause switch, treasury withdrawal and fee sweep.
    Curator,
    /// Link creation.
    Linker,
    /// Epoch advance and recall-hash attachment.
    Timekeeper,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Curator, Role::Linker, Role::Timekeeper];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Curator => "curator",
            Role::Linker => "linker",
            Role::Timekeeper => "timekeeper",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
