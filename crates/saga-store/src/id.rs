//! Saga run identifiers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary key of a saga run, assigned at construction.
///
/// Serializes as the plain hyphenated UUID so the `saga_states` table and
/// the JSON payload carry the same representation. Ordering follows the
/// underlying UUID bytes, which keeps operational listings stable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SagaId(Uuid);

impl SagaId {
    /// Assigns a fresh random identifier for a new saga run.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an identifier that already exists, e.g. one read back from the
    /// `saga_states` table.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Compact eight-character form for log lines and metrics labels where
    /// the full UUID would drown the message.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SagaId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SagaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses the hyphenated form, as printed by `Display` and stored in the
/// database. Lets operator tooling address a failed saga by the id taken
/// from a log line or an operational query.
impl FromStr for SagaId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
