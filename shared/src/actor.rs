//! Actor identity attached to every mutating command
//!
//! Authentication itself is external; the engine only consumes the
//! resolved identity and checks it against the access policy.

use serde::{Deserialize, Serialize};

/// Role of the actor issuing a command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    /// Procurement officer: manages orders, verification, and payments
    Officer,
    /// Farm operator: acts only on assignments belonging to their farm
    FarmOperator { farm_id: String },
    /// Internal system actor (scheduled jobs, migrations)
    System,
}

/// Resolved caller identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub role: ActorRole,
}

impl Actor {
    pub fn officer(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: ActorRole::Officer,
        }
    }

    pub fn farm_operator(
        id: impl Into<String>,
        name: impl Into<String>,
        farm_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: ActorRole::FarmOperator {
                farm_id: farm_id.into(),
            },
        }
    }

    pub fn system() -> Self {
        Self {
            id: "system".to_string(),
            name: "System".to_string(),
            role: ActorRole::System,
        }
    }

    /// Farm this actor operates, if any
    pub fn farm_id(&self) -> Option<&str> {
        match &self.role {
            ActorRole::FarmOperator { farm_id } => Some(farm_id),
            _ => None,
        }
    }
}
