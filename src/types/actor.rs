//! Actor identity and roles.
//!
//! The core never authenticates; it receives an already-resolved identity
//! plus role from the caller and only authorizes against the phase catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A role recognized by the phase catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ProjectManager,
    ProductOwner,
    Developer,
    ContentEditor,
    Qa,
}

impl Role {
    /// Returns the wire name of the role (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ProjectManager => "project_manager",
            Role::ProductOwner => "product_owner",
            Role::Developer => "developer",
            Role::ContentEditor => "content_editor",
            Role::Qa => "qa",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a role string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project_manager" => Ok(Role::ProjectManager),
            "product_owner" => Ok(Role::ProductOwner),
            "developer" => Ok(Role::Developer),
            "content_editor" => Ok(Role::ContentEditor),
            "qa" => Ok(Role::Qa),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The identity performing an operation, as reported by the external
/// identity/session service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Opaque identity string (email or account id).
    pub id: String,

    /// The actor's resolved role.
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_from_str_roundtrips_all_variants() {
        for role in [
            Role::ProjectManager,
            Role::ProductOwner,
            Role::Developer,
            Role::ContentEditor,
            Role::Qa,
        ] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "intern".parse::<Role>();
        assert_eq!(err, Err(UnknownRole("intern".to_string())));
    }

    #[test]
    fn role_serde_matches_as_str() {
        let json = serde_json::to_string(&Role::ContentEditor).unwrap();
        assert_eq!(json, "\"content_editor\"");
    }
}
