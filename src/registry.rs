//! Static ordered catalog of delivery phases.
//!
//! The catalog is an immutable array indexed by ordinal so iteration order
//! is deterministic. There is no mutation and no I/O; unknown keys are a
//! caller programming error surfaced as [`UnknownPhase`].

use thiserror::Error;

use crate::types::{PhaseKey, Role};

/// The role(s) authorized to approve a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproverSpec {
    /// Exactly one role may approve.
    Single(Role),

    /// Any one of the listed roles may approve. This is a single-approval
    /// phase; it does not introduce parallel states.
    AnyOf(&'static [Role]),
}

impl ApproverSpec {
    /// Returns true if the given role is allowed to approve.
    pub fn authorize(&self, role: Role) -> bool {
        match self {
            ApproverSpec::Single(r) => *r == role,
            ApproverSpec::AnyOf(roles) => roles.contains(&role),
        }
    }

    /// Returns the allowed roles, for error messages.
    pub fn roles(&self) -> Vec<Role> {
        match self {
            ApproverSpec::Single(r) => vec![*r],
            ApproverSpec::AnyOf(roles) => roles.to_vec(),
        }
    }
}

/// One entry of the static phase catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub approver: ApproverSpec,
    pub has_entry_criteria: bool,
}

/// The delivery phases, in delivery order.
///
/// `development` and `content_upload` accept either of two roles; every
/// other phase has exactly one approver. `live` is a bookkeeping phase with
/// no entry criteria.
const PHASES: &[PhaseDefinition] = &[
    PhaseDefinition {
        key: "activation",
        name: "Activation",
        approver: ApproverSpec::Single(Role::ProjectManager),
        has_entry_criteria: true,
    },
    PhaseDefinition {
        key: "planning",
        name: "Planning",
        approver: ApproverSpec::Single(Role::ProductOwner),
        has_entry_criteria: true,
    },
    PhaseDefinition {
        key: "design",
        name: "Design",
        approver: ApproverSpec::Single(Role::ProductOwner),
        has_entry_criteria: true,
    },
    PhaseDefinition {
        key: "development",
        name: "Development",
        approver: ApproverSpec::AnyOf(&[Role::Developer, Role::ProjectManager]),
        has_entry_criteria: true,
    },
    PhaseDefinition {
        key: "content_upload",
        name: "Content upload",
        approver: ApproverSpec::AnyOf(&[Role::ContentEditor, Role::ProjectManager]),
        has_entry_criteria: true,
    },
    PhaseDefinition {
        key: "qa_complete",
        name: "QA complete",
        approver: ApproverSpec::Single(Role::Qa),
        has_entry_criteria: true,
    },
    PhaseDefinition {
        key: "launch",
        name: "Launch",
        approver: ApproverSpec::Single(Role::ProductOwner),
        has_entry_criteria: true,
    },
    PhaseDefinition {
        key: "live",
        name: "Live",
        approver: ApproverSpec::Single(Role::ProjectManager),
        has_entry_criteria: false,
    },
];

/// Error returned for phase keys that are not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown phase: {0}")]
pub struct UnknownPhase(pub PhaseKey);

/// Read-only view over the phase catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseRegistry;

impl PhaseRegistry {
    pub fn new() -> Self {
        PhaseRegistry
    }

    /// Looks up a phase definition by key.
    pub fn definition(&self, key: &PhaseKey) -> Result<&'static PhaseDefinition, UnknownPhase> {
        PHASES
            .iter()
            .find(|def| def.key == key.as_str())
            .ok_or_else(|| UnknownPhase(key.clone()))
    }

    /// Returns the ordinal position of a phase (0-based).
    pub fn ordinal(&self, key: &PhaseKey) -> Result<usize, UnknownPhase> {
        PHASES
            .iter()
            .position(|def| def.key == key.as_str())
            .ok_or_else(|| UnknownPhase(key.clone()))
    }

    /// Returns the phase following the given one, or `None` for the last.
    pub fn next_phase(&self, key: &PhaseKey) -> Result<Option<PhaseKey>, UnknownPhase> {
        let ordinal = self.ordinal(key)?;
        Ok(PHASES.get(ordinal + 1).map(|def| PhaseKey::new(def.key)))
    }

    /// Returns whether approval of the phase is gated on entry criteria.
    pub fn requires_entry_criteria(&self, key: &PhaseKey) -> Result<bool, UnknownPhase> {
        Ok(self.definition(key)?.has_entry_criteria)
    }

    /// Returns the approver specification for a phase.
    pub fn approver(&self, key: &PhaseKey) -> Result<ApproverSpec, UnknownPhase> {
        Ok(self.definition(key)?.approver)
    }

    /// Iterates the catalog in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = &'static PhaseDefinition> {
        PHASES.iter()
    }

    /// The first phase of the catalog.
    pub fn first_phase(&self) -> PhaseKey {
        PhaseKey::new(PHASES[0].key)
    }

    /// The number of phases in the catalog.
    pub fn len(&self) -> usize {
        PHASES.len()
    }

    pub fn is_empty(&self) -> bool {
        PHASES.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PhaseKey {
        PhaseKey::new(s)
    }

    #[test]
    fn catalog_keys_are_unique_and_ordered() {
        let registry = PhaseRegistry::new();
        let keys: Vec<&str> = registry.iter().map(|def| def.key).collect();

        let mut deduped = keys.clone();
        deduped.dedup();
        assert_eq!(keys, deduped);

        for (ordinal, def) in registry.iter().enumerate() {
            assert_eq!(registry.ordinal(&key(def.key)).unwrap(), ordinal);
        }
    }

    #[test]
    fn next_phase_walks_the_catalog() {
        let registry = PhaseRegistry::new();

        assert_eq!(
            registry.next_phase(&key("activation")).unwrap(),
            Some(key("planning"))
        );
        assert_eq!(
            registry.next_phase(&key("qa_complete")).unwrap(),
            Some(key("launch"))
        );
        assert_eq!(registry.next_phase(&key("live")).unwrap(), None);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let registry = PhaseRegistry::new();
        let err = registry.ordinal(&key("handover"));
        assert_eq!(err, Err(UnknownPhase(key("handover"))));
    }

    #[test]
    fn planning_is_approved_by_product_owner_only() {
        let registry = PhaseRegistry::new();
        let approver = registry.approver(&key("planning")).unwrap();

        assert!(approver.authorize(Role::ProductOwner));
        assert!(!approver.authorize(Role::Qa));
        assert!(!approver.authorize(Role::ProjectManager));
    }

    #[test]
    fn development_accepts_either_of_two_roles() {
        let registry = PhaseRegistry::new();
        let approver = registry.approver(&key("development")).unwrap();

        assert!(approver.authorize(Role::Developer));
        assert!(approver.authorize(Role::ProjectManager));
        assert!(!approver.authorize(Role::ContentEditor));
    }

    #[test]
    fn content_upload_accepts_either_of_two_roles() {
        let registry = PhaseRegistry::new();
        let approver = registry.approver(&key("content_upload")).unwrap();

        assert!(approver.authorize(Role::ContentEditor));
        assert!(approver.authorize(Role::ProjectManager));
        assert!(!approver.authorize(Role::Developer));
    }

    #[test]
    fn live_has_no_entry_criteria() {
        let registry = PhaseRegistry::new();
        assert!(!registry.requires_entry_criteria(&key("live")).unwrap());
        assert!(registry.requires_entry_criteria(&key("launch")).unwrap());
    }
}
