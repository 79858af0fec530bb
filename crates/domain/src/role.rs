use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use vellum_core::{AppResult, NonEmptyString, PrincipalId};

use crate::policy::DefaultPolicy;

/// A named group of principals; the unit that grants are issued to.
///
/// The name is the role's identity and is fixed at construction. Members are
/// kept in a sorted set so point lookups do not scan the membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    name: String,
    members: BTreeSet<PrincipalId>,
}

impl Role {
    /// Creates an empty role with a validated name.
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?.into(),
            members: BTreeSet::new(),
        })
    }

    /// Creates the system role that every principal belongs to.
    #[must_use]
    pub fn everyone() -> Self {
        Self {
            name: DefaultPolicy::EVERYONE_ROLE.to_owned(),
            members: BTreeSet::new(),
        }
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns whether this is the system `everyone` role.
    #[must_use]
    pub fn is_everyone(&self) -> bool {
        DefaultPolicy::is_everyone(self.name())
    }

    /// Returns the explicitly recorded members in identifier order.
    pub fn members(&self) -> impl Iterator<Item = &PrincipalId> {
        self.members.iter()
    }

    /// Returns the number of explicitly recorded members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Returns whether `principal` belongs to this role.
    #[must_use]
    pub fn has_member(&self, principal: &PrincipalId) -> bool {
        self.is_everyone() || self.members.contains(principal)
    }

    /// Records `principal` as a member. Returns `false` when already present.
    pub fn insert_member(&mut self, principal: PrincipalId) -> bool {
        self.members.insert(principal)
    }

    /// Drops `principal` from the members. Returns `false` when absent.
    pub fn remove_member(&mut self, principal: &PrincipalId) -> bool {
        self.members.remove(principal)
    }
}
