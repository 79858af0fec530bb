//! Fallback grants used until the server has issued explicit ones.
//!
//! A freshly created store has no grants at all. The implicit `everyone` role
//! contributes a template per scope kind until the server installs an explicit
//! `everyone` entry for that scope.

use crate::capability::{Capability, CapabilitySet};
use crate::permission::Permission;
use crate::role::Role;
use crate::scope::{PermissionList, ScopeKind};

/// Default policy provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl DefaultPolicy {
    /// Name of the system role every principal belongs to.
    pub const EVERYONE_ROLE: &'static str = "everyone";

    /// Template for the whole store: everything allowed.
    pub const STORE_TEMPLATE: CapabilitySet = CapabilitySet::ALL;

    /// Template for classes and records: creating and deleting records need an
    /// explicit grant, everything else is open.
    pub const RECORD_TEMPLATE: CapabilitySet = CapabilitySet::ALL
        .without(Capability::Create)
        .without(Capability::Delete);

    /// Returns the template for `kind`.
    #[must_use]
    pub fn template(kind: ScopeKind) -> CapabilitySet {
        match kind {
            ScopeKind::Store => Self::STORE_TEMPLATE,
            ScopeKind::Class | ScopeKind::Object => Self::RECORD_TEMPLATE,
        }
    }

    /// Returns whether `role_name` designates the `everyone` role.
    #[must_use]
    pub fn is_everyone(role_name: &str) -> bool {
        role_name == Self::EVERYONE_ROLE
    }

    /// Returns the template the `everyone` role contributes at a scope, or
    /// `None` once an explicit `everyone` entry exists there.
    #[must_use]
    pub fn fallback_for(kind: ScopeKind, entries: &PermissionList) -> Option<CapabilitySet> {
        entries
            .entry_for(Self::EVERYONE_ROLE)
            .is_none()
            .then(|| Self::template(kind))
    }

    /// Returns `entries` as a reader sees them: the system `everyone` entry
    /// carrying the template comes first unless an explicit one exists.
    #[must_use]
    pub fn visible_entries(kind: ScopeKind, entries: &PermissionList) -> PermissionList {
        match Self::fallback_for(kind, entries) {
            Some(template) => std::iter::once(Permission::for_role(&Role::everyone(), template))
                .chain(entries.iter().cloned())
                .collect(),
            None => entries.clone(),
        }
    }

    /// Returns whether `capability` is open by default at `kind`.
    #[must_use]
    pub fn allows_by_default(kind: ScopeKind, capability: Capability) -> bool {
        Self::template(kind).allows(capability)
    }
}
