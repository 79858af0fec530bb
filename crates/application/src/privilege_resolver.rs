use tracing::debug;
use vellum_core::{AppError, AppResult, PrincipalId};
use vellum_domain::{CapabilitySet, DefaultPolicy, PermissionList, Privileges, Scope};

use crate::access_ports::{PermissionRepository, SchemaCatalog};

/// Computes the effective privileges of a principal at a scope.
///
/// Every matching grant is OR-merged, so the most permissive grant wins per
/// flag and container order never matters. The `everyone` role contributes the
/// default template of the scope kind until an explicit `everyone` entry
/// exists at that scope. Nothing is cached between calls.
pub struct PrivilegeResolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> PrivilegeResolver<'a, S>
where
    S: PermissionRepository + SchemaCatalog + ?Sized,
{
    /// Creates a resolver reading from `store`.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolves privileges for a raw principal identifier.
    pub fn resolve(&self, principal: &str, scope: &Scope) -> AppResult<Privileges> {
        let principal = PrincipalId::new(principal)?;
        self.resolve_for(&principal, scope)
    }

    /// Resolves privileges for an already validated principal.
    pub fn resolve_for(&self, principal: &PrincipalId, scope: &Scope) -> AppResult<Privileges> {
        let entries = self.candidate_entries(scope)?;
        let fallback = DefaultPolicy::fallback_for(scope.kind(), &entries);

        let mut merged = fallback.unwrap_or(CapabilitySet::NONE);
        let mut matched = 0_usize;
        for permission in &entries {
            if self.role_includes(permission.role_name(), principal)? {
                merged = merged.union(permission.capabilities());
                matched += 1;
            }
        }

        debug!(
            principal = %principal,
            scope = %scope,
            candidates = entries.len(),
            matched,
            fallback = fallback.is_some(),
            capabilities = ?merged.iter().map(|capability| capability.as_str()).collect::<Vec<_>>(),
            "resolved privileges"
        );

        Ok(Privileges::new(merged))
    }

    fn candidate_entries(&self, scope: &Scope) -> AppResult<PermissionList> {
        match scope {
            Scope::Store => Ok(self.store.realm_permissions()?.permissions().clone()),
            Scope::Class(class_name) => {
                self.ensure_known_class(class_name)?;
                Ok(self
                    .store
                    .class_permissions(class_name)?
                    .map(|container| container.permissions().clone())
                    .unwrap_or_default())
            }
            Scope::Object(object) => {
                self.ensure_known_class(object.class_name())?;
                self.store.object_permissions(object)
            }
        }
    }

    fn ensure_known_class(&self, class_name: &str) -> AppResult<()> {
        if class_name.trim().is_empty() {
            return Err(AppError::InvalidScope(
                "class scope requires a class name".to_owned(),
            ));
        }

        if !self.store.has_class(class_name)? {
            return Err(AppError::InvalidScope(format!(
                "class '{class_name}' is not part of the schema"
            )));
        }

        Ok(())
    }

    fn role_includes(&self, role_name: &str, principal: &PrincipalId) -> AppResult<bool> {
        if DefaultPolicy::is_everyone(role_name) {
            return Ok(true);
        }

        Ok(self
            .store
            .find_role(role_name)?
            .is_some_and(|role| role.has_member(principal)))
    }
}
