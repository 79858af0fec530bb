use tracing::info;
use vellum_core::{AppError, AppResult, PrincipalId};
use vellum_domain::Role;

use crate::access_ports::{PermissionRepository, RoleRepository, StoreContext};

/// Role membership administration on one store handle.
///
/// Reads are allowed at any time on the owning thread. Mutations additionally
/// require the caller to have opened a write transaction; the service never
/// opens one itself.
pub struct RoleService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> RoleService<'a, S>
where
    S: StoreContext + PermissionRepository + RoleRepository + ?Sized,
{
    /// Creates a service bound to `store`.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Lists every role, including the system `everyone` role.
    pub fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.store.ensure_usable()?;
        self.store.list_roles()
    }

    /// Returns the role named `role_name`.
    pub fn find_role(&self, role_name: &str) -> AppResult<Role> {
        self.store.ensure_usable()?;
        self.existing_role(role_name)
    }

    /// Creates an empty role.
    pub fn create_role(&self, role_name: &str) -> AppResult<Role> {
        self.require_write_transaction()?;

        let role = self.store.create_role(role_name)?;
        info!(role = %role.name(), "role created");
        Ok(role)
    }

    /// Adds `principal` to the role. Adding an existing member is a no-op.
    pub fn add_member(&self, role_name: &str, principal: &str) -> AppResult<()> {
        self.require_write_transaction()?;
        let principal = PrincipalId::new(principal)?;
        self.existing_role(role_name)?;

        self.store.ensure_principal(&principal)?;
        if self.store.insert_member(role_name, principal.clone())? {
            info!(role = %role_name, principal = %principal, "role member added");
        }

        Ok(())
    }

    /// Removes `principal` from the role. Returns whether it was a member.
    pub fn remove_member(&self, role_name: &str, principal: &str) -> AppResult<bool> {
        self.require_write_transaction()?;
        let principal = PrincipalId::new(principal)?;
        self.existing_role(role_name)?;

        let removed = self.store.remove_member(role_name, &principal)?;
        if removed {
            info!(role = %role_name, principal = %principal, "role member removed");
        }

        Ok(removed)
    }

    /// Returns whether `principal` belongs to the role.
    pub fn has_member(&self, role_name: &str, principal: &str) -> AppResult<bool> {
        self.store.ensure_usable()?;
        let principal = PrincipalId::new(principal)?;

        Ok(self.existing_role(role_name)?.has_member(&principal))
    }

    fn existing_role(&self, role_name: &str) -> AppResult<Role> {
        self.store
            .find_role(role_name)?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))
    }

    fn require_write_transaction(&self) -> AppResult<()> {
        self.store.ensure_usable()?;
        if !self.store.is_in_write_transaction() {
            return Err(AppError::NotInTransaction);
        }

        Ok(())
    }
}
