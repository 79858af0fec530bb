use std::thread::{self, ThreadId};

use vellum_core::{AppError, AppResult, PrincipalId, StoreId};
use vellum_domain::{ClassPermissions, ObjectRef, PermissionList, RealmPermissions, Role};

/// Port exposing the lifecycle and transaction state of one store handle.
pub trait StoreContext {
    /// Identity of the store the handle is attached to.
    fn store_id(&self) -> StoreId;

    /// Principal the handle was opened for.
    fn principal(&self) -> &PrincipalId;

    /// Whether the handle has been closed.
    fn is_closed(&self) -> bool;

    /// Thread that opened the handle and is allowed to use it.
    fn owner_thread(&self) -> ThreadId;

    /// Whether a write transaction is active on the handle.
    fn is_in_write_transaction(&self) -> bool;

    /// Whether `object` is currently persisted in this store.
    fn contains_object(&self, object: &ObjectRef) -> AppResult<bool>;

    /// Fails unless the handle is open and used from its owning thread.
    fn ensure_usable(&self) -> AppResult<()> {
        if self.is_closed() {
            return Err(AppError::StoreClosed);
        }

        if thread::current().id() != self.owner_thread() {
            return Err(AppError::WrongContext);
        }

        Ok(())
    }
}

/// Port for schema lookups.
pub trait SchemaCatalog {
    /// Whether `class_name` is part of the schema.
    fn has_class(&self, class_name: &str) -> AppResult<bool>;

    /// Lists the schema classes in name order.
    fn class_names(&self) -> AppResult<Vec<String>>;
}

/// Read port for grants and roles.
pub trait PermissionRepository {
    /// Returns the store-wide grant container.
    fn realm_permissions(&self) -> AppResult<RealmPermissions>;

    /// Returns the grant container of `class_name`, if the class has one.
    fn class_permissions(&self, class_name: &str) -> AppResult<Option<ClassPermissions>>;

    /// Returns the grants attached to one record.
    fn object_permissions(&self, object: &ObjectRef) -> AppResult<PermissionList>;

    /// Finds a role by name.
    fn find_role(&self, role_name: &str) -> AppResult<Option<Role>>;
}

/// Write port for roles and principal records.
///
/// Implementations fail with [`AppError::NotInTransaction`] when no write
/// transaction is active.
pub trait RoleRepository {
    /// Lists all roles in name order.
    fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Creates an empty role.
    fn create_role(&self, role_name: &str) -> AppResult<Role>;

    /// Returns the principal record, creating it when missing.
    fn ensure_principal(&self, principal: &PrincipalId) -> AppResult<()>;

    /// Adds `principal` to a role. Returns `false` when it was already a member.
    fn insert_member(&self, role_name: &str, principal: PrincipalId) -> AppResult<bool>;

    /// Drops `principal` from a role. Returns `false` when it was not a member.
    fn remove_member(&self, role_name: &str, principal: &PrincipalId) -> AppResult<bool>;
}

/// Everything the access façade reads from a store handle.
pub trait AccessStore: StoreContext + SchemaCatalog + PermissionRepository {}

impl<T> AccessStore for T where T: StoreContext + SchemaCatalog + PermissionRepository + ?Sized {}
