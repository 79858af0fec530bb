use vellum_core::AppResult;
use vellum_domain::{ClassPermissions, ObjectRef, Privileges, RealmPermissions, Role};

use crate::access_ports::{AccessStore, RoleRepository};

use super::AccessGuard;

/// Record reference addressed by schema name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicObject {
    object: ObjectRef,
}

impl DynamicObject {
    /// Wraps a reference.
    #[must_use]
    pub fn from_ref(object: ObjectRef) -> Self {
        Self { object }
    }

    /// Returns the schema class of the record.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.object.class_name()
    }

    /// Returns the underlying reference.
    #[must_use]
    pub fn object_ref(&self) -> &ObjectRef {
        &self.object
    }
}

/// Privilege entry points addressing classes by schema name.
///
/// Arguments may be absent, as schema-less callers routinely pass values they
/// have not checked; absence is reported as an invalid argument.
pub struct DynamicAccessor<'a, S: ?Sized> {
    guard: AccessGuard<'a, S>,
}

impl<'a, S> DynamicAccessor<'a, S>
where
    S: AccessStore + ?Sized,
{
    /// Creates the dynamic surface over `store`.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self {
            guard: AccessGuard::new(store),
        }
    }

    /// Privileges of the handle's principal on the whole store.
    pub fn privileges(&self) -> AppResult<Privileges> {
        self.guard.store_privileges()
    }

    /// Privileges of the handle's principal on the class `class_name`.
    pub fn class_privileges(&self, class_name: Option<&str>) -> AppResult<Privileges> {
        self.guard.class_privileges(class_name)
    }

    /// Privileges of the handle's principal on one record.
    pub fn object_privileges(&self, object: Option<&DynamicObject>) -> AppResult<Privileges> {
        self.guard.object_privileges(object.map(DynamicObject::object_ref))
    }

    /// Store-wide grant container.
    pub fn permissions(&self) -> AppResult<RealmPermissions> {
        self.guard.realm_permissions()
    }

    /// Grant container of the class `class_name`.
    pub fn class_permissions(&self, class_name: Option<&str>) -> AppResult<ClassPermissions> {
        self.guard.class_permissions(class_name)
    }
}

impl<S> DynamicAccessor<'_, S>
where
    S: AccessStore + RoleRepository + ?Sized,
{
    /// All roles defined in the store.
    pub fn roles(&self) -> AppResult<Vec<Role>> {
        self.guard.roles()
    }
}
