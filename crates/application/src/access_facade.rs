//! Validating entry points in front of the privilege resolver.
//!
//! Two adapters share one guard: [`TypedAccessor`] addresses classes through
//! Rust types, [`DynamicAccessor`] through schema names. Both check, in order,
//! that the handle is open, that it is used from its owning thread, that the
//! class is named and known, and that an object is present, managed and owned
//! by this store. Only then is the resolver consulted.
//!
//! Permission containers are returned as readers see them: the system
//! `everyone` entry carrying the default template is listed until the server
//! installs an explicit one.

mod dynamic;
mod typed;

use tracing::warn;
use vellum_core::{AppError, AppResult};
use vellum_domain::{
    ClassPermissions, DefaultPolicy, ObjectRef, PermissionList, Privileges, RealmPermissions, Role,
    Scope, ScopeKind,
};

use crate::access_ports::{AccessStore, RoleRepository};
use crate::privilege_resolver::PrivilegeResolver;

pub use dynamic::{DynamicAccessor, DynamicObject};
pub use typed::{RecordType, TypedAccessor, TypedObject};

struct AccessGuard<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> AccessGuard<'a, S>
where
    S: AccessStore + ?Sized,
{
    fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn store_privileges(&self) -> AppResult<Privileges> {
        self.observe("privileges.store", || {
            self.store.ensure_usable()?;
            self.resolve(&Scope::Store)
        })
    }

    fn class_privileges(&self, class_name: Option<&str>) -> AppResult<Privileges> {
        self.observe("privileges.class", || {
            self.store.ensure_usable()?;
            let class_name = self.checked_class(class_name)?;
            self.resolve(&Scope::Class(class_name.to_owned()))
        })
    }

    fn object_privileges(&self, object: Option<&ObjectRef>) -> AppResult<Privileges> {
        self.observe("privileges.object", || {
            self.store.ensure_usable()?;
            let object = self.checked_object(object)?;
            self.resolve(&Scope::Object(object.clone()))
        })
    }

    fn realm_permissions(&self) -> AppResult<RealmPermissions> {
        self.observe("permissions.store", || {
            self.store.ensure_usable()?;
            let mut container = self.store.realm_permissions()?;
            with_system_entry(ScopeKind::Store, container.permissions_mut());
            Ok(container)
        })
    }

    fn class_permissions(&self, class_name: Option<&str>) -> AppResult<ClassPermissions> {
        self.observe("permissions.class", || {
            self.store.ensure_usable()?;
            let class_name = self.checked_class(class_name)?;
            let mut container = match self.store.class_permissions(class_name)? {
                Some(container) => container,
                None => ClassPermissions::new(class_name)?,
            };
            with_system_entry(ScopeKind::Class, container.permissions_mut());
            Ok(container)
        })
    }

    fn resolve(&self, scope: &Scope) -> AppResult<Privileges> {
        PrivilegeResolver::new(self.store).resolve_for(self.store.principal(), scope)
    }

    fn checked_class<'n>(&self, class_name: Option<&'n str>) -> AppResult<&'n str> {
        let class_name = class_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::InvalidArgument("a class name is required".to_owned()))?;

        if !self.store.has_class(class_name)? {
            return Err(AppError::UnknownType(class_name.to_owned()));
        }

        Ok(class_name)
    }

    fn checked_object<'o>(&self, object: Option<&'o ObjectRef>) -> AppResult<&'o ObjectRef> {
        let object = object.ok_or_else(|| {
            AppError::InvalidArgument("an object reference is required".to_owned())
        })?;
        self.checked_class(Some(object.class_name()))?;

        let Some(owner) = object.store_id() else {
            return Err(AppError::UnmanagedObject);
        };
        if owner != self.store.store_id() {
            return Err(AppError::CrossStoreReference);
        }
        if !self.store.contains_object(object)? {
            return Err(AppError::UnmanagedObject);
        }

        Ok(object)
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        call: impl FnOnce() -> AppResult<T>,
    ) -> AppResult<T> {
        call().inspect_err(|error| {
            warn!(
                operation,
                store_id = %self.store.store_id(),
                error = %error,
                "access request rejected"
            );
        })
    }
}

impl<S> AccessGuard<'_, S>
where
    S: AccessStore + RoleRepository + ?Sized,
{
    fn roles(&self) -> AppResult<Vec<Role>> {
        self.observe("roles", || {
            self.store.ensure_usable()?;
            self.store.list_roles()
        })
    }
}

fn with_system_entry(kind: ScopeKind, entries: &mut PermissionList) {
    *entries = DefaultPolicy::visible_entries(kind, entries);
}

#[cfg(test)]
mod tests;
