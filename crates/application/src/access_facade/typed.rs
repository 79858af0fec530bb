use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use vellum_core::{AppError, AppResult};
use vellum_domain::{ClassPermissions, ObjectKey, ObjectRef, Privileges, RealmPermissions, Role};

use crate::access_ports::{AccessStore, RoleRepository};

use super::AccessGuard;

/// A Rust type persisted as a schema class.
pub trait RecordType {
    /// Schema name of the class.
    const CLASS_NAME: &'static str;
}

/// Record reference tagged with its Rust type.
pub struct TypedObject<T> {
    object: ObjectRef,
    marker: PhantomData<fn() -> T>,
}

impl<T: RecordType> TypedObject<T> {
    /// Wraps a reference whose class matches `T`.
    pub fn from_ref(object: ObjectRef) -> AppResult<Self> {
        if object.class_name() != T::CLASS_NAME {
            return Err(AppError::InvalidArgument(format!(
                "object of class '{}' cannot be viewed as '{}'",
                object.class_name(),
                T::CLASS_NAME
            )));
        }

        Ok(Self {
            object,
            marker: PhantomData,
        })
    }

    /// Creates a standalone instance not attached to any store.
    #[must_use]
    pub fn unmanaged(key: impl Into<ObjectKey>) -> Self {
        Self {
            object: ObjectRef::unmanaged(T::CLASS_NAME, key.into()),
            marker: PhantomData,
        }
    }

    /// Returns the untyped reference.
    #[must_use]
    pub fn object_ref(&self) -> &ObjectRef {
        &self.object
    }
}

impl<T> Clone for TypedObject<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            marker: PhantomData,
        }
    }
}

impl<T> Debug for TypedObject<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_tuple("TypedObject")
            .field(&self.object)
            .finish()
    }
}

/// Privilege entry points addressing classes through Rust types.
pub struct TypedAccessor<'a, S: ?Sized> {
    guard: AccessGuard<'a, S>,
}

impl<'a, S> TypedAccessor<'a, S>
where
    S: AccessStore + ?Sized,
{
    /// Creates the typed surface over `store`.
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

    /// Privileges of the handle's principal on the class of `T`.
    pub fn class_privileges<T: RecordType>(&self) -> AppResult<Privileges> {
        self.guard.class_privileges(Some(T::CLASS_NAME))
    }

    /// Privileges of the handle's principal on one record.
    pub fn object_privileges<T: RecordType>(
        &self,
        object: &TypedObject<T>,
    ) -> AppResult<Privileges> {
        self.guard.object_privileges(Some(object.object_ref()))
    }

    /// Store-wide grant container.
    pub fn permissions(&self) -> AppResult<RealmPermissions> {
        self.guard.realm_permissions()
    }

    /// Grant container of the class of `T`.
    pub fn class_permissions<T: RecordType>(&self) -> AppResult<ClassPermissions> {
        self.guard.class_permissions(Some(T::CLASS_NAME))
    }
}

impl<S> TypedAccessor<'_, S>
where
    S: AccessStore + RoleRepository + ?Sized,
{
    /// All roles defined in the store.
    pub fn roles(&self) -> AppResult<Vec<Role>> {
        self.guard.roles()
    }
}
