use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tracing::{debug, info};
use vellum_application::{
    DynamicAccessor, DynamicObject, PermissionRepository, RecordType, RoleRepository, RoleService,
    SchemaCatalog, StoreContext, TypedAccessor, TypedObject,
};
use vellum_core::{AppError, AppResult, PrincipalId, StoreId};
use vellum_domain::{
    CapabilitySet, ClassPermissions, ObjectKey, ObjectRef, Permission, PermissionList,
    RealmPermissions, Role,
};

use crate::in_memory_store::{SharedStore, StoreState};

/// A principal's connection to an [`InMemoryStore`](crate::InMemoryStore).
///
/// The handle may only be used from the thread that opened it. It holds at
/// most one write transaction, a private copy of the store state that reads
/// on this handle observe and other handles do not see until [`commit`].
/// Only one handle of a store can hold a write transaction at a time.
///
/// [`commit`]: StoreHandle::commit
#[derive(Debug)]
pub struct StoreHandle {
    store_id: StoreId,
    principal: PrincipalId,
    owner: ThreadId,
    closed: AtomicBool,
    shared: Arc<SharedStore>,
    pending: Mutex<Option<StoreState>>,
}

impl StoreHandle {
    pub(crate) fn new(
        store_id: StoreId,
        principal: PrincipalId,
        shared: Arc<SharedStore>,
    ) -> Self {
        Self {
            store_id,
            principal,
            owner: thread::current().id(),
            closed: AtomicBool::new(false),
            shared,
            pending: Mutex::new(None),
        }
    }

    /// Privilege accessors addressing classes through Rust types.
    #[must_use]
    pub fn typed(&self) -> TypedAccessor<'_, Self> {
        TypedAccessor::new(self)
    }

    /// Privilege accessors addressing classes by schema name.
    #[must_use]
    pub fn dynamic(&self) -> DynamicAccessor<'_, Self> {
        DynamicAccessor::new(self)
    }

    /// Role administration bound to this handle.
    #[must_use]
    pub fn roles(&self) -> RoleService<'_, Self> {
        RoleService::new(self)
    }

    /// Starts a write transaction on a copy of the committed state.
    pub fn begin_write(&self) -> AppResult<()> {
        self.ensure_usable()?;
        let mut pending = self.pending()?;
        if pending.is_some() {
            return Err(AppError::Conflict(
                "a write transaction is already active on this handle".to_owned(),
            ));
        }

        if !self.shared.try_acquire_writer() {
            return Err(AppError::Conflict(
                "another handle holds the write transaction".to_owned(),
            ));
        }

        match self.committed_snapshot() {
            Ok(state) => *pending = Some(state),
            Err(error) => {
                self.shared.release_writer();
                return Err(error);
            }
        }

        debug!(
            store_id = %self.store_id,
            principal = %self.principal,
            "write transaction started"
        );
        Ok(())
    }

    /// Publishes the pending state to every handle of the store.
    pub fn commit(&self) -> AppResult<()> {
        self.ensure_usable()?;
        let mut pending = self.pending()?;
        let state = pending.take().ok_or(AppError::NotInTransaction)?;

        let published = self
            .shared
            .state
            .write()
            .map(|mut committed| *committed = state)
            .map_err(|error| AppError::Internal(format!("store state lock poisoned: {error}")));
        self.shared.release_writer();
        published?;

        info!(
            store_id = %self.store_id,
            principal = %self.principal,
            "write transaction committed"
        );
        Ok(())
    }

    /// Discards the pending state.
    pub fn cancel(&self) -> AppResult<()> {
        self.ensure_usable()?;
        self.pending()?.take().ok_or(AppError::NotInTransaction)?;
        self.shared.release_writer();

        debug!(
            store_id = %self.store_id,
            principal = %self.principal,
            "write transaction cancelled"
        );
        Ok(())
    }

    /// Closes the handle. A pending transaction is discarded.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let discarded = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if discarded {
            self.shared.release_writer();
        }
        info!(
            store_id = %self.store_id,
            principal = %self.principal,
            discarded_transaction = discarded,
            "store handle closed"
        );
    }

    /// Persists a new record of `class_name`.
    pub fn create_object(&self, class_name: &str) -> AppResult<ObjectRef> {
        let store_id = self.store_id;
        self.write(|state| {
            if !state.classes.contains_key(class_name) {
                return Err(AppError::UnknownType(class_name.to_owned()));
            }

            let key = ObjectKey::from(state.next_key);
            state.next_key += 1;
            state
                .objects
                .insert((class_name.to_owned(), key), PermissionList::new());
            Ok(ObjectRef::managed(store_id, class_name, key))
        })
    }

    /// Persists a new record of the class of `T`.
    pub fn create_typed<T: RecordType>(&self) -> AppResult<TypedObject<T>> {
        TypedObject::from_ref(self.create_object(T::CLASS_NAME)?)
    }

    /// Persists a new record and returns its schema-less reference.
    pub fn create_dynamic(&self, class_name: &str) -> AppResult<DynamicObject> {
        Ok(DynamicObject::from_ref(self.create_object(class_name)?))
    }

    /// Deletes a record together with its grants. Returns whether it existed.
    pub fn delete_object(&self, object: &ObjectRef) -> AppResult<bool> {
        self.ensure_owned(object)?;
        self.write(|state| {
            Ok(state
                .objects
                .remove(&(object.class_name().to_owned(), object.key()))
                .is_some())
        })
    }

    /// Installs a store-wide grant for `role_name`.
    pub fn grant_store(&self, role_name: &str, capabilities: CapabilitySet) -> AppResult<()> {
        let permission = Permission::new(role_name, capabilities)?;
        self.write(|state| {
            state.role_entry(role_name)?;
            state.realm.permissions_mut().grant(permission);
            Ok(())
        })?;

        debug!(store_id = %self.store_id, role = %role_name, "store grant installed");
        Ok(())
    }

    /// Installs a grant for `role_name` on the class `class_name`.
    pub fn grant_class(
        &self,
        class_name: &str,
        role_name: &str,
        capabilities: CapabilitySet,
    ) -> AppResult<()> {
        let permission = Permission::new(role_name, capabilities)?;
        self.write(|state| {
            if !state.classes.contains_key(class_name) {
                return Err(AppError::UnknownType(class_name.to_owned()));
            }
            state.role_entry(role_name)?;

            let container = state
                .classes
                .get_mut(class_name)
                .ok_or_else(|| AppError::UnknownType(class_name.to_owned()))?;
            container.permissions_mut().grant(permission);
            Ok(())
        })?;

        debug!(
            store_id = %self.store_id,
            class = %class_name,
            role = %role_name,
            "class grant installed"
        );
        Ok(())
    }

    /// Installs a grant for `role_name` on one record.
    pub fn grant_object(
        &self,
        object: &ObjectRef,
        role_name: &str,
        capabilities: CapabilitySet,
    ) -> AppResult<()> {
        self.ensure_owned(object)?;
        let permission = Permission::new(role_name, capabilities)?;
        self.write(|state| {
            let key = (object.class_name().to_owned(), object.key());
            if !state.objects.contains_key(&key) {
                return Err(AppError::UnmanagedObject);
            }
            state.role_entry(role_name)?;

            let entries = state
                .objects
                .get_mut(&key)
                .ok_or(AppError::UnmanagedObject)?;
            entries.grant(permission);
            Ok(())
        })?;

        debug!(
            store_id = %self.store_id,
            object = %object,
            role = %role_name,
            "object grant installed"
        );
        Ok(())
    }

    fn ensure_owned(&self, object: &ObjectRef) -> AppResult<()> {
        match object.store_id() {
            None => Err(AppError::UnmanagedObject),
            Some(owner) if owner != self.store_id => Err(AppError::CrossStoreReference),
            Some(_) => Ok(()),
        }
    }

    fn pending(&self) -> AppResult<MutexGuard<'_, Option<StoreState>>> {
        self.pending
            .lock()
            .map_err(|error| AppError::Internal(format!("transaction lock poisoned: {error}")))
    }

    fn committed_snapshot(&self) -> AppResult<StoreState> {
        self.shared
            .state
            .read()
            .map(|state| state.clone())
            .map_err(|error| AppError::Internal(format!("store state lock poisoned: {error}")))
    }

    fn read<T>(&self, view: impl FnOnce(&StoreState) -> T) -> AppResult<T> {
        let pending = self.pending()?;
        if let Some(state) = pending.as_ref() {
            return Ok(view(state));
        }

        let committed = self
            .shared
            .state
            .read()
            .map_err(|error| AppError::Internal(format!("store state lock poisoned: {error}")))?;
        Ok(view(&committed))
    }

    fn write<T>(&self, change: impl FnOnce(&mut StoreState) -> AppResult<T>) -> AppResult<T> {
        self.ensure_usable()?;
        let mut pending = self.pending()?;
        let state = pending.as_mut().ok_or(AppError::NotInTransaction)?;
        change(state)
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if pending.take().is_some() {
            self.shared.release_writer();
        }
    }
}

impl StoreContext for StoreHandle {
    fn store_id(&self) -> StoreId {
        self.store_id
    }

    fn principal(&self) -> &PrincipalId {
        &self.principal
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn owner_thread(&self) -> ThreadId {
        self.owner
    }

    fn is_in_write_transaction(&self) -> bool {
        self.pending().is_ok_and(|pending| pending.is_some())
    }

    fn contains_object(&self, object: &ObjectRef) -> AppResult<bool> {
        if object.store_id() != Some(self.store_id) {
            return Ok(false);
        }

        self.read(|state| {
            state
                .objects
                .contains_key(&(object.class_name().to_owned(), object.key()))
        })
    }
}

impl SchemaCatalog for StoreHandle {
    fn has_class(&self, class_name: &str) -> AppResult<bool> {
        self.read(|state| state.classes.contains_key(class_name))
    }

    fn class_names(&self) -> AppResult<Vec<String>> {
        self.read(|state| state.classes.keys().cloned().collect())
    }
}

impl PermissionRepository for StoreHandle {
    fn realm_permissions(&self) -> AppResult<RealmPermissions> {
        self.read(|state| state.realm.clone())
    }

    fn class_permissions(&self, class_name: &str) -> AppResult<Option<ClassPermissions>> {
        self.read(|state| state.classes.get(class_name).cloned())
    }

    fn object_permissions(&self, object: &ObjectRef) -> AppResult<PermissionList> {
        self.read(|state| {
            state
                .objects
                .get(&(object.class_name().to_owned(), object.key()))
                .cloned()
                .unwrap_or_default()
        })
    }

    fn find_role(&self, role_name: &str) -> AppResult<Option<Role>> {
        self.read(|state| state.roles.get(role_name).cloned())
    }
}

impl RoleRepository for StoreHandle {
    fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.read(|state| state.roles.values().cloned().collect())
    }

    fn create_role(&self, role_name: &str) -> AppResult<Role> {
        let role = Role::new(role_name)?;
        self.write(|state| {
            if state.roles.contains_key(role_name) {
                return Err(AppError::Conflict(format!(
                    "role '{role_name}' already exists"
                )));
            }

            state.roles.insert(role_name.to_owned(), role.clone());
            Ok(role)
        })
    }

    fn ensure_principal(&self, principal: &PrincipalId) -> AppResult<()> {
        self.write(|state| {
            state.principals.insert(principal.clone());
            Ok(())
        })
    }

    fn insert_member(&self, role_name: &str, principal: PrincipalId) -> AppResult<bool> {
        self.write(|state| {
            state
                .roles
                .get_mut(role_name)
                .map(|role| role.insert_member(principal))
                .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))
        })
    }

    fn remove_member(&self, role_name: &str, principal: &PrincipalId) -> AppResult<bool> {
        self.write(|state| {
            state
                .roles
                .get_mut(role_name)
                .map(|role| role.remove_member(principal))
                .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))
        })
    }
}
