use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use vellum_core::{AppError, AppResult, PrincipalId, StoreId};
use vellum_domain::{
    Capability, CapabilitySet, ClassPermissions, ObjectKey, ObjectRef, Permission, PermissionList,
    RealmPermissions, Role,
};

use crate::access_ports::{PermissionRepository, RoleRepository, SchemaCatalog, StoreContext};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn principal(value: &str) -> PrincipalId {
    PrincipalId::new(value).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn grant(role: &str, capabilities: &[Capability]) -> Permission {
    Permission::new(role, CapabilitySet::of(capabilities)).unwrap_or_else(|_| unreachable!())
}

/// Single-handle store double that keeps everything in memory and lets tests
/// flip lifecycle flags directly.
pub(crate) struct FakeStore {
    store_id: StoreId,
    principal: PrincipalId,
    owner: ThreadId,
    closed: AtomicBool,
    in_write: AtomicBool,
    classes: BTreeSet<String>,
    realm: Mutex<RealmPermissions>,
    class_permissions: Mutex<BTreeMap<String, ClassPermissions>>,
    objects: Mutex<BTreeMap<(String, ObjectKey), PermissionList>>,
    roles: Mutex<BTreeMap<String, Role>>,
    principals: Mutex<BTreeSet<PrincipalId>>,
}

impl FakeStore {
    pub(crate) fn new(principal_id: &str, classes: &[&str]) -> Self {
        let class_permissions = classes
            .iter()
            .map(|name| {
                (
                    (*name).to_owned(),
                    ClassPermissions::new(*name).unwrap_or_else(|_| unreachable!()),
                )
            })
            .collect();

        Self {
            store_id: StoreId::new(),
            principal: principal(principal_id),
            owner: thread::current().id(),
            closed: AtomicBool::new(false),
            in_write: AtomicBool::new(false),
            classes: classes.iter().map(|name| (*name).to_owned()).collect(),
            realm: Mutex::new(RealmPermissions::new()),
            class_permissions: Mutex::new(class_permissions),
            objects: Mutex::new(BTreeMap::new()),
            roles: Mutex::new(BTreeMap::from([(
                Role::everyone().name().to_owned(),
                Role::everyone(),
            )])),
            principals: Mutex::new(BTreeSet::new()),
        }
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn set_in_write(&self, value: bool) {
        self.in_write.store(value, Ordering::SeqCst);
    }

    pub(crate) fn with_role(self, name: &str, members: &[&str]) -> Self {
        let mut role = Role::new(name).unwrap_or_else(|_| unreachable!());
        for member in members {
            role.insert_member(principal(member));
        }
        lock(&self.roles).insert(name.to_owned(), role);
        self
    }

    pub(crate) fn grant_store(&self, permission: Permission) {
        lock(&self.realm).permissions_mut().grant(permission);
    }

    pub(crate) fn grant_class(&self, class_name: &str, permission: Permission) {
        if let Some(container) = lock(&self.class_permissions).get_mut(class_name) {
            container.permissions_mut().grant(permission);
        }
    }

    pub(crate) fn grant_object(&self, object: &ObjectRef, permission: Permission) {
        lock(&self.objects)
            .entry((object.class_name().to_owned(), object.key()))
            .or_default()
            .grant(permission);
    }

    pub(crate) fn add_object(&self, class_name: &str, key: u64) -> ObjectRef {
        let key = ObjectKey::from(key);
        lock(&self.objects).insert((class_name.to_owned(), key), PermissionList::new());
        ObjectRef::managed(self.store_id, class_name, key)
    }

    pub(crate) fn remove_object(&self, object: &ObjectRef) {
        lock(&self.objects).remove(&(object.class_name().to_owned(), object.key()));
    }

    pub(crate) fn principal_count(&self) -> usize {
        lock(&self.principals).len()
    }

    fn require_write(&self) -> AppResult<()> {
        if self.in_write.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::NotInTransaction)
        }
    }
}

impl StoreContext for FakeStore {
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
        self.in_write.load(Ordering::SeqCst)
    }

    fn contains_object(&self, object: &ObjectRef) -> AppResult<bool> {
        Ok(lock(&self.objects).contains_key(&(object.class_name().to_owned(), object.key())))
    }
}

impl SchemaCatalog for FakeStore {
    fn has_class(&self, class_name: &str) -> AppResult<bool> {
        Ok(self.classes.contains(class_name))
    }

    fn class_names(&self) -> AppResult<Vec<String>> {
        Ok(self.classes.iter().cloned().collect())
    }
}

impl PermissionRepository for FakeStore {
    fn realm_permissions(&self) -> AppResult<RealmPermissions> {
        Ok(lock(&self.realm).clone())
    }

    fn class_permissions(&self, class_name: &str) -> AppResult<Option<ClassPermissions>> {
        Ok(lock(&self.class_permissions).get(class_name).cloned())
    }

    fn object_permissions(&self, object: &ObjectRef) -> AppResult<PermissionList> {
        Ok(lock(&self.objects)
            .get(&(object.class_name().to_owned(), object.key()))
            .cloned()
            .unwrap_or_default())
    }

    fn find_role(&self, role_name: &str) -> AppResult<Option<Role>> {
        Ok(lock(&self.roles).get(role_name).cloned())
    }
}

impl RoleRepository for FakeStore {
    fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(lock(&self.roles).values().cloned().collect())
    }

    fn create_role(&self, role_name: &str) -> AppResult<Role> {
        self.require_write()?;
        let role = Role::new(role_name)?;
        let mut roles = lock(&self.roles);
        if roles.contains_key(role_name) {
            return Err(AppError::Conflict(format!(
                "role '{role_name}' already exists"
            )));
        }
        roles.insert(role_name.to_owned(), role.clone());
        Ok(role)
    }

    fn ensure_principal(&self, principal: &PrincipalId) -> AppResult<()> {
        self.require_write()?;
        lock(&self.principals).insert(principal.clone());
        Ok(())
    }

    fn insert_member(&self, role_name: &str, principal: PrincipalId) -> AppResult<bool> {
        self.require_write()?;
        lock(&self.roles)
            .get_mut(role_name)
            .map(|role| role.insert_member(principal))
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}'")))
    }

    fn remove_member(&self, role_name: &str, principal: &PrincipalId) -> AppResult<bool> {
        self.require_write()?;
        lock(&self.roles)
            .get_mut(role_name)
            .map(|role| role.remove_member(principal))
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}'")))
    }
}
