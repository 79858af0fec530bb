use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::info;
use vellum_core::{AppError, AppResult, PrincipalId, StoreId};
use vellum_domain::{ClassPermissions, ObjectKey, PermissionList, RealmPermissions, Role};

use crate::store_handle::StoreHandle;

/// Complete contents of one store. Pending transactions work on a clone.
#[derive(Debug, Clone)]
pub(crate) struct StoreState {
    pub(crate) classes: BTreeMap<String, ClassPermissions>,
    pub(crate) realm: RealmPermissions,
    pub(crate) roles: BTreeMap<String, Role>,
    pub(crate) principals: BTreeSet<PrincipalId>,
    pub(crate) objects: BTreeMap<(String, ObjectKey), PermissionList>,
    pub(crate) next_key: u64,
}

impl StoreState {
    fn with_schema(classes: Vec<ClassPermissions>) -> Self {
        let everyone = Role::everyone();

        Self {
            classes: classes
                .into_iter()
                .map(|container| (container.name().to_owned(), container))
                .collect(),
            realm: RealmPermissions::new(),
            roles: BTreeMap::from([(everyone.name().to_owned(), everyone)]),
            principals: BTreeSet::new(),
            objects: BTreeMap::new(),
            next_key: 1,
        }
    }

    /// Returns the role, creating it the first time a grant names it.
    pub(crate) fn role_entry(&mut self, role_name: &str) -> AppResult<&mut Role> {
        if !self.roles.contains_key(role_name) {
            let role = Role::new(role_name)?;
            self.roles.insert(role_name.to_owned(), role);
        }

        self.roles
            .get_mut(role_name)
            .ok_or_else(|| AppError::Internal(format!("role '{role_name}' vanished")))
    }
}

/// Committed state plus the single writer slot, shared by every handle.
#[derive(Debug)]
pub(crate) struct SharedStore {
    pub(crate) state: RwLock<StoreState>,
    writer_active: AtomicBool,
}

impl SharedStore {
    fn new(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
            writer_active: AtomicBool::new(false),
        }
    }

    /// Claims the writer slot. Returns `false` when another handle holds it.
    pub(crate) fn try_acquire_writer(&self) -> bool {
        self.writer_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn release_writer(&self) {
        self.writer_active.store(false, Ordering::SeqCst);
    }
}

/// In-memory object store holding committed state shared by all its handles.
///
/// At most one handle at a time holds a write transaction.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    id: StoreId,
    shared: Arc<SharedStore>,
}

impl InMemoryStore {
    /// Creates a store whose schema contains `class_names`.
    ///
    /// The store-wide container, one container per class and the `everyone`
    /// role are created here, once.
    pub fn new<I, N>(class_names: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut classes = Vec::new();
        for name in class_names {
            let container = ClassPermissions::new(name.as_ref())?;
            if classes
                .iter()
                .any(|existing: &ClassPermissions| existing.name() == container.name())
            {
                return Err(AppError::Conflict(format!(
                    "class '{}' is declared twice",
                    container.name()
                )));
            }
            classes.push(container);
        }

        let id = StoreId::new();
        info!(store_id = %id, classes = classes.len(), "store created");

        Ok(Self {
            id,
            shared: Arc::new(SharedStore::new(StoreState::with_schema(classes))),
        })
    }

    /// Returns the store identity.
    #[must_use]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Opens a handle for `principal`, bound to the calling thread.
    pub fn open(&self, principal: &str) -> AppResult<StoreHandle> {
        let principal = PrincipalId::new(principal)?;
        info!(store_id = %self.id, principal = %principal, "store handle opened");

        Ok(StoreHandle::new(self.id, principal, Arc::clone(&self.shared)))
    }
}
