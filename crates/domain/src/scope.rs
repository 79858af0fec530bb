use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use vellum_core::{AppResult, NonEmptyString, StoreId};

use crate::permission::Permission;

/// Ordered grants attached to one scope instance, at most one per role.
///
/// Order is kept for stable enumeration only; resolution does not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionList(Vec<Permission>);

impl PermissionList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the grants in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Permission] {
        self.0.as_slice()
    }

    /// Returns the grant issued to `role_name`, if any.
    #[must_use]
    pub fn entry_for(&self, role_name: &str) -> Option<&Permission> {
        self.0
            .iter()
            .find(|permission| permission.role_name() == role_name)
    }

    /// Installs `permission`, replacing the flags of an existing grant for the
    /// same role in place.
    pub fn grant(&mut self, permission: Permission) {
        match self
            .0
            .iter_mut()
            .find(|existing| existing.role_name() == permission.role_name())
        {
            Some(existing) => existing.replace_capabilities(permission.capabilities()),
            None => self.0.push(permission),
        }
    }

    /// Drops the grant issued to `role_name`. Returns `false` when absent.
    pub fn revoke(&mut self, role_name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|permission| permission.role_name() != role_name);
        self.0.len() != before
    }

    /// Returns the number of grants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no grant is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the grants in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Permission> {
        self.0.iter()
    }
}

impl FromIterator<Permission> for PermissionList {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut list = Self::new();
        for permission in iter {
            list.grant(permission);
        }
        list
    }
}

impl<'a> IntoIterator for &'a PermissionList {
    type Item = &'a Permission;
    type IntoIter = std::slice::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Store-wide grants. Exactly one exists per store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmPermissions {
    permissions: PermissionList,
}

impl RealmPermissions {
    /// Creates the empty store-wide container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store-wide grants.
    #[must_use]
    pub fn permissions(&self) -> &PermissionList {
        &self.permissions
    }

    /// Returns the store-wide grants for mutation by the store.
    pub fn permissions_mut(&mut self) -> &mut PermissionList {
        &mut self.permissions
    }
}

/// Grants attached to one schema class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPermissions {
    name: NonEmptyString,
    permissions: PermissionList,
}

impl ClassPermissions {
    /// Creates the empty container for the class `name`.
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            permissions: PermissionList::new(),
        })
    }

    /// Returns the schema name of the target class.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the class grants.
    #[must_use]
    pub fn permissions(&self) -> &PermissionList {
        &self.permissions
    }

    /// Returns the class grants for mutation by the store.
    pub fn permissions_mut(&mut self) -> &mut PermissionList {
        &mut self.permissions
    }
}

/// Primary key of a record within its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKey(u64);

impl ObjectKey {
    /// Returns the raw key value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ObjectKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for ObjectKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Reference to a record, either attached to a store or standalone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    store_id: Option<StoreId>,
    class_name: String,
    key: ObjectKey,
}

impl ObjectRef {
    /// Creates a reference to a record persisted in the store `store_id`.
    #[must_use]
    pub fn managed(store_id: StoreId, class_name: impl Into<String>, key: ObjectKey) -> Self {
        Self {
            store_id: Some(store_id),
            class_name: class_name.into(),
            key,
        }
    }

    /// Creates a standalone record that no store knows about.
    #[must_use]
    pub fn unmanaged(class_name: impl Into<String>, key: ObjectKey) -> Self {
        Self {
            store_id: None,
            class_name: class_name.into(),
            key,
        }
    }

    /// Returns the owning store, if the record is attached to one.
    #[must_use]
    pub fn store_id(&self) -> Option<StoreId> {
        self.store_id
    }

    /// Returns whether the reference was produced by a store.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.store_id.is_some()
    }

    /// Returns the class name of the record.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.class_name.as_str()
    }

    /// Returns the record key.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        self.key
    }
}

impl Display for ObjectRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}#{}", self.class_name, self.key)
    }
}

/// Granularity a default template is chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// The whole store.
    Store,
    /// One schema class.
    Class,
    /// One record.
    Object,
}

impl ScopeKind {
    /// Returns a stable storage value for the scope kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Class => "class",
            Self::Object => "object",
        }
    }
}

/// Target of a privilege resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The whole store.
    Store,
    /// One schema class, by name.
    Class(String),
    /// One managed record.
    Object(ObjectRef),
}

impl Scope {
    /// Returns the granularity of this scope.
    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::Store => ScopeKind::Store,
            Self::Class(_) => ScopeKind::Class,
            Self::Object(_) => ScopeKind::Object,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store => formatter.write_str("store"),
            Self::Class(name) => write!(formatter, "class:{name}"),
            Self::Object(object) => write!(formatter, "object:{object}"),
        }
    }
}
