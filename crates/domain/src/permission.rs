use serde::{Deserialize, Serialize};
use vellum_core::{AppResult, NonEmptyString};

use crate::capability::{Capability, CapabilitySet};
use crate::role::Role;

/// A grant tying one role to a set of allowed operations.
///
/// A permission is attached to exactly one scope by containment; it does not
/// know which container holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    role: String,
    capabilities: CapabilitySet,
}

impl Permission {
    /// Creates a grant for the role named `role`.
    pub fn new(role: impl Into<String>, capabilities: CapabilitySet) -> AppResult<Self> {
        Ok(Self {
            role: NonEmptyString::new(role)?.into(),
            capabilities,
        })
    }

    /// Creates a grant for an existing role.
    #[must_use]
    pub fn for_role(role: &Role, capabilities: CapabilitySet) -> Self {
        Self {
            role: role.name().to_owned(),
            capabilities,
        }
    }

    /// Returns the name of the granted role.
    #[must_use]
    pub fn role_name(&self) -> &str {
        self.role.as_str()
    }

    /// Returns the granted flags.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Returns whether the grant allows `capability`.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.allows(capability)
    }

    /// Allows creating records.
    #[must_use]
    pub fn can_create(&self) -> bool {
        self.allows(Capability::Create)
    }

    /// Allows reading records.
    #[must_use]
    pub fn can_read(&self) -> bool {
        self.allows(Capability::Read)
    }

    /// Allows updating records.
    #[must_use]
    pub fn can_update(&self) -> bool {
        self.allows(Capability::Update)
    }

    /// Allows deleting records.
    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.allows(Capability::Delete)
    }

    /// Allows running queries.
    #[must_use]
    pub fn can_query(&self) -> bool {
        self.allows(Capability::Query)
    }

    /// Allows changing grants.
    #[must_use]
    pub fn can_set_permissions(&self) -> bool {
        self.allows(Capability::SetPermissions)
    }

    /// Allows altering the schema.
    #[must_use]
    pub fn can_modify_schema(&self) -> bool {
        self.allows(Capability::ModifySchema)
    }

    pub(crate) fn replace_capabilities(&mut self, capabilities: CapabilitySet) {
        self.capabilities = capabilities;
    }
}

/// Resolved privileges of one principal at one scope.
///
/// Computed on demand and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Privileges(CapabilitySet);

impl Privileges {
    /// Wraps a merged capability set.
    #[must_use]
    pub fn new(capabilities: CapabilitySet) -> Self {
        Self(capabilities)
    }

    /// Returns the merged flags.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        self.0
    }

    /// Returns whether `capability` is allowed.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        self.0.allows(capability)
    }

    /// Whether records may be created.
    #[must_use]
    pub fn can_create(&self) -> bool {
        self.allows(Capability::Create)
    }

    /// Whether records may be read.
    #[must_use]
    pub fn can_read(&self) -> bool {
        self.allows(Capability::Read)
    }

    /// Whether records may be updated.
    #[must_use]
    pub fn can_update(&self) -> bool {
        self.allows(Capability::Update)
    }

    /// Whether records may be deleted.
    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.allows(Capability::Delete)
    }

    /// Whether queries may run.
    #[must_use]
    pub fn can_query(&self) -> bool {
        self.allows(Capability::Query)
    }

    /// Whether grants may be changed.
    #[must_use]
    pub fn can_set_permissions(&self) -> bool {
        self.allows(Capability::SetPermissions)
    }

    /// Whether the schema may be altered.
    #[must_use]
    pub fn can_modify_schema(&self) -> bool {
        self.allows(Capability::ModifySchema)
    }
}
