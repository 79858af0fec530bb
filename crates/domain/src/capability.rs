use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vellum_core::AppError;

/// Operations a grant can allow on a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Allows creating new records.
    Create,
    /// Allows reading records.
    Read,
    /// Allows updating existing records.
    Update,
    /// Allows deleting records.
    Delete,
    /// Allows running queries.
    Query,
    /// Allows changing permission grants.
    SetPermissions,
    /// Allows altering the schema.
    ModifySchema,
}

impl Capability {
    /// Returns a stable storage value for this capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Query => "query",
            Self::SetPermissions => "set_permissions",
            Self::ModifySchema => "modify_schema",
        }
    }

    /// Returns all known capabilities.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Capability] = &[
            Capability::Create,
            Capability::Read,
            Capability::Update,
            Capability::Delete,
            Capability::Query,
            Capability::SetPermissions,
            Capability::ModifySchema,
        ];

        ALL
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "query" => Ok(Self::Query),
            "set_permissions" => Ok(Self::SetPermissions),
            "modify_schema" => Ok(Self::ModifySchema),
            _ => Err(AppError::InvalidArgument(format!(
                "unknown capability value '{value}'"
            ))),
        }
    }
}

/// Seven independent capability flags.
///
/// No flag implies another: `can_update` does not imply `can_read`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilitySet {
    can_create: bool,
    can_read: bool,
    can_update: bool,
    can_delete: bool,
    can_query: bool,
    can_set_permissions: bool,
    can_modify_schema: bool,
}

impl CapabilitySet {
    /// Set with every flag cleared.
    pub const NONE: Self = Self {
        can_create: false,
        can_read: false,
        can_update: false,
        can_delete: false,
        can_query: false,
        can_set_permissions: false,
        can_modify_schema: false,
    };

    /// Set with every flag raised.
    pub const ALL: Self = Self {
        can_create: true,
        can_read: true,
        can_update: true,
        can_delete: true,
        can_query: true,
        can_set_permissions: true,
        can_modify_schema: true,
    };

    /// Builds a set raising exactly the listed capabilities.
    #[must_use]
    pub fn of(capabilities: &[Capability]) -> Self {
        capabilities
            .iter()
            .fold(Self::NONE, |set, capability| set.with(*capability))
    }

    /// Returns a copy with `capability` raised.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        self.assign(capability, true)
    }

    /// Returns a copy with `capability` cleared.
    #[must_use]
    pub const fn without(self, capability: Capability) -> Self {
        self.assign(capability, false)
    }

    /// Returns whether `capability` is raised.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Create => self.can_create,
            Capability::Read => self.can_read,
            Capability::Update => self.can_update,
            Capability::Delete => self.can_delete,
            Capability::Query => self.can_query,
            Capability::SetPermissions => self.can_set_permissions,
            Capability::ModifySchema => self.can_modify_schema,
        }
    }

    /// Field-by-field logical OR.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            can_create: self.can_create || other.can_create,
            can_read: self.can_read || other.can_read,
            can_update: self.can_update || other.can_update,
            can_delete: self.can_delete || other.can_delete,
            can_query: self.can_query || other.can_query,
            can_set_permissions: self.can_set_permissions || other.can_set_permissions,
            can_modify_schema: self.can_modify_schema || other.can_modify_schema,
        }
    }

    /// Iterates the raised capabilities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::all()
            .iter()
            .copied()
            .filter(|capability| self.allows(*capability))
    }

    const fn assign(mut self, capability: Capability, value: bool) -> Self {
        match capability {
            Capability::Create => self.can_create = value,
            Capability::Read => self.can_read = value,
            Capability::Update => self.can_update = value,
            Capability::Delete => self.can_delete = value,
            Capability::Query => self.can_query = value,
            Capability::SetPermissions => self.can_set_permissions = value,
            Capability::ModifySchema => self.can_modify_schema = value,
        }
        self
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::NONE, |set, capability| set.with(capability))
    }
}
