//! Domain model for roles, grants and resolved privileges.

#![forbid(unsafe_code)]

mod capability;
mod permission;
mod policy;
mod role;
mod scope;

pub use capability::{Capability, CapabilitySet};
pub use permission::{Permission, Privileges};
pub use policy::DefaultPolicy;
pub use role::Role;
pub use scope::{
    ClassPermissions, ObjectKey, ObjectRef, PermissionList, RealmPermissions, Scope, ScopeKind,
};
