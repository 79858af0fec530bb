//! Application services and ports.

#![forbid(unsafe_code)]

mod access_facade;
mod access_ports;
mod privilege_resolver;
mod role_service;

#[cfg(test)]
mod test_support;

pub use access_facade::{DynamicAccessor, DynamicObject, RecordType, TypedAccessor, TypedObject};
pub use access_ports::{
    AccessStore, PermissionRepository, RoleRepository, SchemaCatalog, StoreContext,
};
pub use privilege_resolver::PrivilegeResolver;
pub use role_service::RoleService;
