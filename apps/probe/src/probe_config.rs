use std::env;

use vellum_core::{AppError, AppResult};
use vellum_domain::{Capability, CapabilitySet};

const DEFAULT_CLASSES: &str = "Document";

/// Role to create (when missing) and fill before probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSeed {
    pub role: String,
    pub members: Vec<String>,
}

/// Where a seeded grant is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantTarget {
    Store,
    Class(String),
}

/// Grant installed before probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSeed {
    pub target: GrantTarget,
    pub role: String,
    pub capabilities: CapabilitySet,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub principal: String,
    pub classes: Vec<String>,
    pub roles: Vec<RoleSeed>,
    pub grants: Vec<GrantSeed>,
}

impl ProbeConfig {
    pub fn load() -> AppResult<Self> {
        let principal = required_env("VELLUM_PRINCIPAL")?;
        let classes = env::var("VELLUM_CLASSES").unwrap_or_else(|_| DEFAULT_CLASSES.to_owned());
        let roles = env::var("VELLUM_ROLES").unwrap_or_default();
        let grants = env::var("VELLUM_GRANTS").unwrap_or_default();

        Self::from_values(&principal, &classes, &roles, &grants)
    }

    fn from_values(principal: &str, classes: &str, roles: &str, grants: &str) -> AppResult<Self> {
        let principal = principal.trim().to_owned();
        if principal.is_empty() {
            return Err(AppError::InvalidArgument(
                "VELLUM_PRINCIPAL must not be empty".to_owned(),
            ));
        }

        let classes: Vec<String> = split_list(classes, ',').map(str::to_owned).collect();
        if classes.is_empty() {
            return Err(AppError::InvalidArgument(
                "VELLUM_CLASSES must name at least one class".to_owned(),
            ));
        }

        Ok(Self {
            principal,
            classes,
            roles: split_list(roles, ';')
                .map(parse_role_seed)
                .collect::<AppResult<_>>()?,
            grants: split_list(grants, ';')
                .map(parse_grant_seed)
                .collect::<AppResult<_>>()?,
        })
    }
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::InvalidArgument(format!("{name} is required")))
}

fn split_list(value: &str, separator: char) -> impl Iterator<Item = &str> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn parse_role_seed(value: &str) -> AppResult<RoleSeed> {
    let (role, members) = value.split_once('=').ok_or_else(|| {
        AppError::InvalidArgument(format!(
            "invalid VELLUM_ROLES entry '{value}': expected role=member|member"
        ))
    })?;

    Ok(RoleSeed {
        role: role.trim().to_owned(),
        members: split_list(members, '|').map(str::to_owned).collect(),
    })
}

fn parse_grant_seed(value: &str) -> AppResult<GrantSeed> {
    let mut parts = value.splitn(3, ':').map(str::trim);
    let (Some(scope), Some(role), Some(capabilities)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::InvalidArgument(format!(
            "invalid VELLUM_GRANTS entry '{value}': expected scope:role:cap|cap"
        )));
    };

    let target = match scope {
        "store" => GrantTarget::Store,
        class_name => GrantTarget::Class(class_name.to_owned()),
    };
    let capabilities = split_list(capabilities, '|')
        .map(str::parse::<Capability>)
        .collect::<AppResult<CapabilitySet>>()?;

    Ok(GrantSeed {
        target,
        role: role.to_owned(),
        capabilities,
    })
}
