//! Vellum privilege probe.
//!
//! Builds an in-memory store from environment configuration, installs the
//! configured roles and grants, then prints the privileges the configured
//! principal resolves to.

#![forbid(unsafe_code)]

mod probe_config;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vellum_core::{AppError, AppResult};
use vellum_domain::{DefaultPolicy, Privileges};
use vellum_infrastructure::{InMemoryStore, StoreHandle};

use crate::probe_config::{GrantTarget, ProbeConfig};

#[derive(Debug, Serialize)]
struct ProbeReport {
    store_id: String,
    principal: String,
    store: Privileges,
    classes: BTreeMap<String, Privileges>,
    roles: Vec<RoleReport>,
}

#[derive(Debug, Serialize)]
struct RoleReport {
    name: String,
    member_count: usize,
    includes_principal: bool,
}

fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ProbeConfig::load()?;
    let store = InMemoryStore::new(&config.classes)?;
    let handle = store.open(config.principal.as_str())?;

    info!(
        store_id = %store.id(),
        principal = %config.principal,
        classes = config.classes.len(),
        roles = config.roles.len(),
        grants = config.grants.len(),
        "vellum-probe started"
    );

    if let Err(error) = seed(&handle, &config) {
        warn!(error = %error, "seeding failed, pending changes discarded");
        handle.close();
        return Err(error);
    }

    let report = build_report(&store, &handle, &config)?;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| AppError::Internal(format!("failed to render report: {error}")))?;
    println!("{rendered}");

    handle.close();
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn seed(handle: &StoreHandle, config: &ProbeConfig) -> AppResult<()> {
    handle.begin_write()?;
    let roles = handle.roles();

    for seed in &config.roles {
        if !DefaultPolicy::is_everyone(&seed.role) {
            match roles.find_role(&seed.role) {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => {
                    roles.create_role(&seed.role)?;
                }
                Err(error) => return Err(error),
            }
        }

        for member in &seed.members {
            roles.add_member(&seed.role, member)?;
        }
    }

    for grant in &config.grants {
        match &grant.target {
            GrantTarget::Store => handle.grant_store(&grant.role, grant.capabilities)?,
            GrantTarget::Class(class_name) => {
                handle.grant_class(class_name, &grant.role, grant.capabilities)?;
            }
        }
    }

    handle.commit()
}

fn build_report(
    store: &InMemoryStore,
    handle: &StoreHandle,
    config: &ProbeConfig,
) -> AppResult<ProbeReport> {
    let accessor = handle.dynamic();

    let mut classes = BTreeMap::new();
    for class_name in &config.classes {
        let privileges = accessor.class_privileges(Some(class_name.as_str()))?;
        classes.insert(class_name.clone(), privileges);
    }

    let roles = handle.roles();
    let mut role_reports = Vec::new();
    for role in accessor.roles()? {
        role_reports.push(RoleReport {
            includes_principal: roles.has_member(role.name(), &config.principal)?,
            member_count: role.member_count(),
            name: role.name().to_owned(),
        });
    }

    Ok(ProbeReport {
        store_id: store.id().to_string(),
        principal: config.principal.clone(),
        store: accessor.privileges()?,
        classes,
        roles: role_reports,
    })
}
