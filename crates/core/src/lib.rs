//! Shared primitives for all Rust crates in Vellum.

#![forbid(unsafe_code)]

/// Principal identity primitives shared across crates.
pub mod principal;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use principal::PrincipalId;

/// Result type used across Vellum crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Identity of one store instance. Objects and handles carry it so that
/// references can be checked against the store they were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(Uuid);

impl StoreId {
    /// Creates a random store identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a store identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for StoreId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Error categories surfaced by the store, the resolver and the access façade.
///
/// Every variant is a local precondition failure. None of them is retried
/// internally and none of them is ever mapped to an empty privilege result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    /// The store handle was already closed.
    #[error("store closed: this store handle has been closed")]
    StoreClosed,

    /// The call was made from a thread other than the one owning the handle.
    #[error("wrong context: store handle accessed from a thread that did not open it")]
    WrongContext,

    /// A required argument was missing or blank.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested type is not part of the store schema.
    #[error("unknown type: '{0}' is not part of the schema")]
    UnknownType(String),

    /// The object is not persisted in a store.
    #[error("unmanaged object: only managed objects carry permissions")]
    UnmanagedObject,

    /// The object belongs to a different store instance.
    #[error("cross-store reference: object belongs to another store")]
    CrossStoreReference,

    /// A mutation was attempted outside a write transaction.
    #[error("not in transaction: changes require an active write transaction")]
    NotInTransaction,

    /// The resolution scope cannot be evaluated against the current schema.
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// The principal identifier is empty or malformed.
    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
