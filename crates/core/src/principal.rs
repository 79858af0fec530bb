use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

const MAX_PRINCIPAL_LENGTH: usize = 256;

/// Identifier of an authenticated principal as issued by the identity provider.
///
/// Identifiers are opaque tokens: they must be non-empty, at most 256 bytes
/// long and free of whitespace and control characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Creates a validated principal identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(AppError::InvalidPrincipal(
                "principal identifier must not be empty".to_owned(),
            ));
        }

        if value.len() > MAX_PRINCIPAL_LENGTH {
            return Err(AppError::InvalidPrincipal(format!(
                "principal identifier exceeds {MAX_PRINCIPAL_LENGTH} bytes"
            )));
        }

        if value
            .chars()
            .any(|character| character.is_whitespace() || character.is_control())
        {
            return Err(AppError::InvalidPrincipal(format!(
                "principal identifier '{}' contains whitespace or control characters",
                value.escape_debug()
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for PrincipalId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrincipalId> for String {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

impl Display for PrincipalId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
