use crate::error::RedemptionError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A redemption code.
///
/// Codes minted by this service are 1-64 characters long and contain only
/// alphanumeric characters, hyphens, or underscores; [`RedemptionCode::new`]
/// enforces that. Codes typed in by customers go through
/// [`RedemptionCode::lookup`] instead, so that anything not on record fails
/// as not found rather than as malformed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedemptionCode(String);

const MIN_LENGTH: usize = 1;
const MAX_LENGTH: usize = 64;

impl RedemptionCode {
    /// Creates a new `RedemptionCode` after validating the input.
    pub fn new(code: impl AsRef<str>) -> std::result::Result<Self, RedemptionError> {
        let code = code.as_ref().trim();
        Self::validate(code)?;
        Ok(Self(code.to_owned()))
    }

    /// Wraps user input for a store lookup.
    ///
    /// Only trims surrounding whitespace. Returns `None` for blank input.
    pub fn lookup(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref().trim();
        (!code.is_empty()).then(|| Self(code.to_owned()))
    }

    /// Creates a `RedemptionCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (e.g. rows read back from the store or the code generator).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> std::result::Result<(), RedemptionError> {
        if code.len() < MIN_LENGTH || code.len() > MAX_LENGTH {
            return Err(RedemptionError::Validation(format!(
                "code length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                code.len()
            )));
        }

        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RedemptionError::Validation(format!(
                "code must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl Display for RedemptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RedemptionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
