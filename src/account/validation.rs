//! Input validation for public wallet identifiers
//!
//! This module provides the validated wallet-number type. The field is
//! private to force validation through the public API; anything holding a
//! `MoniNumber` holds a well-formed one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix every wallet number starts with. The digits after it are the
/// account's order number, assigned at creation.
pub const MONI_PREFIX: &str = "MN1000";

/// Longest accepted wallet number (prefix + digits).
const MONI_MAX_LEN: usize = 20;

// ============================================================================
// Validation Errors
// ============================================================================

/// Validation errors for wallet numbers
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Wallet number must start with {MONI_PREFIX}: got '{got}'")]
    MissingPrefix { got: String },

    #[error("Wallet number must have digits after {MONI_PREFIX}: got '{got}'")]
    MissingOrderNumber { got: String },

    #[error("Wallet number may only contain digits after {MONI_PREFIX}: got '{got}'")]
    NonDigitSuffix { got: String },

    #[error("Invalid length for wallet number: max {max}, got {actual}")]
    InvalidLength { max: usize, actual: usize },
}

// ============================================================================
// MoniNumber - Validated Wallet Number (Private Field)
// ============================================================================

/// Validated public wallet identifier (`MN1000` + order number)
///
/// The field is private to force validation through `new()`. Lookups by
/// wallet number must fail closed: malformed input is rejected here,
/// before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MoniNumber(String);

impl MoniNumber {
    /// Create a new validated MoniNumber
    ///
    /// # Validation Rules
    /// - Must start with the literal prefix `MN1000`
    /// - At least one digit after the prefix, digits only
    /// - Total length at most 20 characters
    ///
    /// # Examples
    /// ```ignore
    /// let moni = MoniNumber::new("MN10007").unwrap();
    /// assert_eq!(moni.as_str(), "MN10007");
    ///
    /// assert!(MoniNumber::new("MX10007").is_err());
    /// assert!(MoniNumber::new("MN1000").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();

        if raw.len() > MONI_MAX_LEN {
            return Err(ValidationError::InvalidLength {
                max: MONI_MAX_LEN,
                actual: raw.len(),
            });
        }

        let suffix = raw
            .strip_prefix(MONI_PREFIX)
            .ok_or_else(|| ValidationError::MissingPrefix {
                got: raw.to_string(),
            })?;

        if suffix.is_empty() {
            return Err(ValidationError::MissingOrderNumber {
                got: raw.to_string(),
            });
        }

        if !suffix.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::NonDigitSuffix {
                got: raw.to_string(),
            });
        }

        Ok(Self(raw.to_string()))
    }

    /// Build the wallet number for a store-issued order number.
    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("{}{}", MONI_PREFIX, seq))
    }

    /// Get the validated wallet number as &str
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into owned String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MoniNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MoniNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MoniNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MoniNumber::new(&value)
    }
}

impl From<MoniNumber> for String {
    fn from(value: MoniNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_numbers() {
        assert_eq!(MoniNumber::new("MN10001").unwrap().as_str(), "MN10001");
        assert_eq!(MoniNumber::new("MN1000007").unwrap().as_str(), "MN1000007");
        // surrounding whitespace is tolerated, the stored value is trimmed
        assert_eq!(MoniNumber::new(" MN10001 ").unwrap().as_str(), "MN10001");
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert_eq!(
            MoniNumber::new("MX10001").unwrap_err(),
            ValidationError::MissingPrefix {
                got: "MX10001".into()
            }
        );
        // lowercase is not the canonical form
        assert!(MoniNumber::new("mn10001").is_err());
    }

    #[test]
    fn rejects_bare_prefix() {
        assert_eq!(
            MoniNumber::new("MN1000").unwrap_err(),
            ValidationError::MissingOrderNumber {
                got: "MN1000".into()
            }
        );
    }

    #[test]
    fn rejects_non_digit_suffix() {
        assert!(MoniNumber::new("MN1000ABC").is_err());
        assert!(MoniNumber::new("MN10001; DROP TABLE").is_err());
    }

    #[test]
    fn rejects_oversized_input() {
        let long = format!("MN1000{}", "9".repeat(40));
        assert!(matches!(
            MoniNumber::new(&long).unwrap_err(),
            ValidationError::InvalidLength { .. }
        ));
    }

    #[test]
    fn sequence_formatting_matches_lookup_format() {
        let moni = MoniNumber::from_sequence(7);
        assert_eq!(moni.as_str(), "MN10007");
        assert_eq!(MoniNumber::new(moni.as_str()).unwrap(), moni);
    }

    #[test]
    fn serde_roundtrip_revalidates() {
        let moni = MoniNumber::new("MN10042").unwrap();
        let json = serde_json::to_string(&moni).unwrap();
        assert_eq!(json, "\"MN10042\"");
        let back: MoniNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, moni);
        assert!(serde_json::from_str::<MoniNumber>("\"bogus\"").is_err());
    }
}
