//! Operator: who submitted a user-facing write, for audit fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name recorded in `updated_by` fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operator(String);

impl Operator {
    /// Blank names collapse to [`Operator::anonymous`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            Self::anonymous()
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Writes performed by the engine itself (lazy expiry write-back).
    #[must_use]
    pub fn system() -> Self {
        Self("system".to_string())
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
