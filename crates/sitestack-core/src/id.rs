//! Logical resource identifiers.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The key of a resource inside a synthesized template.
/// Only ASCII alphanumerics are allowed, and the first character is a letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Create a LogicalId, rejecting anything that is not a plain alphanumeric name.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = id.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && id.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(Error::InvalidInput(format!(
                "logical id '{}' must be alphanumeric and start with a letter",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for LogicalId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
