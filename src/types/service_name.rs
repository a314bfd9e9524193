// ABOUTME: Validated service name newtype.
// ABOUTME: Enforces RFC 1123 label rules so names are safe as CLI selectors.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

const LABEL_MAX: usize = 63;

#[derive(Debug, Error)]
pub enum ServiceNameError {
    #[error("service name cannot be empty")]
    Empty,

    #[error("service name exceeds maximum length of {LABEL_MAX} characters")]
    TooLong,

    #[error("service name cannot start or end with a hyphen")]
    HyphenAtEdge,

    #[error("invalid character in service name: '{0}'")]
    InvalidChar(char),
}

/// A lowercase, DNS-label-shaped service name.
///
/// The character set (lowercase alphanumeric plus interior hyphens) is also
/// what keeps names safe to pass as `-s` selectors to the platform CLI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(value: &str) -> Result<Self, ServiceNameError> {
        if value.is_empty() {
            return Err(ServiceNameError::Empty);
        }
        if value.len() > LABEL_MAX {
            return Err(ServiceNameError::TooLong);
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(ServiceNameError::HyphenAtEdge);
        }
        match value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            Some(c) => Err(ServiceNameError::InvalidChar(c)),
            None => Ok(Self(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ServiceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ServiceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ServiceName::new(&raw).map_err(serde::de::Error::custom)
    }
}
